use serde::{Deserialize, Serialize};

/// Six bounded-integer sub-scores that sum (after a multiplier) into the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub volume_trend: u8,
    pub squeeze: u8,
    pub catalyst: u8,
    pub social: u8,
    pub options: u8,
    pub technical: u8,
}

impl ComponentScores {
    pub const VOLUME_TREND_MAX: u8 = 25;
    pub const SQUEEZE_MAX: u8 = 20;
    pub const CATALYST_MAX: u8 = 20;
    pub const SOCIAL_MAX: u8 = 15;
    pub const OPTIONS_MAX: u8 = 10;
    pub const TECHNICAL_MAX: u8 = 10;

    pub fn sum(&self) -> u32 {
        self.volume_trend as u32
            + self.squeeze as u32
            + self.catalyst as u32
            + self.social as u32
            + self.options as u32
            + self.technical as u32
    }
}

/// Classification tier, a pure function of `total_score` (see `Classification::from_score`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    TradeReady,
    Builder,
    Monitor,
    Ignore,
}

/// Score thresholds for classification. Configurable via environment (see `DiscoveryConfig`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationThresholds {
    pub trade_ready: u8,
    pub builder: u8,
    pub monitor: u8,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            trade_ready: 75,
            builder: 70,
            monitor: 60,
        }
    }
}

impl ClassificationThresholds {
    pub fn classify(&self, total_score: u8) -> Classification {
        if total_score >= self.trade_ready {
            Classification::TradeReady
        } else if total_score >= self.builder {
            Classification::Builder
        } else if total_score >= self.monitor {
            Classification::Monitor
        } else {
            Classification::Ignore
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_boundaries_match_spec_table() {
        let t = ClassificationThresholds::default();
        let cases = [
            (59, Classification::Ignore),
            (60, Classification::Monitor),
            (69, Classification::Monitor),
            (70, Classification::Builder),
            (74, Classification::Builder),
            (75, Classification::TradeReady),
        ];
        for (score, expected) in cases {
            assert_eq!(t.classify(score), expected, "score {score}");
        }
    }

    #[test]
    fn component_sum_adds_all_six() {
        let scores = ComponentScores {
            volume_trend: 20,
            squeeze: 10,
            catalyst: 5,
            social: 3,
            options: 2,
            technical: 1,
        };
        assert_eq!(scores.sum(), 41);
    }
}
