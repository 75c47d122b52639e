use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An opaque uppercase ticker identifier. Keys used throughout the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

#[derive(Debug, thiserror::Error)]
pub enum SymbolError {
    #[error("symbol cannot be empty")]
    Empty,
    #[error("symbol '{0}' exceeds 5 characters")]
    TooLong(String),
    #[error("symbol '{0}' contains characters other than letters and dots")]
    InvalidChars(String),
}

impl Symbol {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, SymbolError> {
        let upper = raw.as_ref().trim().to_uppercase();
        if upper.is_empty() {
            return Err(SymbolError::Empty);
        }
        if upper.len() > 5 {
            return Err(SymbolError::TooLong(upper));
        }
        if !upper.chars().all(|c| c.is_ascii_alphabetic() || c == '.') {
            return Err(SymbolError::InvalidChars(upper));
        }
        Ok(Self(upper))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::new(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let sym = Symbol::new(" aapl ").unwrap();
        assert_eq!(sym.as_str(), "AAPL");
    }

    #[test]
    fn accepts_dotted_share_classes() {
        assert!(Symbol::new("BRK.B").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(Symbol::new(""), Err(SymbolError::Empty)));
    }

    #[test]
    fn rejects_too_long() {
        assert!(matches!(Symbol::new("TOOLONG"), Err(SymbolError::TooLong(_))));
    }

    #[test]
    fn rejects_digits() {
        assert!(matches!(Symbol::new("AB12"), Err(SymbolError::InvalidChars(_))));
    }
}
