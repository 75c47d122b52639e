use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct GroupedResponse {
    #[serde(default)]
    pub results: Vec<GroupedRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GroupedRow {
    #[serde(rename = "T")]
    pub ticker: String,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v", default)]
    pub volume: f64,
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AggregateResponse {
    #[serde(default)]
    pub results: Vec<AggregateRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AggregateRow {
    #[serde(rename = "t")]
    pub timestamp_ms: i64,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v", default)]
    pub volume: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SnapshotResponse {
    #[serde(default)]
    pub tickers: Vec<SnapshotTickerRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SnapshotTickerRow {
    pub ticker: String,
    #[serde(default)]
    pub day: Option<SnapshotDay>,
    #[serde(default, rename = "prevDay")]
    pub prev_day: Option<SnapshotDay>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SnapshotDay {
    #[serde(default)]
    pub c: f64,
    #[serde(default)]
    pub v: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TickerListResponse {
    #[serde(default)]
    pub results: Vec<TickerListEntry>,
    pub next_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TickerListEntry {
    pub ticker: String,
    #[serde(default)]
    pub r#type: Option<String>,
}

/// Reference-endpoint ticker metadata, used by the universe loader to classify fund/ETF
/// symbols when the provider supplies a security type.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerDetails {
    pub ticker: String,
    pub security_type: Option<String>,
}
