use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct MarketDataEnvelope {
    pub data: Vec<MarketPoint>,
}

/// One hourly price point as published by the feed.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MarketPoint {
    pub start_timestamp: u64,
    pub end_timestamp: u64,

    /// Price in `unit`, EUR/MWh for this feed.
    pub marketprice: f64,
    pub unit: String,
}
