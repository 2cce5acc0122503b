use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};

use crate::price::PriceSource;
use crate::price::errors::FetchError;
use crate::price::types::{MarketDataEnvelope, MarketPoint};

/// HTTP client for the aWATTar market data feed.
#[derive(Clone)]
pub struct AwattarClient {
    http: Client,
    url: String,
}

impl AwattarClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(FetchError::Unreachable)?;

        Ok(Self { http, url })
    }

    /// Fetches the full point sequence, ordered as the feed returns it.
    #[instrument(skip(self), fields(url = %self.url), level = "debug")]
    pub async fn fetch_market_data(&self) -> Result<Vec<MarketPoint>, FetchError> {
        let resp = self.http.get(&self.url).send().await?.error_for_status()?;

        let envelope: MarketDataEnvelope = resp.json().await?;

        debug!(points = envelope.data.len(), "market data fetched");

        Ok(envelope.data)
    }
}

#[async_trait::async_trait]
impl PriceSource for AwattarClient {
    async fn fetch_latest_price(&self) -> Result<MarketPoint, FetchError> {
        // Element 0 is the current hour; the rest of the forecast is ignored.
        self.fetch_market_data()
            .await?
            .into_iter()
            .next()
            .ok_or(FetchError::EmptyResponse)
    }
}
