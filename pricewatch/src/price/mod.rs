pub mod calculator;
pub mod client;
pub mod errors;
pub mod types;

use async_trait::async_trait;

pub use calculator::{PriceCalculator, Surcharges};
pub use client::AwattarClient;
pub use errors::FetchError;
pub use types::*;

/// Source of the current raw market price.
///
/// Returns the raw feed point (EUR/MWh), not a `PriceQuote`: the pipeline
/// turns it into one with [`PriceCalculator::quote`], so sources stay free of
/// the surcharge model.
///
/// Implementations make exactly one outbound call per invocation and never
/// cache between ticks.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_latest_price(&self) -> Result<MarketPoint, FetchError>;
}
