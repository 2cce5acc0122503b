use std::time::Duration;

use crate::error::PipelineError;
use crate::price::Surcharges;

pub const DEFAULT_PRICE_FEED_URL: &str = "https://api.awattar.de/v1/marketdata";
pub const DEFAULT_NOTIFY_URL: &str = "https://realtime.ifttt.com/v1/notifications";

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string.
    pub database_url: String,

    /// Shared credential sent with every outbound notification.
    pub service_key: String,

    // =========================
    // External endpoints
    // =========================
    /// Market data feed returning the price points, most recent first.
    pub price_feed_url: String,

    /// Realtime notification endpoint of the subscriber channel.
    pub notify_url: String,

    /// Upper bound for a single feed request.
    ///
    /// A stalled feed must not push the tick past the next interval.
    pub fetch_timeout: Duration,

    /// Upper bound for a single notification request.
    pub notify_timeout: Duration,

    // =========================
    // Scheduler configuration
    // =========================
    /// Time between two ticks.
    pub tick_interval: Duration,

    /// When set, the first tick waits for the next wall-clock multiple of
    /// `tick_interval` (top of the hour with the default interval).
    pub align_ticks: bool,

    /// Fixed surcharge model used by the price calculator.
    pub surcharges: Surcharges,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, PipelineError> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://pricewatch.db?mode=rwc".to_string());

        let service_key = std::env::var("SERVICE_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PipelineError::Config("SERVICE_KEY is not defined".to_string()))?;

        Ok(Self {
            database_url,
            service_key,

            price_feed_url: std::env::var("PRICE_FEED_URL")
                .unwrap_or_else(|_| DEFAULT_PRICE_FEED_URL.to_string()),
            notify_url: std::env::var("NOTIFY_URL")
                .unwrap_or_else(|_| DEFAULT_NOTIFY_URL.to_string()),

            fetch_timeout: at_least_one_sec(env_u64("FETCH_TIMEOUT_SECS", 10)?),
            notify_timeout: at_least_one_sec(env_u64("NOTIFY_TIMEOUT_SECS", 10)?),

            // Once per hour, on the hour.
            tick_interval: at_least_one_sec(env_u64("TICK_INTERVAL_SECS", 3600)?),
            align_ticks: env_bool("ALIGN_TICKS", true)?,

            surcharges: Surcharges::default(),
        })
    }
}

/// Zero would fail every outbound call (or spin the timer), so it is clamped.
fn at_least_one_sec(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}

fn env_u64(key: &str, default: u64) -> Result<u64, PipelineError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| PipelineError::Config(format!("{key} must be an integer, got {raw:?}"))),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool, PipelineError> {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(PipelineError::Config(format!(
                "{key} must be a boolean, got {raw:?}"
            ))),
        },
        Err(_) => Ok(default),
    }
}
