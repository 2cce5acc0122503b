use std::time::Duration;
use tracing::{Span, field};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

/// Correlation id shared by every log line of one tick.
#[derive(Clone, Debug)]
pub struct TickId(String);

impl TickId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TickId {
    fn default() -> Self {
        Self::new()
    }
}

pub fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let base = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        // Includes timing when the span closes
        .with_span_events(fmt::format::FmtSpan::CLOSE);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.pretty())
            .init();
    }
}

pub fn tick_span(tick_id: &TickId) -> Span {
    tracing::info_span!(
        "tick",
        tick_id = %tick_id.as_str(),
        price_ct = field::Empty,
        matched = field::Empty
    )
}

/// Records the computed price and match count on the current span.
///
/// No-op outside a span built by [`tick_span`].
pub fn annotate_tick(price_ct: f64, matched: Option<usize>) {
    let span = Span::current();
    span.record("price_ct", field::display(price_ct));
    if let Some(n) = matched {
        span.record("matched", n);
    }
}

pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = std::time::Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
