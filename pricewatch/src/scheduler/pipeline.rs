//! One tick of the matching pipeline.
//!
//! Flow:
//! 1) Fetch the latest raw market price (fatal for the tick on failure).
//! 2) Convert it into the consumer price.
//! 3) Load every trigger and match against the price.
//! 4) Dispatch: persist one Event per match, then notify.
//!
//! Steps run strictly in sequence. No state survives between ticks apart from
//! what the stores hold.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::dispatch::{DispatchReport, NotificationDispatcher};
use crate::error::PipelineError;
use crate::logger::{annotate_tick, warn_if_slow};
use crate::matching::match_triggers;
use crate::metrics::counters::Counters;
use crate::model::PriceQuote;
use crate::price::{PriceCalculator, PriceSource};
use crate::store::TriggerStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickPhase {
    Idle,
    Fetching,
    Computing,
    Matching,
    Dispatching,
}

#[derive(Clone, Debug)]
pub struct TickReport {
    pub quote: PriceQuote,
    pub triggers_evaluated: usize,
    pub matched: usize,
    pub dispatch: DispatchReport,
}

pub struct Pipeline {
    source: Arc<dyn PriceSource>,
    calculator: PriceCalculator,
    triggers: Arc<dyn TriggerStore>,
    dispatcher: NotificationDispatcher,
    counters: Counters,
    phase: Arc<Mutex<TickPhase>>,
}

/// Puts the phase back to `Idle` however the tick ends.
struct PhaseReset(Arc<Mutex<TickPhase>>);

impl Drop for PhaseReset {
    fn drop(&mut self) {
        *self.0.lock() = TickPhase::Idle;
    }
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn PriceSource>,
        calculator: PriceCalculator,
        triggers: Arc<dyn TriggerStore>,
        dispatcher: NotificationDispatcher,
        counters: Counters,
    ) -> Self {
        Self {
            source,
            calculator,
            triggers,
            dispatcher,
            counters,
            phase: Arc::new(Mutex::new(TickPhase::Idle)),
        }
    }

    pub fn phase(&self) -> TickPhase {
        *self.phase.lock()
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    fn enter(&self, phase: TickPhase) {
        *self.phase.lock() = phase;
        debug!(?phase, "tick phase");
    }

    /// Runs fetch -> compute -> match -> dispatch once.
    ///
    /// Returns `Err` only when the tick was aborted before any trigger was
    /// evaluated. Per-trigger failures are reported inside `TickReport`.
    ///
    /// Price and match count are recorded on the enclosing `tick` span.
    pub async fn run_tick(&self) -> Result<TickReport, PipelineError> {
        let _reset = PhaseReset(Arc::clone(&self.phase));
        Counters::incr(&self.counters.ticks_started);

        info!("checking price");

        self.enter(TickPhase::Fetching);
        let point = match warn_if_slow(
            "price_fetch",
            Duration::from_secs(5),
            self.source.fetch_latest_price(),
        )
        .await
        {
            Ok(p) => p,
            Err(e) => {
                Counters::incr(&self.counters.ticks_aborted_fetch);
                let err = PipelineError::from(e);
                error!(error = %err, "tick aborted: no price available");
                return Err(err);
            }
        };

        self.enter(TickPhase::Computing);
        let quote = self.calculator.quote(&point);
        annotate_tick(quote.computed_price, None);
        info!(
            market_ct_kwh = quote.raw_market_price / 10.0,
            consumer_ct_kwh = quote.computed_price,
            observed_at_ms = quote.observed_at_ms,
            "price computed"
        );

        self.enter(TickPhase::Matching);
        let triggers = match self.triggers.list_all().await {
            Ok(t) => t,
            Err(e) => {
                Counters::incr(&self.counters.ticks_aborted_load);
                let err = PipelineError::LoadTriggers(e);
                error!(error = %err, "tick aborted: triggers unavailable");
                return Err(err);
            }
        };
        let matched = match_triggers(quote.computed_price, &triggers);
        annotate_tick(quote.computed_price, Some(matched.len()));
        debug!(
            evaluated = triggers.len(),
            matched = matched.len(),
            "triggers matched"
        );

        self.enter(TickPhase::Dispatching);
        let dispatch = self.dispatcher.dispatch(&matched).await;

        Counters::incr(&self.counters.ticks_completed);
        info!(
            delivered = dispatch.delivered(),
            notify_failed = dispatch.notify_failed(),
            persist_failed = dispatch.persist_failed(),
            deferred = dispatch.deferred.len(),
            "handled all triggers"
        );

        Ok(TickReport {
            quote,
            triggers_evaluated: triggers.len(),
            matched: matched.len(),
            dispatch,
        })
    }
}
