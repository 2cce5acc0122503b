//! Periodic tick driver.
//!
//! Ticks fire on a fixed interval. Each tick runs in its own task so the timer
//! keeps counting while a slow tick is in progress; a tick that fires while
//! the previous one still holds the run guard is skipped, never queued.
//!
//! Shutdown stops the timer, then waits for the in-flight tick. The dispatcher
//! observes the same signal and stops after the trigger it is working on.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{Instrument, debug, info, warn};

use crate::logger::{TickId, tick_span};
use crate::metrics::counters::Counters;
use crate::scheduler::pipeline::{Pipeline, TickPhase};
use crate::time::{now_ms, until_next_boundary};

pub struct TickRunner {
    pipeline: Arc<Pipeline>,
    interval: Duration,
    align_to_wall_clock: bool,

    /// Held for the whole fetch..dispatch span of a tick.
    run_guard: Arc<Mutex<()>>,
}

impl TickRunner {
    pub fn new(pipeline: Arc<Pipeline>, interval: Duration) -> Self {
        Self {
            pipeline,
            interval,
            align_to_wall_clock: false,
            run_guard: Arc::new(Mutex::new(())),
        }
    }

    /// Delay the first tick until the next wall-clock multiple of the interval.
    pub fn aligned(mut self, align: bool) -> Self {
        self.align_to_wall_clock = align;
        self
    }

    pub fn phase(&self) -> TickPhase {
        self.pipeline.phase()
    }

    pub fn is_running(&self) -> bool {
        self.run_guard.try_lock().is_err()
    }

    /// Starts a tick in the background unless one is already running.
    ///
    /// Returns `None` when the tick was skipped because of overlap.
    pub fn try_start_tick(&self) -> Option<JoinHandle<()>> {
        let permit = match Arc::clone(&self.run_guard).try_lock_owned() {
            Ok(p) => p,
            Err(_) => {
                Counters::incr(&self.pipeline.counters().ticks_skipped_overlap);
                warn!(
                    phase = ?self.pipeline.phase(),
                    "previous tick still running; skipping this tick"
                );
                return None;
            }
        };

        let pipeline = Arc::clone(&self.pipeline);
        let span = tick_span(&TickId::new());

        Some(tokio::spawn(
            async move {
                let _permit = permit;
                // Outcome already logged by the pipeline.
                let _ = pipeline.run_tick().await;
            }
            .instrument(span),
        ))
    }

    /// Drives ticks until `shutdown` becomes `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let start = if self.align_to_wall_clock {
            Instant::now() + until_next_boundary(now_ms(), self.interval)
        } else {
            Instant::now()
        };

        let mut ticker = interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            every_secs = self.interval.as_secs(),
            first_tick_in_ms = start.saturating_duration_since(Instant::now()).as_millis() as u64,
            "tick runner started"
        );

        let mut in_flight: Option<JoinHandle<()>> = None;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(handle) = self.try_start_tick() {
                        in_flight = Some(handle);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("tick runner stopping");

        if let Some(handle) = in_flight {
            debug!(phase = ?self.pipeline.phase(), "waiting for in-flight tick");
            if let Err(e) = handle.await {
                warn!(error = ?e, "in-flight tick ended abnormally");
            }
        }

        info!("tick runner stopped");
    }
}
