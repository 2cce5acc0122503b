use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
#[derive(Clone, Default)]
pub struct Counters {
    pub ticks_started: Arc<AtomicU64>,
    pub ticks_completed: Arc<AtomicU64>,

    // tick-level failures
    pub ticks_skipped_overlap: Arc<AtomicU64>,
    pub ticks_aborted_fetch: Arc<AtomicU64>,
    pub ticks_aborted_load: Arc<AtomicU64>,

    // per-trigger outcomes
    pub events_recorded: Arc<AtomicU64>,
    pub notify_delivered: Arc<AtomicU64>,
    pub notify_failed: Arc<AtomicU64>,
    pub persist_failed: Arc<AtomicU64>,
}

impl Counters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
