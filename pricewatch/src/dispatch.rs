//! Notification dispatch for matched triggers.
//!
//! For every matched trigger, in order:
//! 1) append an Event (durable record, source of truth for long polling)
//! 2) notify the realtime channel
//!
//! Persistence happens-before notification. A failed notification never
//! rolls back its Event; a failed append skips that trigger's notification.
//! Neither failure stops the remaining triggers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::logger::warn_if_slow;
use crate::metrics::counters::Counters;
use crate::model::Trigger;
use crate::notify::Notifier;
use crate::store::EventStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchStatus {
    /// Event recorded and the channel accepted the notification.
    Delivered { event_id: i64 },
    /// Event recorded, notification failed. Subscribers recover via polling.
    NotifyFailed { event_id: i64, reason: String },
    /// No event recorded, so no notification was attempted.
    PersistFailed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub identity: String,
    pub status: DispatchStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcomes: Vec<DispatchOutcome>,
    /// Matched triggers left untouched because shutdown was requested.
    pub deferred: Vec<String>,
}

impl DispatchReport {
    pub fn delivered(&self) -> usize {
        self.count(|s| matches!(s, DispatchStatus::Delivered { .. }))
    }

    pub fn notify_failed(&self) -> usize {
        self.count(|s| matches!(s, DispatchStatus::NotifyFailed { .. }))
    }

    pub fn persist_failed(&self) -> usize {
        self.count(|s| matches!(s, DispatchStatus::PersistFailed { .. }))
    }

    /// Events written during this dispatch, whatever the notification outcome.
    pub fn events_recorded(&self) -> usize {
        self.delivered() + self.notify_failed()
    }

    pub fn status_of(&self, identity: &str) -> Option<&DispatchStatus> {
        self.outcomes
            .iter()
            .find(|o| o.identity == identity)
            .map(|o| &o.status)
    }

    fn count(&self, pred: impl Fn(&DispatchStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

pub struct NotificationDispatcher {
    events: Arc<dyn EventStore>,
    notifier: Arc<dyn Notifier>,
    counters: Counters,
    shutdown: Option<watch::Receiver<bool>>,
}

impl NotificationDispatcher {
    pub fn new(events: Arc<dyn EventStore>, notifier: Arc<dyn Notifier>, counters: Counters) -> Self {
        Self {
            events,
            notifier,
            counters,
            shutdown: None,
        }
    }

    /// Stop before the next trigger once `shutdown` flips to `true`.
    /// The trigger being processed always completes its persist+notify pair.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub async fn dispatch(&self, matched: &[Trigger]) -> DispatchReport {
        let mut report = DispatchReport::default();

        for (i, trigger) in matched.iter().enumerate() {
            if self.shutdown_requested() {
                report.deferred = matched[i..].iter().map(|t| t.identity.clone()).collect();
                warn!(
                    deferred = report.deferred.len(),
                    "shutdown requested; remaining triggers deferred"
                );
                break;
            }

            let status = self.dispatch_one(trigger).await;
            report.outcomes.push(DispatchOutcome {
                identity: trigger.identity.clone(),
                status,
            });
        }

        report
    }

    async fn dispatch_one(&self, trigger: &Trigger) -> DispatchStatus {
        let identity = trigger.identity.as_str();

        let event = match self.events.append(identity).await {
            Ok(ev) => ev,
            Err(source) => {
                let err = PipelineError::Persist {
                    identity: identity.to_string(),
                    source,
                };
                Counters::incr(&self.counters.persist_failed);
                warn!(identity, error = %err, "event not recorded; skipping notification");
                return DispatchStatus::PersistFailed {
                    reason: err.to_string(),
                };
            }
        };

        Counters::incr(&self.counters.events_recorded);
        info!(identity, event_id = event.id, "new event recorded");

        let sent = warn_if_slow(
            "realtime_notify",
            Duration::from_secs(2),
            self.notifier.notify(identity),
        )
        .await;

        match sent {
            Ok(()) => {
                Counters::incr(&self.counters.notify_delivered);
                info!(identity, "realtime API triggered");
                DispatchStatus::Delivered { event_id: event.id }
            }
            Err(e) => {
                let err = PipelineError::from(e);
                Counters::incr(&self.counters.notify_failed);
                warn!(identity, event_id = event.id, error = %err, "realtime notification failed; event kept");
                DispatchStatus::NotifyFailed {
                    event_id: event.id,
                    reason: err.to_string(),
                }
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }
}
