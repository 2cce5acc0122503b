//! Registry-side operations on the shared stores.
//!
//! Transport-agnostic: an HTTP layer (not part of this crate) validates the
//! caller, then forwards the raw trigger fields here.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::model::{Direction, Event, Trigger};
use crate::store::{EventStore, TriggerStore};

pub const DEFAULT_POLL_LIMIT: usize = 50;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Result of a registration: the trigger as stored, and whether this call
/// created it.
#[derive(Clone, Debug, PartialEq)]
pub struct Registration {
    pub trigger: Trigger,
    pub created: bool,
}

/// Example fields shown to subscribers setting up a new trigger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleFields {
    pub price_change_direction: &'static str,
    pub threshold: &'static str,
}

pub struct TriggerRegistry {
    triggers: Arc<dyn TriggerStore>,
    events: Arc<dyn EventStore>,
}

impl TriggerRegistry {
    pub fn new(triggers: Arc<dyn TriggerStore>, events: Arc<dyn EventStore>) -> Self {
        Self { triggers, events }
    }

    pub fn sample_fields() -> SampleFields {
        SampleFields {
            price_change_direction: "more_than",
            threshold: "26",
        }
    }

    /// Validates the raw fields and registers the trigger if its identity is
    /// new. Re-registering an existing identity leaves the stored trigger as is
    /// and returns that stored trigger, not the submitted fields.
    pub async fn register(
        &self,
        identity: &str,
        direction: &str,
        threshold: &str,
    ) -> Result<Registration, RegistryError> {
        let trigger = parse_trigger(identity, direction, threshold)?;

        let created = self
            .triggers
            .upsert_if_absent(&trigger.identity, trigger.direction, trigger.threshold)
            .await?;

        if created {
            info!(identity = %trigger.identity, direction = %trigger.direction, threshold = trigger.threshold, "new trigger created");
            return Ok(Registration { trigger, created });
        }

        let stored = self
            .triggers
            .list_all()
            .await?
            .into_iter()
            .find(|t| t.identity == trigger.identity)
            .ok_or_else(|| {
                anyhow::anyhow!("trigger {} vanished during registration", trigger.identity)
            })?;

        debug!(identity = %stored.identity, "trigger already registered");
        Ok(Registration {
            trigger: stored,
            created,
        })
    }

    /// Events for `identity`, newest first. `limit` defaults to 50.
    pub async fn poll(
        &self,
        identity: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Event>, RegistryError> {
        let limit = limit.unwrap_or(DEFAULT_POLL_LIMIT);
        Ok(self.events.list_recent(identity, limit).await?)
    }

    /// Removes the trigger and purges its event history.
    pub async fn unsubscribe(&self, identity: &str) -> Result<(), RegistryError> {
        self.triggers.delete(identity).await?;
        let purged = self.events.purge(identity).await?;

        info!(identity, purged, "deleted trigger");
        Ok(())
    }
}

fn parse_trigger(identity: &str, direction: &str, threshold: &str) -> Result<Trigger, RegistryError> {
    if identity.trim().is_empty() {
        return Err(RegistryError::BadRequest("missing trigger_identity".into()));
    }

    let direction: Direction = direction
        .parse()
        .map_err(|e| RegistryError::BadRequest(format!("{e}")))?;

    let threshold: f64 = threshold
        .trim()
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| RegistryError::BadRequest(format!("threshold is not a number: {threshold:?}")))?;

    Ok(Trigger::new(identity, direction, threshold))
}
