//! Persistence contracts consumed by the pipeline and the registry.
//!
//! The pipeline only ever reads triggers and appends events. Registration,
//! deletion and the long-poll read path live on the registry side but share
//! the same stores.

pub mod sqlx_event;
pub mod sqlx_trigger;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{Direction, Event, Trigger};

pub use sqlx_event::SqlxEventStore;
pub use sqlx_trigger::SqlxTriggerStore;

#[async_trait]
pub trait TriggerStore: Send + Sync {
    /// All triggers in store iteration (insertion) order.
    async fn list_all(&self) -> Result<Vec<Trigger>>;

    /// Creates the trigger unless one with the same identity already exists.
    /// Returns `true` when a row was created. Existing rows are never overwritten.
    async fn upsert_if_absent(
        &self,
        identity: &str,
        direction: Direction,
        threshold: f64,
    ) -> Result<bool>;

    async fn delete(&self, identity: &str) -> Result<()>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a new event; the store assigns id and timestamp.
    async fn append(&self, identity: &str) -> Result<Event>;

    /// Newest first, at most `limit` rows.
    async fn list_recent(&self, identity: &str, limit: usize) -> Result<Vec<Event>>;

    /// Removes every event recorded for `identity`.
    async fn purge(&self, identity: &str) -> Result<u64>;
}
