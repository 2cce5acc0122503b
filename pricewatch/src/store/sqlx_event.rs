use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::{AnyPool, Row};

use crate::model::Event;
use crate::store::EventStore;
use crate::time::now_ms;

/// SQLx-backed event log. Rows are only ever inserted or purged.
pub struct SqlxEventStore {
    pool: Arc<AnyPool>,
}

impl SqlxEventStore {
    pub fn new(pool: Arc<AnyPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for SqlxEventStore {
    async fn append(&self, identity: &str) -> anyhow::Result<Event> {
        let triggered_at_ms = now_ms();

        let row = sqlx::query(
            r#"
INSERT INTO events (identity, triggered_at_ms)
VALUES (?, ?)
RETURNING id;
"#,
        )
        .bind(identity.to_string())
        .bind(u64_to_i64(triggered_at_ms)?)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(Event {
            id: row.try_get("id")?,
            identity: identity.to_string(),
            triggered_at_ms,
        })
    }

    async fn list_recent(&self, identity: &str, limit: usize) -> anyhow::Result<Vec<Event>> {
        let rows = sqlx::query(
            r#"
SELECT id, identity, triggered_at_ms
FROM events
WHERE identity = ?
ORDER BY triggered_at_ms DESC, id DESC
LIMIT ?;
"#,
        )
        .bind(identity.to_string())
        .bind(limit.min(i64::MAX as usize) as i64)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(row_to_event).collect()
    }

    async fn purge(&self, identity: &str) -> anyhow::Result<u64> {
        let res = sqlx::query(r#"DELETE FROM events WHERE identity = ?;"#)
            .bind(identity.to_string())
            .execute(self.pool.as_ref())
            .await?;

        Ok(res.rows_affected())
    }
}

fn row_to_event(r: &sqlx::any::AnyRow) -> anyhow::Result<Event> {
    Ok(Event {
        id: r.try_get("id")?,
        identity: r.try_get("identity")?,
        triggered_at_ms: i64_to_u64(r.try_get("triggered_at_ms")?)?,
    })
}

/* =========================
Numeric safety helpers
========================= */

fn i64_to_u64(v: i64) -> anyhow::Result<u64> {
    if v < 0 {
        return Err(anyhow!("negative i64 where u64 expected: {v}"));
    }
    Ok(v as u64)
}

fn u64_to_i64(v: u64) -> anyhow::Result<i64> {
    if v > i64::MAX as u64 {
        return Err(anyhow!("u64 too large for i64: {v}"));
    }
    Ok(v as i64)
}
