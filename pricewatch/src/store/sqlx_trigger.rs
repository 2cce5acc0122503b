use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{AnyPool, Row};

use crate::model::{Direction, Trigger};
use crate::store::TriggerStore;

/// SQLx-backed trigger store.
/// Responsible only for persistence and row mapping.
pub struct SqlxTriggerStore {
    pool: Arc<AnyPool>,
}

impl SqlxTriggerStore {
    pub fn new(pool: Arc<AnyPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TriggerStore for SqlxTriggerStore {
    async fn list_all(&self) -> anyhow::Result<Vec<Trigger>> {
        let rows = sqlx::query(
            r#"
SELECT trigger_identity, direction, threshold
FROM triggers
ORDER BY id ASC;
"#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            match row_to_trigger(&r) {
                Ok(t) => out.push(t),
                Err(e) => {
                    // poison-row resilience: skip but don't fail the tick
                    tracing::warn!(error = %e, "skipping malformed trigger row");
                }
            }
        }

        Ok(out)
    }

    async fn upsert_if_absent(
        &self,
        identity: &str,
        direction: Direction,
        threshold: f64,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
INSERT INTO triggers (trigger_identity, direction, threshold)
VALUES (?, ?, ?)
ON CONFLICT (trigger_identity) DO NOTHING;
"#,
        )
        .bind(identity.to_string())
        .bind(direction.as_str().to_string())
        .bind(threshold)
        .execute(self.pool.as_ref())
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn delete(&self, identity: &str) -> anyhow::Result<()> {
        sqlx::query(r#"DELETE FROM triggers WHERE trigger_identity = ?;"#)
            .bind(identity.to_string())
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }
}

fn row_to_trigger(r: &sqlx::any::AnyRow) -> anyhow::Result<Trigger> {
    let identity: String = r.try_get("trigger_identity")?;
    let direction: String = r.try_get("direction")?;
    let threshold: f64 = r.try_get("threshold")?;

    let direction = direction
        .parse::<Direction>()
        .with_context(|| format!("trigger {identity}"))?;

    Ok(Trigger {
        identity,
        direction,
        threshold,
    })
}
