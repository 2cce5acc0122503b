use sqlx::AnyPool;

pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    // Triggers
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS triggers (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  trigger_identity TEXT NOT NULL UNIQUE,
  direction TEXT NOT NULL CHECK (direction IN ('less_than','more_than')),
  threshold REAL NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Events
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS events (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  identity TEXT NOT NULL,
  triggered_at_ms BIGINT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_events_identity ON events(identity, triggered_at_ms);"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
