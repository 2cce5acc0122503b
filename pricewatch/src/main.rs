use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;

use pricewatch::{
    config::AppConfig,
    db::Db,
    dispatch::NotificationDispatcher,
    logger::init_tracing,
    metrics::counters::Counters,
    notify::IftttRealtimeNotifier,
    price::{AwattarClient, PriceCalculator},
    scheduler::{Pipeline, TickRunner},
    store::{SqlxEventStore, SqlxTriggerStore},
};

/// Connects to the DB and brings the schema up to date.
async fn init_db(cfg: &AppConfig) -> anyhow::Result<Db> {
    let db = Db::connect(&cfg.database_url)
        .await
        .with_context(|| format!("failed to connect to {}", cfg.database_url))?;
    db.migrate().await.context("schema migration failed")?;

    Ok(db)
}

/// Wires feed, calculator, stores and notifier into one tick pipeline.
fn build_pipeline(
    cfg: &AppConfig,
    db: &Db,
    counters: Counters,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<Pipeline> {
    let source = AwattarClient::new(cfg.price_feed_url.clone(), cfg.fetch_timeout)?;
    let notifier = IftttRealtimeNotifier::new(
        cfg.notify_url.clone(),
        cfg.service_key.clone(),
        cfg.notify_timeout,
    )?;

    let triggers = Arc::new(SqlxTriggerStore::new(db.pool.clone()));
    let events = Arc::new(SqlxEventStore::new(db.pool.clone()));

    let dispatcher =
        NotificationDispatcher::new(events, Arc::new(notifier), counters.clone()).with_shutdown(shutdown);

    Ok(Pipeline::new(
        Arc::new(source),
        PriceCalculator::new(cfg.surcharges.clone()),
        triggers,
        dispatcher,
        counters,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sqlx::any::install_default_drivers();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    tracing::info!("Starting pricewatch...");

    let cfg = AppConfig::from_env()?;

    let db = init_db(&cfg).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let pipeline = build_pipeline(&cfg, &db, Counters::default(), shutdown_rx.clone())?;
    let runner = TickRunner::new(Arc::new(pipeline), cfg.tick_interval).aligned(cfg.align_ticks);

    let runner_task = tokio::spawn(runner.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    // Let the in-flight tick finish its current trigger before exiting.
    let _ = shutdown_tx.send(true);
    runner_task.await.context("tick runner panicked")?;

    Ok(())
}
