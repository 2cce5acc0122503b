mod mock_store;

use std::sync::atomic::Ordering;
use std::time::Duration;

use mock_store::{MockNotifier, MockPriceSource, RAW_260, harness, harness_with};
use pricewatch::metrics::counters::Counters;
use pricewatch::model::{Direction, Trigger};
use pricewatch::scheduler::{TickPhase, TickRunner};
use tokio::sync::watch;
use tracing_test::traced_test;

const INTERVAL: Duration = Duration::from_secs(10);

#[tokio::test(start_paused = true)]
async fn slow_tick_causes_skips_not_overlap() {
    // Fetch takes 2.5 intervals: ticks at t=10s and t=20s land while the
    // first tick is still running and must be dropped.
    let h = harness(MockPriceSource::slow(RAW_260, Duration::from_secs(25)));
    h.triggers
        .insert_direct(Trigger::new("a", Direction::LessThan, 50.0))
        .await;

    let runner = TickRunner::new(h.pipeline.clone(), INTERVAL);
    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(runner.run(rx));

    // t=0 runs, 10/20 skipped, 30 runs, 40/50 skipped, 60 runs.
    tokio::time::sleep(Duration::from_secs(65)).await;
    tx.send(true).unwrap();
    task.await.unwrap();

    let started = Counters::get(&h.counters.ticks_started);
    let skipped = Counters::get(&h.counters.ticks_skipped_overlap);

    assert_eq!(h.source.max_in_flight.load(Ordering::SeqCst), 1);
    assert!(skipped >= 2, "expected skipped ticks, got {skipped}");
    assert_eq!(started as usize, h.source.calls.load(Ordering::SeqCst));

    // Shutdown waits for the in-flight tick, so every started tick completed
    // and produced exactly one event for the single matching trigger.
    assert_eq!(Counters::get(&h.counters.ticks_completed), started);
    assert_eq!(h.events.count_for("a").await as u64, started);
}

#[tokio::test(start_paused = true)]
async fn fast_ticks_run_once_per_interval() {
    let h = harness(MockPriceSource::fixed(RAW_260));
    h.triggers
        .insert_direct(Trigger::new("a", Direction::MoreThan, 1.0))
        .await;

    let runner = TickRunner::new(h.pipeline.clone(), INTERVAL);
    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(runner.run(rx));

    // Ticks at 0, 10, 20, 30, 40.
    tokio::time::sleep(Duration::from_secs(45)).await;
    tx.send(true).unwrap();
    task.await.unwrap();

    assert_eq!(Counters::get(&h.counters.ticks_started), 5);
    assert_eq!(Counters::get(&h.counters.ticks_skipped_overlap), 0);
    assert_eq!(h.events.count_for("a").await, 5);
}

#[tokio::test(start_paused = true)]
async fn manual_start_is_refused_while_tick_runs() {
    let h = harness(MockPriceSource::slow(RAW_260, Duration::from_secs(5)));
    let runner = TickRunner::new(h.pipeline.clone(), INTERVAL);

    let first = runner.try_start_tick().expect("first tick starts");
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(runner.is_running());
    assert_eq!(runner.phase(), TickPhase::Fetching);
    assert!(runner.try_start_tick().is_none());

    first.await.unwrap();
    assert!(!runner.is_running());
    assert_eq!(runner.phase(), TickPhase::Idle);
    assert!(runner.try_start_tick().is_some());
}

#[tokio::test(start_paused = true)]
async fn shutdown_mid_dispatch_finishes_current_pair() {
    let (tx, rx) = watch::channel(false);
    let notifier = MockNotifier {
        delay: Some(Duration::from_secs(3)),
        ..MockNotifier::default()
    };
    let h = harness_with(MockPriceSource::fixed(RAW_260), notifier, Some(rx.clone()));
    for id in ["a", "b", "c"] {
        h.triggers
            .insert_direct(Trigger::new(id, Direction::LessThan, 50.0))
            .await;
    }

    let runner = TickRunner::new(h.pipeline.clone(), Duration::from_secs(3600));
    let task = tokio::spawn(runner.run(rx));

    // First trigger is mid-notification at t=1s.
    tokio::time::sleep(Duration::from_secs(1)).await;
    tx.send(true).unwrap();
    task.await.unwrap();

    assert_eq!(h.events.count_for("a").await, 1);
    assert_eq!(*h.notifier.sent.lock().await, vec!["a"]);
    assert_eq!(h.events.total().await, 1);
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn tick_span_carries_price_and_match_count() {
    let h = harness(MockPriceSource::fixed(RAW_260));
    h.triggers
        .insert_direct(Trigger::new("a", Direction::LessThan, 50.0))
        .await;

    let runner = TickRunner::new(h.pipeline.clone(), INTERVAL);
    runner.try_start_tick().expect("tick starts").await.unwrap();

    assert!(logs_contain("tick{tick_id="));
    assert!(logs_contain("price_ct=43.42"));
    assert!(logs_contain("matched=1"));
}
