#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use pricewatch::dispatch::NotificationDispatcher;
use pricewatch::metrics::counters::Counters;
use pricewatch::model::{Direction, Event, Trigger};
use pricewatch::notify::{NotifyError, Notifier};
use pricewatch::price::{FetchError, MarketPoint, PriceCalculator, PriceSource};
use pricewatch::scheduler::Pipeline;
use pricewatch::store::{EventStore, TriggerStore};

/// Ordered in-memory trigger store.
#[derive(Default, Clone)]
pub struct MockTriggerStore {
    pub rows: Arc<Mutex<Vec<Trigger>>>,
    pub fail_list: Arc<std::sync::atomic::AtomicBool>,
}

impl MockTriggerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test convenience
    pub async fn insert_direct(&self, trigger: Trigger) {
        self.rows.lock().await.push(trigger);
    }
}

#[async_trait]
impl TriggerStore for MockTriggerStore {
    async fn list_all(&self) -> anyhow::Result<Vec<Trigger>> {
        if self.fail_list.load(Ordering::SeqCst) {
            anyhow::bail!("trigger store offline");
        }
        Ok(self.rows.lock().await.clone())
    }

    async fn upsert_if_absent(
        &self,
        identity: &str,
        direction: Direction,
        threshold: f64,
    ) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|t| t.identity == identity) {
            return Ok(false);
        }
        rows.push(Trigger::new(identity, direction, threshold));
        Ok(true)
    }

    async fn delete(&self, identity: &str) -> anyhow::Result<()> {
        self.rows.lock().await.retain(|t| t.identity != identity);
        Ok(())
    }
}

/// In-memory event log. Appends for identities in `fail_for` error out.
#[derive(Default, Clone)]
pub struct MockEventStore {
    pub rows: Arc<Mutex<Vec<Event>>>,
    pub fail_for: Arc<Mutex<HashSet<String>>>,
    /// Log of store/notifier calls shared with `MockNotifier`, for ordering checks.
    pub journal: Arc<Mutex<Vec<String>>>,
}

impl MockEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_appends_for(&self, identity: &str) {
        self.fail_for.lock().await.insert(identity.to_string());
    }

    pub async fn count_for(&self, identity: &str) -> usize {
        self.rows
            .lock()
            .await
            .iter()
            .filter(|e| e.identity == identity)
            .count()
    }

    pub async fn total(&self) -> usize {
        self.rows.lock().await.len()
    }
}

#[async_trait]
impl EventStore for MockEventStore {
    async fn append(&self, identity: &str) -> anyhow::Result<Event> {
        if self.fail_for.lock().await.contains(identity) {
            anyhow::bail!("event store unavailable");
        }

        let mut rows = self.rows.lock().await;
        let ev = Event {
            id: rows.len() as i64 + 1,
            identity: identity.to_string(),
            triggered_at_ms: pricewatch::time::now_ms(),
        };
        rows.push(ev.clone());
        self.journal.lock().await.push(format!("append:{identity}"));
        Ok(ev)
    }

    async fn list_recent(&self, identity: &str, limit: usize) -> anyhow::Result<Vec<Event>> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .rev()
            .filter(|e| e.identity == identity)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn purge(&self, identity: &str) -> anyhow::Result<u64> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|e| e.identity != identity);
        Ok((before - rows.len()) as u64)
    }
}

/// Notifier that records calls and rejects identities in `fail_for`.
#[derive(Default, Clone)]
pub struct MockNotifier {
    pub sent: Arc<Mutex<Vec<String>>>,
    pub fail_for: Arc<Mutex<HashSet<String>>>,
    pub journal: Arc<Mutex<Vec<String>>>,
    pub delay: Option<Duration>,
}

impl MockNotifier {
    pub async fn fail_for(&self, identity: &str) {
        self.fail_for.lock().await.insert(identity.to_string());
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, trigger_identity: &str) -> Result<(), NotifyError> {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }

        self.journal
            .lock()
            .await
            .push(format!("notify:{trigger_identity}"));

        if self.fail_for.lock().await.contains(trigger_identity) {
            return Err(NotifyError::Rejected {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            });
        }

        self.sent.lock().await.push(trigger_identity.to_string());
        Ok(())
    }
}

/// Price source returning a fixed raw price, optionally slowly, and
/// tracking how many fetches overlap.
#[derive(Default, Clone)]
pub struct MockPriceSource {
    pub raw_price: Option<f64>,
    pub delay: Option<Duration>,
    pub calls: Arc<AtomicUsize>,
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl MockPriceSource {
    pub fn fixed(raw_price: f64) -> Self {
        Self {
            raw_price: Some(raw_price),
            ..Self::default()
        }
    }

    /// Behaves like a feed answering with zero points.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn slow(raw_price: f64, delay: Duration) -> Self {
        Self {
            raw_price: Some(raw_price),
            delay: Some(delay),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn fetch_latest_price(&self) -> Result<MarketPoint, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let price = self.raw_price.ok_or(FetchError::EmptyResponse)?;
        Ok(MarketPoint {
            start_timestamp: 1_700_000_000_000,
            end_timestamp: 1_700_003_600_000,
            marketprice: price,
            unit: "Eur/MWh".to_string(),
        })
    }
}

pub struct Harness {
    pub source: MockPriceSource,
    pub triggers: MockTriggerStore,
    pub events: MockEventStore,
    pub notifier: MockNotifier,
    pub counters: Counters,
    pub pipeline: Arc<Pipeline>,
}

/// Raw feed price that maps to a consumer price of about 43.43 ct/kWh.
pub const RAW_260: f64 = 260.0;

pub fn harness(source: MockPriceSource) -> Harness {
    harness_with(source, MockNotifier::default(), None)
}

pub fn harness_with(
    source: MockPriceSource,
    notifier: MockNotifier,
    shutdown: Option<tokio::sync::watch::Receiver<bool>>,
) -> Harness {
    let triggers = MockTriggerStore::new();
    let events = MockEventStore::new();
    let notifier = MockNotifier {
        journal: Arc::clone(&events.journal),
        ..notifier
    };
    let counters = Counters::default();

    let mut dispatcher = NotificationDispatcher::new(
        Arc::new(events.clone()),
        Arc::new(notifier.clone()),
        counters.clone(),
    );
    if let Some(rx) = shutdown {
        dispatcher = dispatcher.with_shutdown(rx);
    }

    let pipeline = Arc::new(Pipeline::new(
        Arc::new(source.clone()),
        PriceCalculator::default(),
        Arc::new(triggers.clone()),
        dispatcher,
        counters.clone(),
    ));

    Harness {
        source,
        triggers,
        events,
        notifier,
        counters,
        pipeline,
    }
}
