#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use logwatch::error::TransportError;
use logwatch::models::filter::FilterSpec;
use logwatch::services::transport::{LogSubscription, LogTransport, Unsubscribe};
use logwatch::utils::config::{Config, Mode};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use web3::types::{Address, Log};

pub fn contract() -> Address {
    Address::repeat_byte(0xbb)
}

pub fn config(mode: Mode) -> Config {
    Config {
        endpoint: "ws://mock".to_string(),
        address: contract(),
        timeout: Duration::from_secs(1),
        mode: Some(mode),
        page_size: 2000,
        start_block: 0,
        retry_delay: Duration::ZERO,
    }
}

/// A log emitted by the watched contract at `block`.
pub fn log_at(block: u64) -> Log {
    serde_json::from_value(json!({
        "address": format!("{:?}", contract()),
        "topics": [],
        "data": "0x",
        "blockNumber": format!("{:#x}", block),
    }))
    .expect("valid log json")
}

/// What the next `query` call does.
pub enum QueryOutcome {
    Fail(&'static str),
    Hang(Duration),
}

/// Test side of a mock subscription.
pub struct Feed {
    pub events: mpsc::Sender<Log>,
    pub errors: Option<oneshot::Sender<TransportError>>,
}

struct Pending {
    events: mpsc::Receiver<Log>,
    errors: oneshot::Receiver<TransportError>,
}

#[derive(Default)]
struct Releases {
    calls: AtomicUsize,
    released: AtomicBool,
    effective: AtomicUsize,
}

struct MockHandle(Arc<Releases>);

impl Unsubscribe for MockHandle {
    fn unsubscribe(&self) {
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        if !self.0.released.swap(true, Ordering::SeqCst) {
            self.0.effective.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// In-memory node holding a fixed set of logs.
pub struct MockTransport {
    chain: Vec<Log>,
    script: Mutex<VecDeque<QueryOutcome>>,
    queries: Mutex<Vec<FilterSpec>>,
    pending: Mutex<Option<Pending>>,
    subscribe_delay: Option<Duration>,
    subscribe_error: Option<&'static str>,
    releases: Arc<Releases>,
}

impl MockTransport {
    pub fn new(chain: Vec<Log>) -> (Self, Feed) {
        let (events_tx, events) = mpsc::channel(1);
        let (errors_tx, errors) = oneshot::channel();
        let transport = Self {
            chain,
            script: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
            pending: Mutex::new(Some(Pending { events, errors })),
            subscribe_delay: None,
            subscribe_error: None,
            releases: Arc::new(Releases::default()),
        };
        (transport, Feed { events: events_tx, errors: Some(errors_tx) })
    }

    pub fn with_script(self, outcomes: Vec<QueryOutcome>) -> Self {
        *self.script.lock().unwrap() = outcomes.into();
        self
    }

    pub fn with_subscribe_delay(mut self, delay: Duration) -> Self {
        self.subscribe_delay = Some(delay);
        self
    }

    pub fn with_subscribe_error(mut self, message: &'static str) -> Self {
        self.subscribe_error = Some(message);
        self
    }

    /// Filters passed to `query`, in call order.
    pub fn queries(&self) -> Vec<FilterSpec> {
        self.queries.lock().unwrap().clone()
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.releases.calls.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.effective.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogTransport for MockTransport {
    async fn subscribe(&self, _filter: &FilterSpec) -> Result<LogSubscription, TransportError> {
        if let Some(delay) = self.subscribe_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.subscribe_error {
            return Err(message.into());
        }
        let pending = self.pending.lock().unwrap().take().ok_or("already subscribed")?;
        Ok(LogSubscription {
            events: pending.events,
            errors: pending.errors,
            handle: Box::new(MockHandle(self.releases.clone())),
        })
    }

    async fn query(&self, filter: &FilterSpec) -> Result<Vec<Log>, TransportError> {
        self.queries.lock().unwrap().push(filter.clone());

        let outcome = self.script.lock().unwrap().pop_front();
        match outcome {
            Some(QueryOutcome::Fail(message)) => return Err(message.into()),
            Some(QueryOutcome::Hang(delay)) => tokio::time::sleep(delay).await,
            None => {}
        }

        Ok(self.chain.iter().filter(|log| matches(filter, log)).cloned().collect())
    }
}

/// Whether a node would return `log` for `filter`. Both bounds are inclusive.
fn matches(filter: &FilterSpec, log: &Log) -> bool {
    if !filter.addresses.contains(&log.address) {
        return false;
    }
    let block = match log.block_number {
        Some(block) => block.as_u64(),
        None => return filter.from_block.is_none() && filter.to_block.is_none(),
    };
    filter.from_block.map_or(true, |from| block >= from)
        && filter.to_block.map_or(true, |to| block <= to)
}
