#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use parcel_tracking::aggregator::Timeline;
use parcel_tracking::backend::{BackendError, TrackingBackend};
use parcel_tracking::channel::{EventStream, Transport, TransportError};
use parcel_tracking::directory::{OrderFilter, PageRequest, PagedResult};
use parcel_tracking::model::{OrderId, OrderSnapshot, OrderStatus, OrderSummary, StatusEvent};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub type Feed = mpsc::UnboundedSender<Result<StatusEvent, TransportError>>;

/// Transport whose connections are handed out from a script.
///
/// Every `open_feed` queues one successful connection and returns its sending side. Dropping the
/// sender ends that connection. Connects beyond the script are refused.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<UnboundedReceiverStream<Result<StatusEvent, TransportError>>>>,
    connects: AtomicU32,
}

impl ScriptedTransport {
    pub fn open_feed(&self) -> Feed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.script
            .lock()
            .unwrap()
            .push_back(UnboundedReceiverStream::new(rx));
        tx
    }

    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&self, _: &HashSet<OrderId>) -> Result<EventStream, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(stream) => Ok(stream.boxed()),
            None => Err(TransportError::ConnectFailed("connection refused".into())),
        }
    }
}

/// Backend serving one order from an editable event list.
pub struct FakeBackend {
    order_id: OrderId,
    events: Mutex<Vec<StatusEvent>>,
    snapshot_errors: Mutex<VecDeque<BackendError>>,
    fail_snapshots: Mutex<Option<BackendError>>,
    snapshot_calls: AtomicU32,
    backfills: Mutex<Vec<HashMap<OrderId, u64>>>,
}

impl FakeBackend {
    pub fn new(order_id: &str, statuses: &[OrderStatus]) -> Self {
        Self {
            order_id: order_id.into(),
            events: Mutex::new(events(order_id, 1, statuses)),
            snapshot_errors: Mutex::new(VecDeque::new()),
            fail_snapshots: Mutex::new(None),
            snapshot_calls: AtomicU32::new(0),
            backfills: Mutex::new(Vec::new()),
        }
    }

    /// Appends the next events, numbered after the current last one.
    pub fn record(&self, statuses: &[OrderStatus]) {
        let mut stored = self.events.lock().unwrap();
        let next = stored.len() as u64 + 1;
        stored.extend(events(self.order_id.as_str(), next, statuses));
    }

    pub fn stored(&self) -> Vec<StatusEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Fails the next snapshot call with `error`.
    pub fn fail_next_snapshot(&self, error: BackendError) {
        self.snapshot_errors.lock().unwrap().push_back(error);
    }

    /// Fails every snapshot call with `error`.
    pub fn fail_all_snapshots(&self, error: BackendError) {
        *self.fail_snapshots.lock().unwrap() = Some(error);
    }

    pub fn snapshot_calls(&self) -> u32 {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn backfills(&self) -> Vec<HashMap<OrderId, u64>> {
        self.backfills.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackingBackend for FakeBackend {
    async fn snapshot(&self, order_id: &OrderId) -> Result<OrderSnapshot, BackendError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        if *order_id != self.order_id {
            return Err(BackendError::NotFound(order_id.clone()));
        }
        if let Some(error) = self.snapshot_errors.lock().unwrap().pop_front() {
            return Err(error);
        }
        if let Some(error) = self.fail_snapshots.lock().unwrap().clone() {
            return Err(error);
        }
        let timeline = Timeline::from_events(order_id.clone(), self.stored())
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Ok(OrderSnapshot {
            order_id: order_id.clone(),
            current_status: timeline.current_status().unwrap_or(OrderStatus::INITIAL),
            timeline,
        })
    }

    async fn events_since(
        &self,
        order_id: &OrderId,
        since: u64,
    ) -> Result<Vec<StatusEvent>, BackendError> {
        if *order_id != self.order_id {
            return Err(BackendError::NotFound(order_id.clone()));
        }
        Ok(self
            .stored()
            .into_iter()
            .filter(|event| event.sequence > since)
            .collect())
    }

    async fn backfill(
        &self,
        since: &HashMap<OrderId, u64>,
    ) -> Result<Vec<StatusEvent>, BackendError> {
        self.backfills.lock().unwrap().push(since.clone());
        let mut out = Vec::new();
        for (order_id, sequence) in since {
            match self.events_since(order_id, *sequence).await {
                Ok(batch) => out.extend(batch),
                Err(BackendError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    async fn query(
        &self,
        _: OrderFilter,
        _: PageRequest,
    ) -> Result<PagedResult<OrderSummary>, BackendError> {
        Err(BackendError::InvalidQuery("not served here".into()))
    }
}

/// Consecutive events for `order_id` starting at sequence `first`.
pub fn events(order_id: &str, first: u64, statuses: &[OrderStatus]) -> Vec<StatusEvent> {
    statuses
        .iter()
        .zip(first..)
        .map(|(status, sequence)| StatusEvent::new(order_id, sequence, *status))
        .collect()
}
