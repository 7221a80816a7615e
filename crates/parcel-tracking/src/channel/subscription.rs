use super::{
    Backoff, ChannelState, ChannelUpdate, EventStream, SequenceTracker, Transport, TransportError,
};
use crate::backend::{BackendError, TrackingBackend};
use crate::config::ChannelConfig;
use crate::model::StatusEvent;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Cloneable reference used to cancel a subscription from elsewhere.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    id: u64,
    token: CancellationToken,
    shutdown: CancellationToken,
}

impl SubscriptionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once the subscription itself, its parent or the channel was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.shutdown.is_cancelled()
    }

    async fn cancelled(&self) {
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = self.shutdown.cancelled() => {}
        }
    }
}

/// One subscriber's view of the channel. Dropping it cancels the background task.
pub struct Subscription {
    handle: SubscriptionHandle,
    updates: mpsc::Receiver<ChannelUpdate>,
    state: watch::Receiver<ChannelState>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(super) fn spawn(
        id: u64,
        token: CancellationToken,
        shutdown: CancellationToken,
        transport: Arc<dyn Transport>,
        backend: Arc<dyn TrackingBackend>,
        config: &ChannelConfig,
        tracker: SequenceTracker,
    ) -> Self {
        let (updates_tx, updates) = mpsc::channel(config.update_buffer.max(1));
        let (state_tx, state) = watch::channel(ChannelState::Connecting);
        let handle = SubscriptionHandle {
            id,
            token,
            shutdown,
        };
        let link = Link {
            id,
            transport,
            backend,
            backoff: Backoff::new(config.backoff_base(), config.backoff_max()),
            max_attempts: config.max_reconnect_attempts,
            tracker,
            updates: updates_tx,
            state: state_tx,
            stop: handle.clone(),
        };
        let task = tokio::spawn(link.run());

        Self {
            handle,
            updates,
            state,
            task: Some(task),
        }
    }

    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    /// Next update, or `None` once the subscription is cancelled.
    pub async fn next(&mut self) -> Option<ChannelUpdate> {
        self.updates.recv().await
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub fn state_changes(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// Cancels and waits for the background task to finish.
    pub async fn close(mut self) {
        self.handle.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

impl Stream for Subscription {
    type Item = ChannelUpdate;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().updates.poll_recv(cx)
    }
}

#[derive(Debug, Error)]
enum LinkError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("backfill failed: {0}")]
    Backfill(#[from] BackendError),
    #[error("stream ended")]
    Closed,
}

/// Why [`Link::pump`] returned.
enum Stop {
    /// Cancelled, or the subscriber went away.
    Finished,
    Lost(LinkError),
}

struct Link {
    id: u64,
    transport: Arc<dyn Transport>,
    backend: Arc<dyn TrackingBackend>,
    backoff: Backoff,
    max_attempts: u32,
    tracker: SequenceTracker,
    updates: mpsc::Sender<ChannelUpdate>,
    state: watch::Sender<ChannelState>,
    stop: SubscriptionHandle,
}

impl Link {
    async fn run(mut self) {
        let mut failures: u32 = 0;
        let mut degraded = false;

        loop {
            let opened = tokio::select! {
                _ = self.stop.cancelled() => break,
                opened = self.open() => opened,
            };

            let lost = match opened {
                Ok((stream, backlog)) => {
                    failures = 0;
                    if degraded {
                        degraded = false;
                        info!(subscription = self.id, "Live updates recovered");
                        if !self.deliver(ChannelUpdate::Recovered).await {
                            break;
                        }
                    }
                    self.state.send_replace(ChannelState::Active);

                    if !self.forward_all(backlog).await {
                        break;
                    }
                    match self.pump(stream).await {
                        Stop::Finished => break,
                        Stop::Lost(e) => e,
                    }
                }
                Err(e) => e,
            };

            failures = failures.saturating_add(1);
            warn!(subscription = self.id, error = %lost, failures, "Live update connection lost");

            if failures >= self.max_attempts && !degraded {
                degraded = true;
                self.state.send_replace(ChannelState::Degraded);
                warn!(subscription = self.id, attempts = failures, "Live updates degraded");
                if !self
                    .deliver(ChannelUpdate::Degraded { attempts: failures })
                    .await
                {
                    break;
                }
            } else if !degraded {
                self.state.send_replace(ChannelState::Connecting);
            }

            let delay = self.backoff.delay(failures);
            debug!(subscription = self.id, ?delay, "Reconnecting after backoff");
            tokio::select! {
                _ = self.stop.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.state.send_replace(ChannelState::Cancelled);
        debug!(subscription = self.id, "Subscription task finished");
    }

    /// Connects, then fetches what was missed while disconnected.
    async fn open(&self) -> Result<(EventStream, Vec<StatusEvent>), LinkError> {
        let stream = self.transport.connect(&self.tracker.order_ids()).await?;
        let since = self.tracker.watermarks();
        debug!(subscription = self.id, ?since, "Backfilling");
        let mut backlog = self.backend.backfill(&since).await?;
        backlog.sort_by(|a, b| {
            a.order_id
                .cmp(&b.order_id)
                .then(a.sequence.cmp(&b.sequence))
        });
        Ok((stream, backlog))
    }

    async fn forward_all(&mut self, events: Vec<StatusEvent>) -> bool {
        for event in events {
            if !self.forward(event).await {
                return false;
            }
        }
        true
    }

    /// Delivers `event` unless it was delivered before.
    async fn forward(&mut self, event: StatusEvent) -> bool {
        if !self.tracker.observe(&event) {
            return true;
        }
        self.deliver(ChannelUpdate::Event(event)).await
    }

    async fn pump(&mut self, mut stream: EventStream) -> Stop {
        loop {
            let item = tokio::select! {
                _ = self.stop.cancelled() => return Stop::Finished,
                item = stream.next() => item,
            };
            match item {
                Some(Ok(event)) => {
                    if !self.forward(event).await {
                        return Stop::Finished;
                    }
                }
                Some(Err(e)) => return Stop::Lost(e.into()),
                None => return Stop::Lost(LinkError::Closed),
            }
        }
    }

    /// Hands `update` to the subscriber. `false` means stop: cancelled or nobody is listening.
    async fn deliver(&self, update: ChannelUpdate) -> bool {
        tokio::select! {
            _ = self.stop.cancelled() => false,
            sent = self.updates.send(update) => sent.is_ok(),
        }
    }
}
