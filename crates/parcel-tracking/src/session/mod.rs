//! # Tracking Session
//!
//! One client's live view of one order.
//!
//! ```text
//! Initializing ──snapshot──▶ Live ◀──recovered── Degraded
//!      │                      │  └──degraded──────▲
//!      └──retries spent──▶ Unavailable ◀──channel closed── Live / Degraded
//!
//! any state ──cancel()──▶ Cancelled
//! ```
//!
//! A session fetches the order's snapshot (bounded retries, each with a timeout), then follows
//! the [`LiveUpdateChannel`] from the snapshot's last sequence. Every event goes through a
//! [`TimelineAggregator`], so duplicates and reordering never reach the view. While the channel
//! is degraded the session polls the snapshot instead. Once the order reaches a terminal status
//! the subscription is released and the view keeps the final timeline.
//!
//! The view is published through a [`watch`] channel; [`TrackingSession::watch`] lets a
//! presentation layer await changes.

use crate::aggregator::{IngestOutcome, Timeline, TimelineAggregator};
use crate::backend::{BackendError, TrackingBackend};
use crate::channel::{ChannelUpdate, LiveUpdateChannel};
use crate::config::SessionConfig;
use crate::model::{OrderId, OrderSnapshot, OrderStatus, StatusEvent};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Live,
    /// Live updates are down; the snapshot is polled instead.
    Degraded,
    /// The snapshot could not be fetched, or the channel closed. No further updates will arrive.
    Unavailable,
    Cancelled,
}

/// Conditions surfaced to the user alongside the view.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackingError {
    #[error("Tracking unavailable for order {order_id} after {attempts} attempt(s): {reason}")]
    TrackingUnavailable {
        order_id: OrderId,
        attempts: u32,
        reason: String,
    },
    #[error("Live updates interrupted after {attempts} reconnect attempt(s)")]
    TransportDegraded { attempts: u32 },
    /// The live update channel shut down before the order reached a final status.
    #[error("Live updates for order {order_id} have stopped")]
    UpdatesClosed { order_id: OrderId },
}

/// What the presentation layer renders for one order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingView {
    pub order_id: OrderId,
    /// `None` until the first snapshot arrives.
    pub status: Option<OrderStatus>,
    pub timeline: Timeline,
    pub last_update: Option<DateTime<Utc>>,
    pub session_state: SessionState,
    pub notice: Option<TrackingError>,
}

impl TrackingView {
    fn initializing(order_id: OrderId) -> Self {
        Self {
            timeline: Timeline::new(order_id.clone()),
            order_id,
            status: None,
            last_update: None,
            session_state: SessionState::Initializing,
            notice: None,
        }
    }

    /// The newest `n` events, newest first.
    pub fn recent_updates(&self, n: usize) -> Vec<&StatusEvent> {
        self.timeline.events().iter().rev().take(n).collect()
    }

    fn show(&mut self, timeline: &Timeline) {
        self.status = timeline.current_status();
        self.last_update = timeline.last_update();
        self.timeline = timeline.clone();
    }
}

pub struct TrackingSession {
    order_id: OrderId,
    view: Arc<watch::Sender<TrackingView>>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TrackingSession {
    /// Starts tracking `order_id` in a background task. Must be called within a Tokio runtime.
    pub fn start(
        order_id: impl Into<OrderId>,
        backend: Arc<dyn TrackingBackend>,
        channel: LiveUpdateChannel,
        config: SessionConfig,
    ) -> Self {
        let order_id = order_id.into();
        let (view, _) = watch::channel(TrackingView::initializing(order_id.clone()));
        let view = Arc::new(view);
        let token = CancellationToken::new();

        let span = info_span!("tracking_session", order_id = %order_id);
        let worker = SessionWorker {
            order_id: order_id.clone(),
            backend,
            channel,
            config,
            view: view.clone(),
            token: token.clone(),
        };
        let task = tokio::spawn(worker.run().instrument(span));

        Self {
            order_id,
            view,
            token,
            task: Some(task),
        }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn current_view(&self) -> TrackingView {
        self.view.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.view.borrow().session_state
    }

    /// Receiver that is notified on every view change.
    pub fn watch(&self) -> watch::Receiver<TrackingView> {
        self.view.subscribe()
    }

    /// Stops the session and releases its subscription. Idempotent, valid in every state.
    ///
    /// The view reports [`SessionState::Cancelled`] as soon as this returns.
    pub fn cancel(&self) {
        self.token.cancel();
        let cancelled = self.view.send_if_modified(|view| {
            if view.session_state == SessionState::Cancelled {
                return false;
            }
            view.session_state = SessionState::Cancelled;
            view.notice = None;
            true
        });
        if cancelled {
            info!(order_id = %self.order_id, "Tracking cancelled");
        }
    }

    /// Waits for the background task to stop, without cancelling it.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.cancel();
        }
    }
}

struct SessionWorker {
    order_id: OrderId,
    backend: Arc<dyn TrackingBackend>,
    channel: LiveUpdateChannel,
    config: SessionConfig,
    view: Arc<watch::Sender<TrackingView>>,
    token: CancellationToken,
}

impl SessionWorker {
    async fn run(self) {
        let fetched = tokio::select! {
            _ = self.token.cancelled() => return,
            fetched = self.fetch_snapshot() => fetched,
        };
        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(error = %error, "Giving up on tracking");
                self.publish(|view| {
                    view.session_state = SessionState::Unavailable;
                    view.notice = Some(error);
                });
                return;
            }
        };

        let mut aggregator =
            TimelineAggregator::from_timeline(snapshot.timeline, self.config.reorder_buffer);
        self.publish(|view| {
            view.show(aggregator.timeline());
            view.session_state = SessionState::Live;
        });
        info!(
            status = ?aggregator.timeline().current_status(),
            sequence = aggregator.timeline().max_sequence(),
            "Tracking live"
        );
        if aggregator.timeline().is_terminal() {
            debug!("Order already final, not subscribing");
            return;
        }

        let mut subscription = self.channel.subscribe_within(
            HashMap::from([(self.order_id.clone(), aggregator.timeline().max_sequence())]),
            &self.token,
        );
        let mut poll: Option<Interval> = None;

        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                update = subscription.next() => match update {
                    Some(ChannelUpdate::Event(event)) => self.ingest(&mut aggregator, event),
                    Some(ChannelUpdate::Degraded { attempts }) => {
                        warn!(attempts, "Falling back to polling");
                        poll = Some(self.poll_timer());
                        self.publish(|view| {
                            view.session_state = SessionState::Degraded;
                            view.notice = Some(TrackingError::TransportDegraded { attempts });
                        });
                    }
                    Some(ChannelUpdate::Recovered) => {
                        info!("Live updates restored");
                        poll = None;
                        self.publish(|view| {
                            view.session_state = SessionState::Live;
                            view.notice = None;
                        });
                    }
                    None if self.token.is_cancelled() => break,
                    None => {
                        warn!("Live update channel closed");
                        let order_id = self.order_id.clone();
                        self.publish(|view| {
                            view.session_state = SessionState::Unavailable;
                            view.notice = Some(TrackingError::UpdatesClosed { order_id });
                        });
                        break;
                    }
                },
                _ = next_tick(&mut poll) => {
                    let polled = tokio::select! {
                        _ = self.token.cancelled() => break,
                        polled = self.snapshot_once() => polled,
                    };
                    match polled {
                        Ok(snapshot) => self.reconcile(&mut aggregator, &snapshot),
                        Err(e) => warn!(error = %e, "Snapshot poll failed"),
                    }
                }
            }

            if aggregator.timeline().is_terminal() {
                info!(status = ?aggregator.timeline().current_status(), "Order reached final status");
                self.publish(|view| {
                    view.session_state = SessionState::Live;
                    view.notice = None;
                });
                break;
            }
        }

        subscription.cancel();
        debug!("Session task finished");
    }

    /// Initial snapshot with bounded retries. A missing order is not retried.
    async fn fetch_snapshot(&self) -> Result<OrderSnapshot, TrackingError> {
        let attempts = self.config.snapshot_attempts.max(1);
        let backoff = self.config.snapshot_backoff();
        let mut attempt = 1;

        loop {
            let error = match self.snapshot_once().await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) => e,
            };
            if attempt >= attempts || !error.is_retryable() {
                return Err(TrackingError::TrackingUnavailable {
                    order_id: self.order_id.clone(),
                    attempts: attempt,
                    reason: error.to_string(),
                });
            }
            let delay = backoff.delay(attempt);
            warn!(error = %error, attempt, ?delay, "Snapshot fetch failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn snapshot_once(&self) -> Result<OrderSnapshot, BackendError> {
        let timeout = self.config.snapshot_timeout();
        match tokio::time::timeout(timeout, self.backend.snapshot(&self.order_id)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(timeout)),
        }
    }

    fn ingest(&self, aggregator: &mut TimelineAggregator, event: StatusEvent) {
        let sequence = event.sequence;
        match aggregator.ingest(event) {
            Ok(IngestOutcome::Applied { count }) => {
                debug!(sequence, count, "Timeline advanced");
                self.publish(|view| view.show(aggregator.timeline()));
            }
            Ok(IngestOutcome::Stale) => debug!(sequence, "Ignoring stale event"),
            Ok(IngestOutcome::Deferred) => debug!(sequence, "Waiting for earlier events"),
            Err(e) => warn!(error = %e, "Dropping invalid event"),
        }
    }

    fn reconcile(&self, aggregator: &mut TimelineAggregator, snapshot: &OrderSnapshot) {
        let applied = aggregator.reconcile(&snapshot.timeline);
        if applied > 0 {
            debug!(applied, "Timeline caught up from snapshot");
            self.publish(|view| view.show(aggregator.timeline()));
        }
    }

    fn poll_timer(&self) -> Interval {
        let mut timer = tokio::time::interval(self.config.poll_interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer
    }

    /// Applies `change` unless the session was cancelled in the meantime.
    fn publish(&self, change: impl FnOnce(&mut TrackingView)) {
        self.view.send_if_modified(|view| {
            if view.session_state == SessionState::Cancelled {
                return false;
            }
            change(view);
            true
        });
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}
