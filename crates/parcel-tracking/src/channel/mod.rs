//! # Live Update Channel
//!
//! Delivers incremental status events for a set of orders to one subscriber.
//!
//! Each [`Subscription`] owns a background task that:
//!
//! 1. connects the [`Transport`] for the subscribed ids,
//! 2. asks the [`TrackingBackend`] for everything past the last delivered sequence of every order
//!    in one batched call,
//! 3. forwards events it has not delivered before, and
//! 4. on connection loss waits with capped exponential [`Backoff`] and starts over.
//!
//! After `max_reconnect_attempts` consecutive failures the subscriber receives
//! [`ChannelUpdate::Degraded`] and should fall back to polling. The task keeps trying;
//! [`ChannelUpdate::Recovered`] follows the first successful reconnect.
//!
//! Delivery is at least once from the transport's side and exactly once per sequence from the
//! subscriber's side. Events may still arrive out of sequence order; the timeline aggregator
//! deals with that.

pub mod backoff;
pub mod subscription;
pub mod tracker;
pub mod transport;

pub use backoff::Backoff;
pub use subscription::{Subscription, SubscriptionHandle};
pub use tracker::SequenceTracker;
pub use transport::{BroadcastTransport, EventStream, Transport, TransportError};

use crate::backend::TrackingBackend;
use crate::config::ChannelConfig;
use crate::model::{OrderId, StatusEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// What a subscriber receives.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelUpdate {
    Event(StatusEvent),
    /// The retry budget is spent. Live updates are paused until [`ChannelUpdate::Recovered`].
    Degraded { attempts: u32 },
    Recovered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Active,
    Degraded,
    Cancelled,
}

#[derive(Clone)]
pub struct LiveUpdateChannel {
    transport: Arc<dyn Transport>,
    backend: Arc<dyn TrackingBackend>,
    config: ChannelConfig,
    shutdown: CancellationToken,
    next_subscription: Arc<AtomicU64>,
}

impl LiveUpdateChannel {
    pub fn new(
        transport: Arc<dyn Transport>,
        backend: Arc<dyn TrackingBackend>,
        config: ChannelConfig,
    ) -> Self {
        Self {
            transport,
            backend,
            config,
            shutdown: CancellationToken::new(),
            next_subscription: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Subscribes to the orders named in `from_sequence`.
    ///
    /// Only events with a sequence above the given one are delivered for each order. Must be
    /// called within a Tokio runtime.
    pub fn subscribe(&self, from_sequence: HashMap<OrderId, u64>) -> Subscription {
        self.subscribe_within(from_sequence, &self.shutdown)
    }

    /// Like [`subscribe`](Self::subscribe), but cancelling `parent` also stops the subscription.
    ///
    /// Channel shutdown still applies.
    pub fn subscribe_within(
        &self,
        from_sequence: HashMap<OrderId, u64>,
        parent: &CancellationToken,
    ) -> Subscription {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        info!(subscription = id, orders = from_sequence.len(), "Subscribing");
        Subscription::spawn(
            id,
            parent.child_token(),
            self.shutdown.clone(),
            self.transport.clone(),
            self.backend.clone(),
            &self.config,
            SequenceTracker::new(&from_sequence),
        )
    }

    /// Stops the subscription `handle` belongs to. Idempotent.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) {
        handle.cancel();
    }

    /// Cancels every subscription created by this channel.
    pub fn shutdown(&self) {
        info!("Shutting down live update channel");
        self.shutdown.cancel();
    }
}
