//! # System Lifecycle
//!
//! Starts the in-process order actor and wires everything that depends on it:
//!
//! ```text
//! order actor ──ResourceClient──▶ OrderClient ──┬──▶ TrackingBackend (snapshots, backfill, queries)
//!      │                                         └──▶ BroadcastTransport
//!      └── change feed ─────────────────────────────────▲
//!                                                       LiveUpdateChannel ──▶ TrackingSession
//! ```
//!
//! ## Graceful Shutdown
//!
//! 1. Cancel every live subscription through the channel's shutdown token
//! 2. Drop the system's clients, closing the actor's request queue
//! 3. Await the actor task
//!
//! Session tasks hold client clones too. Each one ends when its subscription is cancelled in step 1
//! (or, if it is still fetching the snapshot, right after subscribing), so the actor stops once the
//! last of them has finished.

use crate::backend::TrackingBackend;
use crate::channel::{BroadcastTransport, LiveUpdateChannel};
use crate::clients::OrderClient;
use crate::config::TrackingConfig;
use crate::model::OrderId;
use crate::order_actor;
use crate::session::TrackingSession;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

pub struct TrackingSystem {
    pub order_client: OrderClient,
    pub channel: LiveUpdateChannel,
    config: TrackingConfig,
    handles: Vec<JoinHandle<()>>,
}

impl TrackingSystem {
    /// Spawns the order actor. Must be called within a Tokio runtime.
    pub fn new(config: TrackingConfig) -> Self {
        let (order_actor, order_resource) = order_actor::new(&config.orders);
        let order_handle = tokio::spawn(order_actor.run(()));

        let order_client = OrderClient::new(order_resource, config.directory.max_page_size);
        let backend: Arc<dyn TrackingBackend> = Arc::new(order_client.clone());
        let transport = Arc::new(BroadcastTransport::new(order_client.clone()));
        let channel = LiveUpdateChannel::new(transport, backend, config.channel.clone());

        info!(id_prefix = %config.orders.id_prefix, "Tracking system started");
        Self {
            order_client,
            channel,
            config,
            handles: vec![order_handle],
        }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Opens a tracking session for `order_id` against the in-process backend.
    pub fn track(&self, order_id: impl Into<OrderId>) -> TrackingSession {
        TrackingSession::start(
            order_id,
            Arc::new(self.order_client.clone()),
            self.channel.clone(),
            self.config.session.clone(),
        )
    }

    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down tracking system");
        self.channel.shutdown();

        // The channel holds client clones through its transport and backend.
        drop(self.channel);
        drop(self.order_client);

        for handle in self.handles {
            handle.await.map_err(|e| e.to_string())?;
        }
        info!("Tracking system stopped");
        Ok(())
    }
}
