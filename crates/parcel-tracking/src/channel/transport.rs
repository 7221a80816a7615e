//! The transport seam of the live update channel.
//!
//! A [`Transport`] turns a set of order ids into a stream of raw, possibly duplicated and
//! reordered events. It does not resume or de-duplicate; the channel does that on top.

use crate::clients::OrderClient;
use crate::model::{OrderId, StatusEvent};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{future, StreamExt};
use std::collections::HashSet;
use thiserror::Error;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

pub type EventStream = BoxStream<'static, Result<StatusEvent, TransportError>>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connect failed: {0}")]
    ConnectFailed(String),
    #[error("Connection lost: {0}")]
    Disconnected(String),
    /// The consumer fell behind and `n` events were skipped.
    #[error("Subscriber lagged behind by {0} events")]
    Lagged(u64),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a stream carrying events for `order_ids`. An `Err` item or the end of the stream
    /// means the connection is gone.
    async fn connect(&self, order_ids: &HashSet<OrderId>) -> Result<EventStream, TransportError>;
}

/// In-process transport over the order actor's change feed.
#[derive(Clone)]
pub struct BroadcastTransport {
    client: OrderClient,
}

impl BroadcastTransport {
    pub fn new(client: OrderClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for BroadcastTransport {
    async fn connect(&self, order_ids: &HashSet<OrderId>) -> Result<EventStream, TransportError> {
        let wanted = order_ids.clone();
        let stream = BroadcastStream::new(self.client.subscribe())
            .filter_map(move |item| {
                future::ready(match item {
                    Ok(event) if wanted.contains(&event.order_id) => Some(Ok(event)),
                    Ok(_) => None,
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        Some(Err(TransportError::Lagged(skipped)))
                    }
                })
            })
            .boxed();
        Ok(stream)
    }
}
