//! # Tracking Backend
//!
//! The collaborator contract between the tracking core and whatever stores orders. It mirrors the
//! three read endpoints of the order service: snapshot, events since a sequence, and the paged
//! listing. [`OrderClient`](crate::clients::OrderClient) implements it over the in-process order
//! actor.

use crate::directory::{OrderFilter, PageRequest, PagedResult};
use crate::model::{OrderId, OrderSnapshot, OrderSummary, StatusEvent};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Backend did not answer within {0:?}")]
    Timeout(Duration),
}

impl BackendError {
    /// Whether asking again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Unavailable(_) | BackendError::Timeout(_))
    }
}

#[async_trait]
pub trait TrackingBackend: Send + Sync {
    /// Current authoritative timeline of one order.
    async fn snapshot(&self, order_id: &OrderId) -> Result<OrderSnapshot, BackendError>;

    /// Events of one order with a sequence strictly greater than `since`, ascending.
    async fn events_since(
        &self,
        order_id: &OrderId,
        since: u64,
    ) -> Result<Vec<StatusEvent>, BackendError>;

    /// Batched [`events_since`](Self::events_since) for several orders.
    ///
    /// Orders that no longer exist are skipped. Any other failure fails the whole batch.
    async fn backfill(
        &self,
        since: &HashMap<OrderId, u64>,
    ) -> Result<Vec<StatusEvent>, BackendError> {
        let mut events = Vec::new();
        for (order_id, sequence) in since {
            match self.events_since(order_id, *sequence).await {
                Ok(batch) => events.extend(batch),
                Err(BackendError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(events)
    }

    async fn query(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<PagedResult<OrderSummary>, BackendError>;
}
