use crate::model::{OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded milestone of an order.
///
/// `sequence` is the only ordering key. It starts at 1 for the initial `Confirmed` event and
/// increases by one per accepted event. `occurred_at` is for display and may be skewed or
/// missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub occurred_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub sequence: u64,
}

impl StatusEvent {
    pub fn new(order_id: impl Into<OrderId>, sequence: u64, status: OrderStatus) -> Self {
        Self {
            order_id: order_id.into(),
            status,
            occurred_at: None,
            location: None,
            sequence,
        }
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    pub fn located(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}
