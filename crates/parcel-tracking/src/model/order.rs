use crate::aggregator::Timeline;
use crate::model::{OrderStatus, StatusEvent};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Opaque order identifier, assigned at placement and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<&OrderId> for OrderId {
    fn from(id: &OrderId) -> Self {
        id.clone()
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parcel order as held by the order actor.
///
/// # Actor Framework
/// This struct implements the [`ActorEntity`](actor_framework::ActorEntity) trait,
/// allowing it to be managed by a [`ResourceActor`](actor_framework::ResourceActor).
///
/// See [`impl ActorEntity for Order`](#impl-ActorEntity-for-Order) for details on:
/// - Creation parameters ([`NewOrder`])
/// - Status recording ([`OrderAction`](crate::order_actor::OrderAction))
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub recipient: String,
    pub recipient_phone: String,
    pub destination_address: String,
    pub package_description: String,
    pub weight_kg: f64,
    pub declared_value: f64,
    pub special_instructions: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
    pub timeline: Timeline,
    /// Events accepted since the actor last drained them onto the change feed.
    pub(crate) unpublished: Vec<StatusEvent>,
}

/// Payload for placing a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub recipient: String,
    pub recipient_phone: String,
    pub destination_address: String,
    pub package_description: String,
    pub weight_kg: f64,
    pub declared_value: f64,
    #[serde(default)]
    pub special_instructions: Option<String>,
    #[serde(default)]
    pub estimated_delivery: Option<NaiveDate>,
    /// Placement time; the actor uses the current time when absent.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A milestone to record against an existing order. The backend assigns the sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: OrderStatus,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl StatusUpdate {
    pub fn new(status: OrderStatus) -> Self {
        Self {
            status,
            location: None,
            occurred_at: None,
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

/// Listing row for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub created_at: DateTime<Utc>,
    pub recipient: String,
    pub destination_address: String,
    pub current_status: OrderStatus,
    pub estimated_delivery: Option<NaiveDate>,
}

/// Authoritative timeline of one order as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    pub order_id: OrderId,
    pub timeline: Timeline,
    pub current_status: OrderStatus,
}

impl OrderSnapshot {
    pub fn max_sequence(&self) -> u64 {
        self.timeline.max_sequence()
    }
}

impl Order {
    pub fn current_status(&self) -> OrderStatus {
        self.timeline.current_status().unwrap_or(OrderStatus::INITIAL)
    }

    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            order_id: self.id.clone(),
            created_at: self.created_at,
            recipient: self.recipient.clone(),
            destination_address: self.destination_address.clone(),
            current_status: self.current_status(),
            estimated_delivery: self.estimated_delivery,
        }
    }

    pub fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            order_id: self.id.clone(),
            timeline: self.timeline.clone(),
            current_status: self.current_status(),
        }
    }

    /// Events with a sequence strictly greater than `since`, ascending.
    pub fn events_since(&self, since: u64) -> Vec<StatusEvent> {
        self.timeline
            .events()
            .iter()
            .filter(|event| event.sequence > since)
            .cloned()
            .collect()
    }
}
