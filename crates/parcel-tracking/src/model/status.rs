//! Delivery states and the transition rules between them.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Where an order is in its delivery lifecycle.
///
/// Declaration order is the expected forward progression. `Failed` and `Cancelled` are terminal
/// deviations reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrderStatus {
    Confirmed,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Failed,
    Cancelled,
}

/// Coarse grouping used by listing screens ("Pending", "In Transit", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCategory {
    Pending,
    InTransit,
    Delivered,
    Failed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Confirmed,
        OrderStatus::PickedUp,
        OrderStatus::InTransit,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Failed,
        OrderStatus::Cancelled,
    ];

    /// The only status an order may start in.
    pub const INITIAL: OrderStatus = OrderStatus::Confirmed;

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Failed | OrderStatus::Cancelled
        )
    }

    /// The next milestone on the happy path, if any.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Confirmed => Some(OrderStatus::PickedUp),
            OrderStatus::PickedUp => Some(OrderStatus::InTransit),
            OrderStatus::InTransit => Some(OrderStatus::OutForDelivery),
            OrderStatus::OutForDelivery => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Failed | OrderStatus::Cancelled => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::PickedUp => "Picked Up",
            OrderStatus::InTransit => "In Transit",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Failed => "Failed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn category(self) -> StatusCategory {
        match self {
            OrderStatus::Confirmed => StatusCategory::Pending,
            OrderStatus::PickedUp | OrderStatus::InTransit | OrderStatus::OutForDelivery => {
                StatusCategory::InTransit
            }
            OrderStatus::Delivered => StatusCategory::Delivered,
            OrderStatus::Failed | OrderStatus::Cancelled => StatusCategory::Failed,
        }
    }
}

/// Whether an order may move from `from` to `to`.
///
/// Forward moves are one milestone at a time. Any non-terminal status may move to `Failed` or
/// `Cancelled`. Nothing leaves a terminal status, and a status never transitions to itself.
pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    if from.is_terminal() {
        return false;
    }
    match to {
        OrderStatus::Failed | OrderStatus::Cancelled => true,
        _ => from.next() == Some(to),
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatusCategory::Pending => "Pending",
            StatusCategory::InTransit => "In Transit",
            StatusCategory::Delivered => "Delivered",
            StatusCategory::Failed => "Failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    /// Accepts the variant name or the display label, ignoring case, spaces, `_` and `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        OrderStatus::ALL
            .into_iter()
            .find(|status| format!("{status:?}").to_lowercase() == wanted)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
