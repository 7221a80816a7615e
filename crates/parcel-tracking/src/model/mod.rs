//! Plain data shared by every layer: statuses, events, orders and listing rows.

pub mod event;
pub mod order;
pub mod status;

pub use event::StatusEvent;
pub use order::{NewOrder, Order, OrderId, OrderSnapshot, OrderSummary, StatusUpdate};
pub use status::{is_valid_transition, OrderStatus, StatusCategory, UnknownStatus};
