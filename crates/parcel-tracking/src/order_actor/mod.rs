//! # Order Actor
//!
//! The in-process reference backend: one [`ResourceActor`] owns every [`Order`], applies status
//! events through the timeline rules and publishes each accepted event on its change feed.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`Order`]
//! - [`error`] - [`OrderError`] type for type-safe error handling
//! - [`actions`] - [`OrderAction`] for status recording and cancellation
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Usage
//!
//! ```rust
//! use parcel_tracking::clients::OrderClient;
//! use parcel_tracking::config::OrdersConfig;
//! use parcel_tracking::model::{NewOrder, OrderStatus, StatusUpdate};
//! use parcel_tracking::order_actor;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (actor, generic_client) = order_actor::new(&OrdersConfig::default());
//!     let client = OrderClient::new(generic_client, 100);
//!     tokio::spawn(actor.run(()));
//!
//!     let id = client
//!         .place_order(NewOrder {
//!             recipient: "Marta Silva".into(),
//!             recipient_phone: "+351 910 000 000".into(),
//!             destination_address: "Av. da Liberdade 1, Lisboa".into(),
//!             package_description: "Books".into(),
//!             weight_kg: 2.0,
//!             declared_value: 40.0,
//!             special_instructions: None,
//!             estimated_delivery: None,
//!             created_at: None,
//!         })
//!         .await?;
//!
//!     let event = client
//!         .record_status(&id, StatusUpdate::new(OrderStatus::PickedUp))
//!         .await?;
//!     assert_eq!(event.sequence, 2);
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::config::OrdersConfig;
use crate::model::{Order, OrderId};
use actor_framework::{ResourceActor, ResourceClient};

/// Creates a new Order actor and its client.
///
/// Ids are `<prefix><n>` with `n` counting up from `config.id_start`.
pub fn new(config: &OrdersConfig) -> (ResourceActor<Order>, ResourceClient<Order>) {
    let prefix = config.id_prefix.clone();
    let mut next = config.id_start;
    let next_order_id = move || {
        let id = OrderId::from(format!("{prefix}{next}"));
        next += 1;
        id
    };
    ResourceActor::new(config.mailbox_size, config.feed_capacity, next_order_id)
}
