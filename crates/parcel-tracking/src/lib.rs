//! # Parcel Tracking
//!
//! Order lifecycle and status tracking for a parcel logistics portal.
//!
//! ## Core Components
//!
//! - **[model]**: the [`OrderStatus`](model::OrderStatus) state machine, status events and order
//!   records.
//! - **[aggregator]**: merges status events into a [`Timeline`](aggregator::Timeline), tolerating
//!   duplicates and reordering.
//! - **[directory]**: filtering, sorting and pagination of order listings.
//! - **[channel]**: the [`LiveUpdateChannel`](channel::LiveUpdateChannel) with reconnect, backoff
//!   and backfill.
//! - **[session]**: a [`TrackingSession`](session::TrackingSession) per tracked order.
//!
//! ## Reference Backend
//!
//! - **[order_actor]**: an in-memory order store built on
//!   [`ResourceActor`](actor_framework::ResourceActor).
//! - **[clients]**: [`OrderClient`](clients::OrderClient), which also implements
//!   [`TrackingBackend`](backend::TrackingBackend).
//! - **[lifecycle]**: [`TrackingSystem`](lifecycle::TrackingSystem) wires it all together.
//!
//! ## Testing
//!
//! See [`actor_framework::mock`] for utilities to test clients without spawning full actors, and
//! [`fixtures`] for the 42-order sample set.

pub mod aggregator;
pub mod backend;
pub mod channel;
pub mod clients;
pub mod config;
pub mod directory;
pub mod fixtures;
pub mod lifecycle;
pub mod model;
pub mod order_actor;
pub mod session;
