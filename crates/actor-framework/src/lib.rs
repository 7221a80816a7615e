//! # Actor Framework
//!
//! Building blocks for type-safe, concurrent actor systems. It implements a
//! **Resource-Oriented Architecture (ROA)** on top of the **Actor Model**: every resource type
//! (orders, depots, couriers) is owned by exactly one actor task and is reached only through
//! messages.
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into three layers:
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - Your business logic and domain models
//! 2. **Runtime Layer** ([`ResourceActor`]) - Message processing and concurrency
//! 3. **Interface Layer** ([`ResourceClient`]) - Type-safe communication
//!
//! Every resource gets the same uniform surface: `create`, `get`, `list` (with an entity-defined
//! filter) and `perform_action` for resource-specific mutations. On top of that each actor owns a
//! **change feed**, a broadcast channel carrying the domain events its entities record.
//! Subscribers observe those events in the exact order the actor applied them.
//!
//! ## Context Injection Pattern
//!
//! Dependencies are injected at **runtime** via the `run()` method, not at construction time:
//!
//! ```rust
//! use actor_framework::{ActorEntity, ResourceActor, ResourceClient};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)] struct Courier { id: u32 }
//! #[derive(Debug)] struct CourierCreate;
//! #[derive(Debug)] enum CourierAction {}
//! #[derive(Debug, thiserror::Error)] #[error("courier error")] struct CourierError;
//!
//! #[async_trait]
//! impl ActorEntity for Courier {
//!     type Id = u32; type Create = CourierCreate; type Action = CourierAction;
//!     type ActionResult = (); type Filter = (); type Event = ();
//!     type Context = (); type Error = CourierError;
//!     fn from_create_params(id: u32, _: CourierCreate) -> Result<Self, Self::Error> { Ok(Self { id }) }
//!     async fn handle_action(&mut self, _: CourierAction, _: &()) -> Result<(), Self::Error> { Ok(()) }
//!     fn matches(&self, _: &()) -> bool { true }
//! }
//!
//! #[derive(Clone, Debug)] struct Parcel { id: u32, courier: u32 }
//! #[derive(Debug)] struct ParcelCreate { courier: u32 }
//! #[derive(Debug)] enum ParcelAction {}
//! #[derive(Debug, thiserror::Error)] #[error("unknown courier")] struct ParcelError;
//!
//! #[async_trait]
//! impl ActorEntity for Parcel {
//!     type Id = u32; type Create = ParcelCreate; type Action = ParcelAction;
//!     type ActionResult = (); type Filter = (); type Event = ();
//!     // Parcels check their courier through the courier actor's client
//!     type Context = ResourceClient<Courier>; type Error = ParcelError;
//!
//!     fn from_create_params(id: u32, p: ParcelCreate) -> Result<Self, Self::Error> {
//!         Ok(Self { id, courier: p.courier })
//!     }
//!     async fn on_create(&mut self, couriers: &ResourceClient<Courier>) -> Result<(), Self::Error> {
//!         match couriers.get(self.courier).await {
//!             Ok(Some(_)) => Ok(()),
//!             _ => Err(ParcelError),
//!         }
//!     }
//!     async fn handle_action(&mut self, _: ParcelAction, _: &ResourceClient<Courier>) -> Result<(), Self::Error> { Ok(()) }
//!     fn matches(&self, _: &()) -> bool { true }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut courier_ids = 0;
//!     let mut parcel_ids = 100;
//!     let (courier_actor, couriers) = ResourceActor::<Courier>::new(10, 16, move || { courier_ids += 1; courier_ids });
//!     let (parcel_actor, parcels) = ResourceActor::<Parcel>::new(10, 16, move || { parcel_ids += 1; parcel_ids });
//!
//!     tokio::spawn(courier_actor.run(()));
//!     tokio::spawn(parcel_actor.run(couriers.clone()));
//!
//!     let courier = couriers.create(CourierCreate).await.unwrap();
//!     assert!(parcels.create(ParcelCreate { courier }).await.is_ok());
//!     assert!(parcels.create(ParcelCreate { courier: 42 }).await.is_err());
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! - Each actor runs in its own Tokio task
//! - Messages are processed **sequentially** within an actor (no locks needed)
//! - Multiple actors run in **parallel**
//!
//! ## Testing
//!
//! The [`mock`] module provides `MockClient`, which answers a real `ResourceClient<T>` from
//! scripted expectations, plus raw channel helpers for asserting on individual requests.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod tracing;

// Re-export core types for convenience
pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
