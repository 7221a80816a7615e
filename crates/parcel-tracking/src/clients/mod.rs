//! # Clients
//!
//! Type-safe wrappers around the generic [`ResourceClient`](actor_framework::ResourceClient).

pub mod order_client;

pub use order_client::OrderClient;
