//! # ActorEntity Trait
//!
//! The `ActorEntity` trait is the contract a resource (an order, a depot, a courier, ...) implements
//! to be owned by a [`ResourceActor`](crate::ResourceActor). It names the types used for ids,
//! creation payloads, actions, list filters and change-feed events, and provides the hooks the
//! actor calls while processing requests.
//!
//! # Change Feed
//! Entities record domain events while they mutate (for example "status moved to InTransit").
//! After every successful create or action the actor calls [`ActorEntity::take_events`] and
//! publishes whatever was recorded on its broadcast feed. Subscribers see events in the order the
//! actor applied them, because the actor is the only writer.
//!
//! # Provided Methods (Hooks)
//! - [`ActorEntity::on_create`]
//! - [`ActorEntity::take_events`]
//!
//! Both default to doing nothing.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any resource entity must implement to be managed by ResourceActor.
///
/// # Async & Context
/// This trait is `#[async_trait]` so hooks can await other actors. The `Context` type is injected
/// into every hook when the actor starts running ("late binding" of dependencies through
/// `run()` rather than `new()`).
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The unique identifier for this entity. Ids are produced by the generator handed to
    /// [`ResourceActor::new`](crate::ResourceActor::new).
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// Enum representing resource-specific operations (e.g., `RecordStatus`).
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// Criteria evaluated by [`ActorEntity::matches`] when serving a `List` request.
    type Filter: Send + Sync + Debug;

    /// Domain event published on the actor's change feed.
    type Event: Clone + Send + Sync + Debug + 'static;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    /// The error type for this entity.
    ///
    /// One error enum per actor rather than one per action. Callers match on a single type and
    /// the client layer can downcast it back out of [`FrameworkError::EntityError`](crate::FrameworkError::EntityError).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full Entity from the ID and Payload.
    /// This is called synchronously before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Called after the entity is constructed and before it is stored.
    /// An error here discards the entity and any events it recorded.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handle a custom resource-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;

    /// Whether this entity belongs in the result of a `List` request.
    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Drains the events recorded since the last call.
    fn take_events(&mut self) -> Vec<Self::Event> {
        Vec::new()
    }
}
