//! # ActorClient Trait
//!
//! Provides a common interface for resource-specific clients, adding default `get` and `list`
//! methods built on top of a generic `ResourceClient`.
use crate::{ActorEntity, FrameworkError, ResourceClient};
use async_trait::async_trait;

/// Trait for resource-specific clients to inherit the standard read operations.
///
/// # Example
///
/// ```rust
/// use actor_framework::{ActorClient, ActorEntity, FrameworkError, ResourceClient};
/// use async_trait::async_trait;
///
/// // 1. Define Entity
/// #[derive(Clone, Debug)]
/// struct Courier { id: u32, active: bool }
/// #[derive(Debug)] struct CourierCreate;
/// #[derive(Debug)] enum CourierAction {}
/// #[derive(Debug)] struct CourierError(String);
///
/// impl std::fmt::Display for CourierError {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "{}", self.0)
///     }
/// }
/// impl std::error::Error for CourierError {}
///
/// #[async_trait]
/// impl ActorEntity for Courier {
///     type Id = u32;
///     type Create = CourierCreate;
///     type Action = CourierAction;
///     type ActionResult = ();
///     type Filter = bool;
///     type Event = ();
///     type Context = ();
///     type Error = CourierError;
///
///     fn from_create_params(id: u32, _: CourierCreate) -> Result<Self, Self::Error> {
///         Ok(Self { id, active: true })
///     }
///     async fn handle_action(&mut self, _: CourierAction, _: &()) -> Result<(), Self::Error> { Ok(()) }
///     fn matches(&self, active: &bool) -> bool { self.active == *active }
/// }
///
/// // 2. Define Client Wrapper
/// struct CourierClient {
///     inner: ResourceClient<Courier>,
/// }
///
/// // 3. Implement ActorClient
/// impl ActorClient<Courier> for CourierClient {
///     type Error = CourierError;
///
///     fn inner(&self) -> &ResourceClient<Courier> {
///         &self.inner
///     }
///
///     fn map_error(e: FrameworkError) -> Self::Error {
///         CourierError(e.to_string())
///     }
/// }
///
/// // 4. Usage
/// async fn usage(client: CourierClient) {
///     // get() and list() are provided automatically!
///     let _ = client.get(1).await;
///     let _ = client.list(true).await;
/// }
/// ```
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the specific resource error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch an entity by ID.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Fetch every entity matching `filter`.
    #[tracing::instrument(skip(self))]
    async fn list(&self, filter: T::Filter) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().list(filter).await.map_err(Self::map_error)
    }
}
