//! # Generic Actor Server
//!
//! This module defines the `ResourceActor`, the component that owns a collection of entities.
//! It implements the "Server" side of the Actor Model: requests are processed one at a time, so
//! the store needs no lock, and every mutation of a given entity is serialized.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// The generic actor that manages a collection of entities.
///
/// # Architecture Note
/// This struct is the "Server" half of the actor. It owns the state (`store`), the receiver end
/// of the request channel and the sending end of the change feed.
///
/// **Concurrency Model**: each actor processes its messages sequentially in a loop, so the store
/// is never shared and the order in which events reach the feed is the order in which they were
/// applied.
///
/// # Usage Pattern
///
/// 1.  **Create**: `ResourceActor::new()` returns the `actor` (server) and `client` (interface).
/// 2.  **Wire**: pass dependencies into `actor.run(context)`.
/// 3.  **Run**: spawn the run loop on a Tokio task.
///
/// ```rust
/// use actor_framework::{ActorEntity, ResourceActor};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Depot { id: u32, parcels: u32 }
/// #[derive(Debug)] struct DepotCreate;
/// #[derive(Debug)] enum DepotAction { Receive }
/// #[derive(Debug)] struct DepotError;
/// impl std::fmt::Display for DepotError {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "depot error") }
/// }
/// impl std::error::Error for DepotError {}
///
/// #[async_trait]
/// impl ActorEntity for Depot {
///     type Id = u32; type Create = DepotCreate; type Action = DepotAction;
///     type ActionResult = u32; type Filter = (); type Event = u32;
///     type Context = (); type Error = DepotError;
///
///     fn from_create_params(id: u32, _: DepotCreate) -> Result<Self, Self::Error> {
///         Ok(Self { id, parcels: 0 })
///     }
///     async fn handle_action(&mut self, _: DepotAction, _: &()) -> Result<u32, Self::Error> {
///         self.parcels += 1;
///         Ok(self.parcels)
///     }
///     fn matches(&self, _: &()) -> bool { true }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let mut next = 0;
///     let (actor, client) = ResourceActor::<Depot>::new(10, 16, move || { next += 1; next });
///     tokio::spawn(actor.run(()));
///
///     let id = client.create(DepotCreate).await.unwrap();
///     assert_eq!(client.perform_action(id, DepotAction::Receive).await.unwrap(), 1);
/// }
/// ```
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id: Box<dyn FnMut() -> T::Id + Send>,
    feed: broadcast::Sender<T::Event>,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// # Arguments
    ///
    /// * `buffer_size` - Capacity of the request channel. When full, client calls wait.
    /// * `feed_capacity` - Capacity of the broadcast change feed. Subscribers that fall further
    ///   behind than this observe a lag error and must resynchronise.
    /// * `next_id` - Id generator, called once per `Create` request.
    pub fn new(
        buffer_size: usize,
        feed_capacity: usize,
        next_id: impl FnMut() -> T::Id + Send + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (feed, _) = broadcast::channel(feed_capacity.max(1));
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id: Box::new(next_id),
            feed: feed.clone(),
        };
        let client = ResourceClient::new(sender, feed);
        (actor, client)
    }

    /// Runs the actor's event loop, processing messages until every client is dropped.
    ///
    /// The `context` argument is injected into every entity hook.
    pub async fn run(mut self, context: T::Context) {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    debug!(entity_type, ?params, "Create");
                    let id = (self.next_id)();
                    if self.store.contains_key(&id) {
                        warn!(entity_type, %id, "Generated id already in use");
                        let _ = respond_to.send(Err(FrameworkError::EntityError(
                            format!("duplicate id {id}").into(),
                        )));
                        continue;
                    }

                    match T::from_create_params(id.clone(), params) {
                        Ok(mut item) => {
                            if let Err(e) = item.on_create(&context).await {
                                warn!(entity_type, error = %e, "on_create failed");
                                let _ =
                                    respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                                continue;
                            }
                            let events = item.take_events();
                            self.store.insert(id.clone(), item);
                            self.publish(entity_type, events);
                            info!(entity_type, %id, size = self.store.len(), "Created");
                            let _ = respond_to.send(Ok(id));
                        }
                        Err(e) => {
                            warn!(entity_type, error = %e, "Create failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    debug!(entity_type, %id, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { filter, respond_to } => {
                    let items: Vec<T> = self
                        .store
                        .values()
                        .filter(|item| item.matches(&filter))
                        .cloned()
                        .collect();
                    debug!(entity_type, ?filter, matched = items.len(), "List");
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    let Some(item) = self.store.get_mut(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    let result = item.handle_action(action, &context).await;
                    let events = item.take_events();
                    match &result {
                        Ok(_) => info!(entity_type, %id, events = events.len(), "Action ok"),
                        Err(e) => warn!(entity_type, %id, error = %e, "Action failed"),
                    }
                    self.publish(entity_type, events);
                    let _ = respond_to
                        .send(result.map_err(|e| FrameworkError::EntityError(Box::new(e))));
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }

    fn publish(&self, entity_type: &str, events: Vec<T::Event>) {
        for event in events {
            // No subscribers is not an error: the feed is fire-and-forget.
            if self.feed.send(event).is_err() {
                debug!(entity_type, "Change feed has no subscribers");
            }
        }
    }
}
