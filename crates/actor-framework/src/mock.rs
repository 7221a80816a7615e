//! # Mock Framework & Testing Guide
//!
//! The `MockClient<T>` type hands out a real `ResourceClient<T>` whose requests are answered from
//! a queue of expectations instead of an actor. It lets you script return values (and errors) for
//! unit tests of client wrappers without spawning any actors.
//!
//! ## When to use Mocks vs Real Actors
//!
//! | Feature | MockClient | Real Actor |
//! |---------|------------|------------|
//! | **Speed** | Instant (in-memory) | Fast (but involves tokio spawn) |
//! | **State** | No real state (expectations) | Real state management |
//! | **Use Case** | Logic *around* the client | The actor itself or the full system |
//! | **Error Injection** | Easy (`return_err`) | Hard (requires specific state) |
//! | **Change Feed** | Scripted with [`MockClient::emit`] | Driven by entity events |
//!
//! ## Example
//!
//! ```rust
//! use actor_framework::mock::MockClient;
//! use actor_framework::ActorEntity;
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Depot { id: u32, city: String }
//! #[derive(Debug)] struct DepotCreate { city: String }
//! #[derive(Debug)] enum DepotAction {}
//! #[derive(Debug, thiserror::Error)] #[error("depot error")] struct DepotError;
//!
//! #[async_trait]
//! impl ActorEntity for Depot {
//!     type Id = u32; type Create = DepotCreate; type Action = DepotAction;
//!     type ActionResult = (); type Filter = (); type Event = String;
//!     type Context = (); type Error = DepotError;
//!     fn from_create_params(id: u32, params: DepotCreate) -> Result<Self, Self::Error> {
//!         Ok(Self { id, city: params.city })
//!     }
//!     async fn handle_action(&mut self, _: DepotAction, _: &()) -> Result<(), Self::Error> { Ok(()) }
//!     fn matches(&self, _: &()) -> bool { true }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockClient::<Depot>::new();
//!     mock.expect_get(7).return_ok(Some(Depot { id: 7, city: "Lyon".into() }));
//!
//!     let client = mock.client();
//!     let depot = client.get(7).await.unwrap();
//!     assert_eq!(depot.unwrap().city, "Lyon");
//!     mock.verify();
//! }
//! ```
//!
//! ## Mocking Utilities
//!
//! Use [`create_mock_client`] to get a client and the raw request receiver, or use the fluent
//! [`MockClient`] API.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::{ResourceRequest, Response};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, mpsc};

const MOCK_FEED_CAPACITY: usize = 64;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// A scripted answer to the next request.
enum Expectation<T: ActorEntity> {
    Get {
        id: T::Id,
        response: Result<Option<T>, FrameworkError>,
    },
    Create {
        response: Result<T::Id, FrameworkError>,
    },
    List {
        response: Result<Vec<T>, FrameworkError>,
    },
    Action {
        id: T::Id,
        response: Result<T::ActionResult, FrameworkError>,
    },
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

fn lock<T: ActorEntity>(queue: &Queue<T>) -> MutexGuard<'_, VecDeque<Expectation<T>>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A mock client with expectation tracking for fluent testing.
///
/// Expectations are consumed in the order they were registered. A request that does not match
/// the next expectation (wrong kind or wrong id) panics the background task, which surfaces in
/// the test as [`FrameworkError::ActorDropped`].
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Queue<T>,
    feed: broadcast::Sender<T::Event>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let (feed, _) = broadcast::channel(MOCK_FEED_CAPACITY);
        let expectations: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let queue = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = lock(&queue).pop_front();

                match (request, expectation) {
                    (
                        ResourceRequest::Get { id, respond_to },
                        Some(Expectation::Get {
                            id: expected,
                            response,
                        }),
                    ) if id == expected => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Create { respond_to, .. },
                        Some(Expectation::Create { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::List { respond_to, .. },
                        Some(Expectation::List { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Action { id, respond_to, .. },
                        Some(Expectation::Action {
                            id: expected,
                            response,
                        }),
                    ) if id == expected => {
                        let _ = respond_to.send(response);
                    }
                    _ => {
                        panic!("Unexpected request or expectation mismatch");
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender, feed.clone()),
            expectations,
            feed,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    /// Expects a `get` operation.
    pub fn expect_get(&mut self, id: T::Id) -> GetExpectationBuilder<T> {
        GetExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `create` operation.
    pub fn expect_create(&mut self) -> CreateExpectationBuilder<T> {
        CreateExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `list` operation.
    pub fn expect_list(&mut self) -> ListExpectationBuilder<T> {
        ListExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Expects an `action` operation.
    pub fn expect_action(&mut self, id: T::Id) -> ActionExpectationBuilder<T> {
        ActionExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    /// Publishes `event` on the change feed, as an entity would after a mutation.
    pub fn emit(&self, event: T::Event) {
        let _ = self.feed.send(event);
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = lock(&self.expectations).len();
        if remaining > 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }
}

/// Builder for `get` expectations.
pub struct GetExpectationBuilder<T: ActorEntity> {
    id: T::Id,
    expectations: Queue<T>,
}

impl<T: ActorEntity> GetExpectationBuilder<T> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: Option<T>) {
        lock(&self.expectations).push_back(Expectation::Get {
            id: self.id,
            response: Ok(value),
        });
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: FrameworkError) {
        lock(&self.expectations).push_back(Expectation::Get {
            id: self.id,
            response: Err(error),
        });
    }
}

/// Builder for `create` expectations.
pub struct CreateExpectationBuilder<T: ActorEntity> {
    expectations: Queue<T>,
}

impl<T: ActorEntity> CreateExpectationBuilder<T> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, id: T::Id) {
        lock(&self.expectations).push_back(Expectation::Create { response: Ok(id) });
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: FrameworkError) {
        lock(&self.expectations).push_back(Expectation::Create {
            response: Err(error),
        });
    }
}

/// Builder for `list` expectations.
pub struct ListExpectationBuilder<T: ActorEntity> {
    expectations: Queue<T>,
}

impl<T: ActorEntity> ListExpectationBuilder<T> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, items: Vec<T>) {
        lock(&self.expectations).push_back(Expectation::List {
            response: Ok(items),
        });
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: FrameworkError) {
        lock(&self.expectations).push_back(Expectation::List {
            response: Err(error),
        });
    }
}

/// Builder for `action` expectations.
pub struct ActionExpectationBuilder<T: ActorEntity> {
    id: T::Id,
    expectations: Queue<T>,
}

impl<T: ActorEntity> ActionExpectationBuilder<T> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, result: T::ActionResult) {
        lock(&self.expectations).push_back(Expectation::Action {
            id: self.id,
            response: Ok(result),
        });
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: FrameworkError) {
        lock(&self.expectations).push_back(Expectation::Action {
            id: self.id,
            response: Err(error),
        });
    }
}

// =============================================================================
// RAW CHANNEL HELPERS
// =============================================================================

/// Creates a client and the receiver its requests arrive on.
///
/// Tests pull requests off `receiver` with [`expect_create`], [`expect_get`], [`expect_list`] or
/// [`expect_action`], assert on the payload and answer through the returned responder. This
/// simulates the actor's behavior (success, failure, delays) deterministically.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let (feed, _) = broadcast::channel(MOCK_FEED_CAPACITY);
    (ResourceClient::new(sender, feed), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Create, Response<T::Id>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<Option<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a List request
pub async fn expect_list<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Filter, Response<Vec<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::List { filter, respond_to }) => Some((filter, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Response<T::ActionResult>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Clone, Debug, PartialEq)]
    struct Depot {
        id: u32,
        city: String,
    }

    #[derive(Debug)]
    struct DepotCreate {
        city: String,
    }

    #[derive(Debug)]
    enum DepotAction {
        Seal,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("Depot error")]
    struct DepotError;

    #[async_trait]
    impl ActorEntity for Depot {
        type Id = u32;
        type Create = DepotCreate;
        type Action = DepotAction;
        type ActionResult = bool;
        type Filter = String;
        type Event = u32;
        type Context = ();
        type Error = DepotError;

        fn from_create_params(id: u32, params: DepotCreate) -> Result<Self, Self::Error> {
            Ok(Self {
                id,
                city: params.city,
            })
        }

        async fn handle_action(
            &mut self,
            _action: DepotAction,
            _ctx: &Self::Context,
        ) -> Result<bool, Self::Error> {
            Ok(true)
        }

        fn matches(&self, city: &String) -> bool {
            &self.city == city
        }
    }

    fn depot(id: u32, city: &str) -> Depot {
        Depot {
            id,
            city: city.to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<Depot>(10);

        let create_task = tokio::spawn(async move {
            client
                .create(DepotCreate {
                    city: "Porto".to_string(),
                })
                .await
        });

        let (payload, responder) = expect_create(&mut receiver)
            .await
            .expect("Expected Create request");
        assert_eq!(payload.city, "Porto");
        responder.send(Ok(1)).unwrap();

        let result = create_task.await.unwrap();
        assert!(matches!(result, Ok(1)));
    }

    #[tokio::test]
    async fn test_raw_list_and_action_helpers() {
        let (client, mut receiver) = create_mock_client::<Depot>(10);

        let task = tokio::spawn(async move {
            let listed = client.list("Porto".to_string()).await;
            let sealed = client.perform_action(3, DepotAction::Seal).await;
            (listed, sealed)
        });

        let (filter, responder) = expect_list(&mut receiver).await.unwrap();
        assert_eq!(filter, "Porto");
        responder.send(Ok(vec![depot(3, "Porto")])).unwrap();

        let (id, action, responder) = expect_action(&mut receiver).await.unwrap();
        assert_eq!(id, 3);
        assert!(matches!(action, DepotAction::Seal));
        responder.send(Err(FrameworkError::ActorClosed)).unwrap();

        let (listed, sealed) = task.await.unwrap();
        assert_eq!(listed.unwrap(), vec![depot(3, "Porto")]);
        assert!(matches!(sealed, Err(FrameworkError::ActorClosed)));
    }

    #[tokio::test]
    async fn test_mock_client_with_expectations() {
        let mut mock = MockClient::<Depot>::new();

        mock.expect_create().return_ok(1);
        mock.expect_get(1).return_ok(Some(depot(1, "Ghent")));
        mock.expect_list().return_ok(vec![depot(1, "Ghent")]);
        mock.expect_action(1)
            .return_err(FrameworkError::NotFound("1".to_string()));

        let client = mock.client();

        let id = client
            .create(DepotCreate {
                city: "Ghent".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(id, 1);

        let fetched = client.get(1).await.unwrap();
        assert_eq!(fetched.unwrap().city, "Ghent");
        assert_eq!(client.list("Ghent".to_string()).await.unwrap().len(), 1);
        assert!(matches!(
            client.perform_action(1, DepotAction::Seal).await,
            Err(FrameworkError::NotFound(_))
        ));

        mock.verify();
    }

    #[tokio::test]
    async fn test_emit_reaches_subscribers() {
        let mock = MockClient::<Depot>::new();
        let mut feed = mock.client().subscribe();

        mock.emit(5);
        mock.emit(6);

        assert_eq!(feed.recv().await.unwrap(), 5);
        assert_eq!(feed.recv().await.unwrap(), 6);
    }
}
