//! # Generic Messages
//!
//! Message types exchanged between [`ResourceClient`](crate::ResourceClient) and
//! [`ResourceActor`](crate::ResourceActor).

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Internal message type sent to the actor to request operations.
///
/// Every resource gets the same four operations:
///
/// - **Create**: lifecycle start, built from [`ActorEntity::Create`].
/// - **Get**: fetch the current state of one resource by id.
/// - **List**: every resource for which [`ActorEntity::matches`] holds, in no particular order.
/// - **Action**: run a resource-specific [`ActorEntity::Action`]; all mutation goes through here.
///
/// Requests are handled one at a time, so two actions against the same resource never interleave.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    List {
        filter: T::Filter,
        respond_to: Response<Vec<T>>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}
