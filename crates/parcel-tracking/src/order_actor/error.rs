//! Error types for the Order actor.

use crate::aggregator::TimelineError;
use crate::directory::DirectoryError;
use crate::model::OrderId;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The requested order was not found.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The placement payload was rejected.
    #[error("Order validation error: {0}")]
    Validation(String),

    /// The status event could not be merged into the order's timeline.
    #[error(transparent)]
    Timeline(#[from] TimelineError),

    /// The listing query was malformed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}
