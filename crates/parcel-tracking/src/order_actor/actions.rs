//! Custom actions for the Order actor.
//!
//! Every mutation of an order after placement is an action, so the actor's queue serializes
//! them per order and the change feed sees them in the order they were applied.

use crate::model::StatusUpdate;

/// Custom actions for Order entities.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Appends the next milestone. The actor assigns the sequence.
    ///
    /// # Errors
    /// Fails with [`OrderError::Timeline`](super::OrderError::Timeline) if the status may not
    /// follow the current one.
    RecordStatus(StatusUpdate),
    /// Customer-initiated cancellation. Same rules as recording `Cancelled`.
    Cancel,
}
