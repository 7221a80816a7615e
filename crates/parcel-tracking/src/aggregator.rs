//! # Timeline Aggregator
//!
//! Folds status events into a per-order [`Timeline`] and derives the current status.
//!
//! `sequence` is authoritative: events are never reordered by timestamp. Sequences are contiguous
//! per order, so [`merge`] only appends the event directly after the newest one. Anything older is
//! a harmless duplicate, anything further ahead is a [`TimelineError::SequenceGap`].
//!
//! Transports deliver at least once and may reorder, so consumers normally go through a
//! [`TimelineAggregator`], which parks early events until the gap before them closes.

use crate::model::{is_valid_transition, OrderId, OrderStatus, StatusEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Errors raised while merging an event into a timeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    /// The event's status may not follow the timeline's latest status, including any event after
    /// a terminal one.
    #[error("{order_id}: invalid transition {from:?} -> {to:?} at sequence {sequence}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        sequence: u64,
    },

    /// The first event of an order was not `Confirmed`.
    #[error("{order_id}: timeline must start with Confirmed, got {status:?}")]
    InvalidInitialState { order_id: OrderId, status: OrderStatus },

    #[error("{order_id}: expected sequence {expected}, got {found}")]
    SequenceGap {
        order_id: OrderId,
        expected: u64,
        found: u64,
    },

    #[error("event for {found} offered to timeline of {expected}")]
    OrderMismatch { expected: OrderId, found: OrderId },
}

/// Ordered, de-duplicated history of one order.
///
/// Sorted ascending by `sequence` with no holes. The last entry carries the current status, and
/// nothing is accepted after a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "UncheckedTimeline")]
pub struct Timeline {
    order_id: OrderId,
    events: Vec<StatusEvent>,
}

/// Wire form of a [`Timeline`]; rebuilt through [`Timeline::from_events`] when decoded.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UncheckedTimeline {
    order_id: OrderId,
    events: Vec<StatusEvent>,
}

impl TryFrom<UncheckedTimeline> for Timeline {
    type Error = TimelineError;

    fn try_from(raw: UncheckedTimeline) -> Result<Self, Self::Error> {
        Timeline::from_events(raw.order_id, raw.events)
    }
}

impl Timeline {
    pub fn new(order_id: impl Into<OrderId>) -> Self {
        Self {
            order_id: order_id.into(),
            events: Vec::new(),
        }
    }

    /// Builds a timeline from events in any order. Sorting is by `sequence` only.
    pub fn from_events(
        order_id: impl Into<OrderId>,
        events: impl IntoIterator<Item = StatusEvent>,
    ) -> Result<Self, TimelineError> {
        let mut events: Vec<StatusEvent> = events.into_iter().collect();
        events.sort_by_key(|event| event.sequence);
        events
            .into_iter()
            .try_fold(Timeline::new(order_id), merge)
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn events(&self) -> &[StatusEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn latest(&self) -> Option<&StatusEvent> {
        self.events.last()
    }

    /// Sequence of the newest event, 0 for an empty timeline.
    pub fn max_sequence(&self) -> u64 {
        self.latest().map_or(0, |event| event.sequence)
    }

    pub fn current_status(&self) -> Option<OrderStatus> {
        self.latest().map(|event| event.status)
    }

    pub fn is_terminal(&self) -> bool {
        self.current_status().is_some_and(OrderStatus::is_terminal)
    }

    /// Timestamp of the newest event that carries one.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.events.iter().rev().find_map(|event| event.occurred_at)
    }

    /// Appends `incoming` if it is the next event. Returns `false` for duplicates and stale events.
    pub fn apply(&mut self, incoming: StatusEvent) -> Result<bool, TimelineError> {
        if incoming.order_id != self.order_id {
            return Err(TimelineError::OrderMismatch {
                expected: self.order_id.clone(),
                found: incoming.order_id,
            });
        }

        let max_sequence = self.max_sequence();
        if incoming.sequence <= max_sequence {
            debug!(order_id = %self.order_id, sequence = incoming.sequence, "Stale event ignored");
            return Ok(false);
        }

        match self.current_status() {
            Some(from) if from.is_terminal() => {
                return Err(self.invalid_transition(from, &incoming));
            }
            _ => {}
        }

        if incoming.sequence != max_sequence + 1 {
            return Err(TimelineError::SequenceGap {
                order_id: self.order_id.clone(),
                expected: max_sequence + 1,
                found: incoming.sequence,
            });
        }

        match self.current_status() {
            None if incoming.status != OrderStatus::INITIAL => {
                return Err(TimelineError::InvalidInitialState {
                    order_id: self.order_id.clone(),
                    status: incoming.status,
                });
            }
            Some(from) if !is_valid_transition(from, incoming.status) => {
                return Err(self.invalid_transition(from, &incoming));
            }
            _ => {}
        }

        self.events.push(incoming);
        Ok(true)
    }

    fn invalid_transition(&self, from: OrderStatus, incoming: &StatusEvent) -> TimelineError {
        TimelineError::InvalidTransition {
            order_id: self.order_id.clone(),
            from,
            to: incoming.status,
            sequence: incoming.sequence,
        }
    }
}

/// Merges one event into `existing`.
///
/// Duplicates and stale events return the timeline unchanged. Invalid transitions, a non-`Confirmed`
/// first event and sequence gaps are errors.
pub fn merge(existing: Timeline, incoming: StatusEvent) -> Result<Timeline, TimelineError> {
    let mut timeline = existing;
    timeline.apply(incoming)?;
    Ok(timeline)
}

/// Result of [`TimelineAggregator::ingest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The event and `count - 1` previously parked events were appended.
    Applied { count: usize },
    /// Already applied; nothing changed.
    Stale,
    /// Ahead of the timeline; parked until the gap closes.
    Deferred,
}

/// A timeline plus a bounded buffer of events that arrived ahead of their turn.
#[derive(Debug, Clone)]
pub struct TimelineAggregator {
    timeline: Timeline,
    parked: BTreeMap<u64, StatusEvent>,
    capacity: usize,
}

impl TimelineAggregator {
    pub fn new(order_id: impl Into<OrderId>, capacity: usize) -> Self {
        Self::from_timeline(Timeline::new(order_id), capacity)
    }

    pub fn from_timeline(timeline: Timeline, capacity: usize) -> Self {
        Self {
            timeline,
            parked: BTreeMap::new(),
            capacity,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn into_timeline(self) -> Timeline {
        self.timeline
    }

    pub fn parked(&self) -> usize {
        self.parked.len()
    }

    pub fn ingest(&mut self, event: StatusEvent) -> Result<IngestOutcome, TimelineError> {
        let next = self.timeline.max_sequence() + 1;

        if event.order_id == *self.timeline.order_id() && event.sequence > next {
            if let Some(from) = self.timeline.current_status().filter(|s| s.is_terminal()) {
                return Err(self.timeline.invalid_transition(from, &event));
            }
            return self.park(event, next);
        }

        if !self.timeline.apply(event)? {
            return Ok(IngestOutcome::Stale);
        }

        let mut count = 1;
        while let Some(parked) = self.parked.remove(&(self.timeline.max_sequence() + 1)) {
            match self.timeline.apply(parked) {
                Ok(_) => count += 1,
                Err(e) => {
                    warn!(error = %e, "Dropping parked event");
                    break;
                }
            }
        }
        if self.timeline.is_terminal() && !self.parked.is_empty() {
            warn!(
                order_id = %self.timeline.order_id(),
                dropped = self.parked.len(),
                "Discarding events parked behind a terminal status"
            );
            self.parked.clear();
        }
        Ok(IngestOutcome::Applied { count })
    }

    /// Ingests every event of an authoritative snapshot. Returns how many were appended.
    pub fn reconcile(&mut self, snapshot: &Timeline) -> usize {
        let mut applied = 0;
        for event in snapshot.events() {
            if event.sequence <= self.timeline.max_sequence() {
                continue;
            }
            match self.ingest(event.clone()) {
                Ok(IngestOutcome::Applied { count }) => applied += count,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Snapshot event rejected");
                    break;
                }
            }
        }
        applied
    }

    fn park(&mut self, event: StatusEvent, expected: u64) -> Result<IngestOutcome, TimelineError> {
        if self.capacity == 0 {
            return Err(TimelineError::SequenceGap {
                order_id: event.order_id,
                expected,
                found: event.sequence,
            });
        }
        debug!(order_id = %event.order_id, sequence = event.sequence, expected, "Parking early event");
        self.parked.insert(event.sequence, event);
        if self.parked.len() > self.capacity {
            if let Some((sequence, _)) = self.parked.pop_last() {
                warn!(order_id = %self.timeline.order_id(), sequence, "Reorder buffer full, dropping newest");
            }
        }
        Ok(IngestOutcome::Deferred)
    }
}
