//! Per-order record of which sequences a subscription has already delivered.

use crate::model::{OrderId, StatusEvent};
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Default)]
struct Seen {
    /// Every sequence up to and including this one has been delivered.
    watermark: u64,
    above: BTreeSet<u64>,
}

/// De-duplicates an at-least-once event stream.
///
/// Keeps a contiguous watermark per order plus the sequences seen beyond it, so a reordered
/// event is still forwarded once while a replayed one is not.
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    orders: HashMap<OrderId, Seen>,
}

impl SequenceTracker {
    /// Starts tracking each order as if everything up to its given sequence was already seen.
    pub fn new(from: &HashMap<OrderId, u64>) -> Self {
        let orders = from
            .iter()
            .map(|(id, watermark)| {
                (
                    id.clone(),
                    Seen {
                        watermark: *watermark,
                        above: BTreeSet::new(),
                    },
                )
            })
            .collect();
        Self { orders }
    }

    /// Records `event` and reports whether it is new. Events for untracked orders are never new.
    pub fn observe(&mut self, event: &StatusEvent) -> bool {
        let Some(seen) = self.orders.get_mut(&event.order_id) else {
            return false;
        };
        if event.sequence <= seen.watermark || !seen.above.insert(event.sequence) {
            return false;
        }
        while seen.above.remove(&(seen.watermark + 1)) {
            seen.watermark += 1;
        }
        true
    }

    pub fn watermark(&self, order_id: &OrderId) -> Option<u64> {
        self.orders.get(order_id).map(|seen| seen.watermark)
    }

    /// Resume point for every tracked order.
    pub fn watermarks(&self) -> HashMap<OrderId, u64> {
        self.orders
            .iter()
            .map(|(id, seen)| (id.clone(), seen.watermark))
            .collect()
    }

    pub fn order_ids(&self) -> HashSet<OrderId> {
        self.orders.keys().cloned().collect()
    }
}
