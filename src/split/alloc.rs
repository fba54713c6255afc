//! Identifier allocation for synthetic lists
//!
//! Split chunks need list ids that cannot collide with anything in the
//! input. One allocator is seeded per run and handed by mutable
//! reference through the rebalancing pass; ids are strictly monotonic
//! and never reused, across all owners.

use crate::normalize::ListRecord;
use tracing::warn;

/// Baseline used when the input contains no positive list ids
const DEFAULT_START: i64 = 1_000_000;

/// Monotonic source of synthetic list ids
#[derive(Debug)]
pub struct IdAllocator {
    next: i64,
}

impl IdAllocator {
    /// Seed an allocator from the normalized input lists
    ///
    /// An explicit override wins unconditionally. Otherwise the seed
    /// is one past the highest positive input id, or a large fixed
    /// baseline when no positive ids exist.
    pub fn from_lists(lists: &[ListRecord], override_start: Option<i64>) -> Self {
        let max_id = lists.iter().map(|l| l.id).filter(|id| *id > 0).max();
        let next = match override_start {
            Some(start) => {
                if let Some(max) = max_id {
                    if start <= max {
                        warn!(
                            start,
                            max_input_id = max,
                            "Start id does not clear the input id range; synthetic ids may collide"
                        );
                    }
                }
                start
            }
            None => match max_id {
                Some(max) => max + 1,
                None => DEFAULT_START,
            },
        };
        Self { next }
    }

    /// Return the next id and advance
    pub fn next_id(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }
}
