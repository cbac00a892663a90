//! Settle-once guard.
//!
//! Each round can only be settled (or voided) once. A second attempt on the
//! same `RoundId` returns [`SpinmatchError::RoundAlreadySettled`].
//!
//! The guard keeps a bounded window of recent round ids, oldest evicted
//! first, so memory stays flat in a long-running engine.

use std::collections::{HashSet, VecDeque};

use spinmatch_types::{Result, RoundId, SpinmatchError};

/// Remembers which rounds have already had funds posted.
#[derive(Debug)]
pub struct SettleOnceGuard {
    settled: HashSet<RoundId>,
    /// Insertion order (front = oldest).
    order: VecDeque<RoundId>,
    max_size: usize,
}

impl SettleOnceGuard {
    /// A zero `max_size` is treated as one.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            settled: HashSet::with_capacity(max_size),
            order: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// # Errors
    /// [`SpinmatchError::RoundAlreadySettled`] if `round_id` is already marked.
    pub fn mark_settled(&mut self, round_id: RoundId) -> Result<()> {
        if self.settled.contains(&round_id) {
            return Err(SpinmatchError::RoundAlreadySettled(round_id));
        }

        if self.settled.len() >= self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.settled.remove(&oldest);
            }
        }

        self.settled.insert(round_id);
        self.order.push_back(round_id);
        Ok(())
    }

    #[must_use]
    pub fn is_settled(&self, round_id: RoundId) -> bool {
        self.settled.contains(&round_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.settled.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }
}
