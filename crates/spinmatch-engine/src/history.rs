//! Bounded recent-outcome history, most recent first.

use std::collections::VecDeque;

use spinmatch_types::Outcome;

#[derive(Debug, Clone)]
pub struct OutcomeHistory {
    capacity: usize,
    entries: VecDeque<Outcome>,
}

impl OutcomeHistory {
    /// A zero `capacity` is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Record `outcome` as the newest entry, evicting the oldest when full.
    pub fn push(&mut self, outcome: Outcome) {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(outcome);
    }

    #[must_use]
    pub fn recent(&self) -> Vec<Outcome> {
        self.entries.iter().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
