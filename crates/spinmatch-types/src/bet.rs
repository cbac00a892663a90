//! Bet model.
//!
//! A [`Bet`] is the single logical record for one (round, account, side).
//! Repeat stakes from the same account on the same side accumulate into it;
//! the matcher advances `matched` as fills are formed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, RoundId, Side};

/// Integer currency amount. No fractional units exist anywhere in the engine.
pub type Amount = u64;

/// One account's accumulated stake on one side within a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub account: AccountId,
    pub round_id: RoundId,
    pub side: Side,
    /// Total staked so far (sum of every accepted placement).
    pub staked: Amount,
    /// Portion of `staked` already paired with opposite stakes.
    pub matched: Amount,
    /// Set at CLEANUP; a processed bet is terminal.
    pub processed: bool,
    /// When the first stake was accepted.
    pub placed_at: DateTime<Utc>,
}

impl Bet {
    #[must_use]
    pub fn new(account: AccountId, round_id: RoundId, side: Side, staked: Amount) -> Self {
        Self {
            account,
            round_id,
            side,
            staked,
            matched: 0,
            processed: false,
            placed_at: Utc::now(),
        }
    }

    /// Unmatched portion of the stake.
    #[must_use]
    pub fn remaining(&self) -> Amount {
        self.staked.saturating_sub(self.matched)
    }

    #[must_use]
    pub fn is_fully_matched(&self) -> bool {
        self.matched == self.staked
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Bet {
    pub fn dummy(account: &str, side: Side, staked: Amount) -> Self {
        Self::new(AccountId::new(account), RoundId(1), side, staked)
    }
}
