//! Match records produced by the matcher.
//!
//! A [`Match`] is the immutable record of a fill between two opposite-side
//! stakes from different accounts. Settlement consumes each one exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, MatchId, Outcome, RoundId, Side};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Deterministic from round ID + fill sequence.
    pub id: MatchId,
    pub round_id: RoundId,
    pub account_a: AccountId,
    pub side_a: Side,
    pub account_b: AccountId,
    /// Always `side_a.opposite()`.
    pub side_b: Side,
    pub amount: Amount,
    pub matched_at: DateTime<Utc>,
}

impl Match {
    /// The account holding the winning side for `outcome`.
    #[must_use]
    pub fn winner(&self, outcome: Outcome) -> &AccountId {
        if outcome.wins(self.side_a) {
            &self.account_a
        } else {
            &self.account_b
        }
    }

    /// Whether `account` is one of the two counterparties.
    #[must_use]
    pub fn involves(&self, account: &AccountId) -> bool {
        self.account_a == *account || self.account_b == *account
    }
}

impl std::fmt::Display for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Match[{}] {} {} <> {} {} x {}",
            self.id.short(),
            self.account_a,
            self.side_a,
            self.account_b,
            self.side_b,
            self.amount,
        )
    }
}
