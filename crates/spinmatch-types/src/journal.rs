//! Ledger journal types.
//!
//! Every committed balance mutation is recorded as a [`LedgerEntry`]. The
//! journal is append-only and is what conservation checks in tests sum over.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, EntryId, RoundId};

/// Why a balance moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// External funds in.
    Deposit,
    /// External funds out.
    Withdrawal,
    /// Debit taken when a bet is placed.
    Stake,
    /// Winnings credited for a match.
    Payout,
    /// Unmatched remainder (or voided stake) returned.
    Refund,
}

impl EntryKind {
    /// Whether this kind increases the balance.
    #[must_use]
    pub fn is_credit(self) -> bool {
        matches!(self, Self::Deposit | Self::Payout | Self::Refund)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => write!(f, "DEPOSIT"),
            Self::Withdrawal => write!(f, "WITHDRAWAL"),
            Self::Stake => write!(f, "STAKE"),
            Self::Payout => write!(f, "PAYOUT"),
            Self::Refund => write!(f, "REFUND"),
        }
    }
}

/// One committed balance mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: EntryId,
    pub account: AccountId,
    pub kind: EntryKind,
    pub amount: Amount,
    pub round_id: Option<RoundId>,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    #[must_use]
    pub fn new(
        account: AccountId,
        kind: EntryKind,
        amount: Amount,
        round_id: Option<RoundId>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            account,
            kind,
            amount,
            round_id,
            recorded_at: Utc::now(),
        }
    }

    /// Signed effect on the account's balance.
    #[must_use]
    pub fn signed_amount(&self) -> i128 {
        if self.kind.is_credit() {
            i128::from(self.amount)
        } else {
            -i128::from(self.amount)
        }
    }
}
