//! Ledger port.
//!
//! The engine never sees how balances are stored. It opens a unit of work,
//! posts debits and credits against it, and either commits or rolls back.
//! A transaction that is dropped without `commit` has no effect.

use async_trait::async_trait;
use spinmatch_types::{AccountId, Amount, EntryKind, Result, RoundId};

/// Balance store consumed by the engine.
#[async_trait]
pub trait Ledger: Send + Sync + 'static {
    /// Open a new unit of work.
    ///
    /// Implementations may serialize transactions; callers must not hold
    /// one transaction open while beginning another.
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>>;

    /// Committed balance of `account`.
    ///
    /// # Errors
    /// `AccountNotFound` for an account the ledger has never seen.
    async fn balance(&self, account: &AccountId) -> Result<Amount>;
}

/// One atomic unit of work over the ledger.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Take `amount` from `account`.
    ///
    /// # Errors
    /// `InsufficientFunds` when the balance (including earlier postings in
    /// this transaction) is below `amount`.
    async fn debit(
        &mut self,
        account: &AccountId,
        amount: Amount,
        kind: EntryKind,
        round_id: Option<RoundId>,
    ) -> Result<()>;

    /// Give `amount` to `account`.
    async fn credit(
        &mut self,
        account: &AccountId,
        amount: Amount,
        kind: EntryKind,
        round_id: Option<RoundId>,
    ) -> Result<()>;

    /// Apply every posting, or none of them.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every posting.
    async fn rollback(self: Box<Self>) -> Result<()>;
}
