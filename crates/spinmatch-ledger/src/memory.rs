//! In-memory ledger adapter.
//!
//! Tracks a single balance per account plus an append-only journal of every
//! committed mutation. A transaction takes the state lock for its whole
//! lifetime, so units of work are serializable. Postings are staged against
//! a working copy and only land on commit.

use std::collections::HashMap;
#[cfg(any(test, feature = "test-helpers"))]
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use spinmatch_types::{AccountId, Amount, EntryKind, LedgerEntry, Result, RoundId, SpinmatchError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::{Ledger, LedgerTransaction};

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<AccountId, Amount>,
    journal: Vec<LedgerEntry>,
    #[cfg(any(test, feature = "test-helpers"))]
    faults: Faults,
}

/// Injected failures for exercising rollback paths.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Default)]
struct Faults {
    /// Consumed by the next commit.
    fail_next_commit: bool,
    fail_credits_for: HashSet<AccountId>,
}

/// Balances and journal held in process memory.
///
/// Cloning shares the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add external funds to `account`, opening it if needed.
    ///
    /// # Errors
    /// `BalanceOverflow` if the balance would exceed `u64::MAX`.
    pub async fn deposit(&self, account: &AccountId, amount: Amount) -> Result<()> {
        let mut tx = self.begin().await?;
        tx.credit(account, amount, EntryKind::Deposit, None).await?;
        tx.commit().await
    }

    /// Remove funds from `account`.
    ///
    /// # Errors
    /// `AccountNotFound` or `InsufficientFunds`.
    pub async fn withdraw(&self, account: &AccountId, amount: Amount) -> Result<()> {
        let mut tx = self.begin().await?;
        if let Err(e) = tx
            .debit(account, amount, EntryKind::Withdrawal, None)
            .await
        {
            tx.rollback().await?;
            return Err(e);
        }
        tx.commit().await
    }

    /// Committed journal entries for one account, oldest first.
    pub async fn journal(&self, account: &AccountId) -> Vec<LedgerEntry> {
        let state = self.state.lock().await;
        state
            .journal
            .iter()
            .filter(|e| e.account == *account)
            .cloned()
            .collect()
    }

    /// Every committed journal entry, oldest first.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.state.lock().await.journal.clone()
    }

    /// Sum of every account balance.
    pub async fn total_supply(&self) -> u128 {
        let state = self.state.lock().await;
        state.balances.values().map(|&b| u128::from(b)).sum()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl InMemoryLedger {
    /// Make the next `commit` fail and discard its postings.
    pub async fn fail_next_commit(&self) {
        self.state.lock().await.faults.fail_next_commit = true;
    }

    /// Make every credit to `account` fail until faults are cleared.
    pub async fn fail_credits_for(&self, account: &AccountId) {
        self.state
            .lock()
            .await
            .faults
            .fail_credits_for
            .insert(account.clone());
    }

    pub async fn clear_faults(&self) {
        self.state.lock().await.faults = Faults::default();
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            guard,
            working: HashMap::new(),
            staged: Vec::new(),
        }))
    }

    async fn balance(&self, account: &AccountId) -> Result<Amount> {
        let state = self.state.lock().await;
        state
            .balances
            .get(account)
            .copied()
            .ok_or_else(|| SpinmatchError::AccountNotFound(account.clone()))
    }
}

/// Unit of work over [`InMemoryLedger`]. Holds the state lock until it is
/// committed, rolled back or dropped.
struct MemoryTransaction {
    guard: OwnedMutexGuard<LedgerState>,
    /// Balances touched by this transaction.
    working: HashMap<AccountId, Amount>,
    staged: Vec<LedgerEntry>,
}

impl MemoryTransaction {
    fn current(&self, account: &AccountId) -> Option<Amount> {
        self.working
            .get(account)
            .or_else(|| self.guard.balances.get(account))
            .copied()
    }
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn debit(
        &mut self,
        account: &AccountId,
        amount: Amount,
        kind: EntryKind,
        round_id: Option<RoundId>,
    ) -> Result<()> {
        let available = self
            .current(account)
            .ok_or_else(|| SpinmatchError::AccountNotFound(account.clone()))?;
        if available < amount {
            return Err(SpinmatchError::InsufficientFunds {
                needed: amount,
                available,
            });
        }

        self.working.insert(account.clone(), available - amount);
        self.staged
            .push(LedgerEntry::new(account.clone(), kind, amount, round_id));
        Ok(())
    }

    async fn credit(
        &mut self,
        account: &AccountId,
        amount: Amount,
        kind: EntryKind,
        round_id: Option<RoundId>,
    ) -> Result<()> {
        #[cfg(any(test, feature = "test-helpers"))]
        if self.guard.faults.fail_credits_for.contains(account) {
            return Err(SpinmatchError::LedgerUnavailable {
                reason: format!("credit to {account} refused"),
            });
        }

        let current = self.current(account).unwrap_or(0);
        let next = current
            .checked_add(amount)
            .ok_or_else(|| SpinmatchError::BalanceOverflow(account.clone()))?;

        self.working.insert(account.clone(), next);
        self.staged
            .push(LedgerEntry::new(account.clone(), kind, amount, round_id));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self {
            mut guard,
            working,
            staged,
        } = *self;

        #[cfg(any(test, feature = "test-helpers"))]
        if std::mem::take(&mut guard.faults.fail_next_commit) {
            tracing::warn!(postings = staged.len(), "ledger commit refused");
            return Err(SpinmatchError::LedgerUnavailable {
                reason: "commit refused".into(),
            });
        }
        debug!(postings = staged.len(), "ledger commit");
        guard.balances.extend(working);
        guard.journal.extend(staged);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        debug!(postings = self.staged.len(), "ledger rollback");
        Ok(())
    }
}
