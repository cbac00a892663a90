//! # spinmatch-ledger
//!
//! **Storage ports for the SpinMatch engine**: the balance ledger and the
//! round store, each with an in-memory adapter.
//!
//! ## Architecture
//!
//! 1. **Ledger**: opens atomic units of work; debits and credits are posted
//!    against a transaction and land only on commit
//! 2. **InMemoryLedger**: single balance per account plus a journal of every
//!    committed posting (deposit, withdrawal, stake, payout, refund)
//! 3. **RoundStore**: saves round records per phase change, serves the latest
//!    resumable round to recovery
//!
//! ## Placement Flow
//!
//! ```text
//! Ledger.begin() -> tx.debit(Stake) -> tx.commit() -> BetBook.stake()
//! ```
//!
//! A failed debit or commit leaves the bet book untouched.

pub mod ledger;
pub mod memory;
pub mod round_store;

pub use ledger::{Ledger, LedgerTransaction};
pub use memory::InMemoryLedger;
pub use round_store::{InMemoryRoundStore, RoundStore};
