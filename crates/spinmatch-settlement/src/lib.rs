//! # spinmatch-settlement
//!
//! **Finality for a SpinMatch round**: refunds, payouts and voids.
//!
//! ## Architecture
//!
//! The processor receives a round's bets and matches once the outcome is
//! revealed and:
//! 1. Checks the settle-once guard (no double settlement)
//! 2. Plans refunds of unmatched remainders and payouts to match winners
//! 3. Checks the plan against the fee-adjusted conservation law
//! 4. Posts every credit in one ledger transaction, rolling back on failure
//!
//! A round that cannot be settled is voided instead: every stake returns in
//! full, through the same guard and the same single transaction.

pub mod conservation;
pub mod idempotency;
pub mod payout;
pub mod processor;

pub use conservation::RoundConservation;
pub use idempotency::SettleOnceGuard;
pub use payout::{Credit, SettlementPlan, plan_settlement, plan_void, winning_payout};
pub use processor::{SettlementProcessor, SettlementReport};
