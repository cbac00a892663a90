//! # spinmatch-types
//!
//! Shared types, errors, and configuration for the **SpinMatch** round engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`RoundId`], [`MatchId`], [`EntryId`]
//! - **Outcome model**: [`Side`], [`Outcome`]
//! - **Bet model**: [`Bet`], [`Amount`]
//! - **Match model**: [`Match`]
//! - **Round model**: [`RoundPhase`], [`Round`], [`RoundRecord`]
//! - **Journal model**: [`LedgerEntry`], [`EntryKind`]
//! - **Snapshot**: [`GameState`], [`SideTotals`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`SpinmatchError`] with `SM_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod bet;
pub mod bet_match;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod journal;
pub mod outcome;
pub mod round;
pub mod snapshot;

// Re-export all primary types at crate root for ergonomic imports:
//   use spinmatch_types::{Bet, Match, Side, RoundPhase, ...};

pub use bet::*;
pub use bet_match::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use journal::*;
pub use outcome::*;
pub use round::*;
pub use snapshot::*;

// Constants are accessed via `spinmatch_types::constants::FOO`
// (not re-exported to avoid name collisions).
