//! # spinmatch-matchcore
//!
//! **In-round bet ledger and peer-to-peer matcher for SpinMatch.**
//!
//! MatchCore holds the bets of one round and pairs opposing stakes. It has:
//!
//! - **Zero side effects**: no ledger calls, no persistence
//! - **Deterministic output**: same book -> same matches, same match ids
//! - **Partial fills**: a large stake splits across several smaller ones
//! - **Self-match prevention**: an account never matches itself

pub mod bet_book;
pub mod determinism;
pub mod matcher;

pub use bet_book::BetBook;
pub use determinism::{compute_match_root, match_root_hex, verify_match_root};
pub use matcher::run_matching_pass;
