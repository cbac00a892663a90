//! Match root hashing for round audit.
//!
//! The `match_root` is a SHA-256 digest over every match of a round, in
//! fill order. It is stored on the archived [`RoundRecord`] so a replay of
//! the same bets can be checked without comparing full payloads.
//!
//! [`RoundRecord`]: spinmatch_types::RoundRecord

use sha2::{Digest, Sha256};
use spinmatch_types::Match;

/// Compute the match root over a round's matches.
///
/// Depends on match ids, counterparties, sides and amounts, in order.
#[must_use]
pub fn compute_match_root(matches: &[Match]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"spinmatch:match_root:v1:");
    hasher.update((matches.len() as u64).to_le_bytes());

    for m in matches {
        hasher.update(m.id.0.as_bytes());
        hasher.update(m.round_id.0.to_le_bytes());
        hasher.update(m.account_a.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(m.side_a.to_string().as_bytes());
        hasher.update(m.account_b.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(m.side_b.to_string().as_bytes());
        hasher.update(m.amount.to_le_bytes());
    }

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

/// Hex form of [`compute_match_root`], as stored on the round record.
#[must_use]
pub fn match_root_hex(matches: &[Match]) -> String {
    hex::encode(compute_match_root(matches))
}

/// Check a hex-encoded root against the matches it claims to cover.
#[must_use]
pub fn verify_match_root(matches: &[Match], expected_hex: &str) -> bool {
    match_root_hex(matches).eq_ignore_ascii_case(expected_hex)
}
