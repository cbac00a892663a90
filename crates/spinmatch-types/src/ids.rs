//! Identifiers used throughout SpinMatch.
//!
//! Accounts are identified by the opaque string the external auth layer
//! hands us. Rounds are a monotonically increasing counter. Matches get a
//! deterministic UUID derived from (round, fill sequence) so the same pass
//! over the same stakes always yields the same IDs. Journal entries use
//! UUIDv7 for time-ordered sorting.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Identifier of a player account, as issued by the external auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// RoundId
// ---------------------------------------------------------------------------

/// Monotonically increasing identifier for a betting round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub u64);

impl RoundId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// MatchId
// ---------------------------------------------------------------------------

/// Identifier of one match (a filled pairing between opposite stakes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MatchId(pub Uuid);

impl MatchId {
    /// Deterministic `MatchId` from round ID and fill sequence.
    ///
    /// Re-running the matcher over the same stake snapshot reproduces the
    /// same IDs, which keeps the per-round match root stable.
    #[must_use]
    pub fn deterministic(round_id: RoundId, fill_sequence: u64) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"spinmatch:match_id:v1:");
        hasher.update(round_id.0.to_le_bytes());
        hasher.update(fill_sequence.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(Uuid::from_bytes(bytes))
    }

    /// First four bytes, hex encoded. Handy for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0.as_bytes()[..4])
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntryId
// ---------------------------------------------------------------------------

/// Identifier of a committed ledger journal entry. UUIDv7, time-ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EntryId(pub Uuid);

impl EntryId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_id_next() {
        assert_eq!(RoundId(0).next(), RoundId(1));
        assert_eq!(RoundId(41).next(), RoundId(42));
    }

    #[test]
    fn match_id_is_deterministic() {
        let a = MatchId::deterministic(RoundId(7), 3);
        let b = MatchId::deterministic(RoundId(7), 3);
        assert_eq!(a, b);
        assert_ne!(a, MatchId::deterministic(RoundId(7), 4));
        assert_ne!(a, MatchId::deterministic(RoundId(8), 3));
    }

    #[test]
    fn match_id_short_is_eight_hex_chars() {
        let id = MatchId::deterministic(RoundId(1), 0);
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn account_id_serializes_as_plain_string() {
        let id = AccountId::new("alice");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"alice\"");
        assert_eq!(format!("{id}"), "alice");
    }

    #[test]
    fn entry_ids_are_unique() {
        assert_ne!(EntryId::new(), EntryId::new());
    }
}
