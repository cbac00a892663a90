//! Round lifecycle types.
//!
//! Each round walks a strictly linear phase sequence:
//! **INITIALIZING → WAITING_FOR_PLAYERS → BETTING_OPEN → PROCESSING_BETS →
//! SPINNING → RESULTS → CLEANUP**, after which the next round starts in
//! BETTING_OPEN (or WAITING_FOR_PLAYERS when the table is short of players).
//! Any phase may fall into ERROR; ERROR leads back to WAITING_FOR_PLAYERS
//! when recovery succeeds and to INITIALIZING when it does not.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Bet, Match, Outcome, RoundId, Side};

/// The phases of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundPhase {
    Initializing,
    WaitingForPlayers,
    /// The only phase in which stakes are accepted.
    BettingOpen,
    ProcessingBets,
    /// Outcome drawn but not yet revealed.
    Spinning,
    /// Outcome revealed and settled.
    Results,
    Cleanup,
    Error,
}

impl RoundPhase {
    pub const ALL: [RoundPhase; 8] = [
        Self::Initializing,
        Self::WaitingForPlayers,
        Self::BettingOpen,
        Self::ProcessingBets,
        Self::Spinning,
        Self::Results,
        Self::Cleanup,
        Self::Error,
    ];

    /// Whether `next` is a legal successor of `self`.
    ///
    /// Every phase may fall into `Error`; apart from that only the linear
    /// edges plus the CLEANUP loop and the two ERROR exits exist.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if next == Self::Error {
            return self != Self::Error;
        }
        matches!(
            (self, next),
            (Self::Initializing, Self::WaitingForPlayers)
                | (Self::WaitingForPlayers, Self::BettingOpen)
                | (Self::BettingOpen, Self::ProcessingBets)
                | (Self::ProcessingBets, Self::Spinning)
                | (Self::Spinning, Self::Results)
                | (Self::Results, Self::Cleanup)
                | (Self::Cleanup, Self::BettingOpen | Self::WaitingForPlayers)
                | (Self::Error, Self::WaitingForPlayers | Self::Initializing)
        )
    }

    #[must_use]
    pub fn accepts_bets(self) -> bool {
        self == Self::BettingOpen
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initializing => "INITIALIZING",
            Self::WaitingForPlayers => "WAITING_FOR_PLAYERS",
            Self::BettingOpen => "BETTING_OPEN",
            Self::ProcessingBets => "PROCESSING_BETS",
            Self::Spinning => "SPINNING",
            Self::Results => "RESULTS",
            Self::Cleanup => "CLEANUP",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Round
// ---------------------------------------------------------------------------

/// One betting cycle. Owned by the round driver; mutated only on phase
/// transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: RoundId,
    pub phase: RoundPhase,
    /// Seconds left in the betting window.
    pub countdown: u32,
    /// Present only once revealed (RESULTS onward).
    pub outcome: Option<Outcome>,
    /// Connected participants as last observed by this round.
    pub player_count: usize,
    /// Failure that sent this round to ERROR, if any.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Round {
    #[must_use]
    pub fn new(id: RoundId) -> Self {
        Self {
            id,
            phase: RoundPhase::Initializing,
            countdown: 0,
            outcome: None,
            player_count: 0,
            error_message: None,
            created_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Derived color of the revealed outcome.
    #[must_use]
    pub fn color(&self) -> Option<Side> {
        self.outcome.map(Outcome::side)
    }
}

// ---------------------------------------------------------------------------
// RoundRecord: what the round store persists
// ---------------------------------------------------------------------------

/// Persisted view of a round: the round itself plus its bets and matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    pub round: Round,
    pub bets: Vec<Bet>,
    pub matches: Vec<Match>,
    /// Hex SHA-256 root over the round's matches, once matching has run.
    pub match_root: Option<String>,
}

impl RoundRecord {
    #[must_use]
    pub fn new(round: Round) -> Self {
        Self {
            round,
            bets: Vec::new(),
            matches: Vec::new(),
            match_root: None,
        }
    }

    /// A record can seed recovery unless it ended in ERROR.
    #[must_use]
    pub fn is_resumable(&self) -> bool {
        self.round.phase != RoundPhase::Error
    }
}
