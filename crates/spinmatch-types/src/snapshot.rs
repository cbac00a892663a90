//! Outbound round-state snapshot (`gameState`).

use serde::{Deserialize, Serialize};

use crate::{Amount, Bet, Outcome, RoundId, RoundPhase, Side};

/// Per-side totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideTotals {
    pub red: Amount,
    pub black: Amount,
}

impl SideTotals {
    #[must_use]
    pub fn get(&self, side: Side) -> Amount {
        match side {
            Side::Red => self.red,
            Side::Black => self.black,
        }
    }

    pub fn add(&mut self, side: Side, amount: Amount) {
        match side {
            Side::Red => self.red += amount,
            Side::Black => self.black += amount,
        }
    }

    /// Staked and matched totals over a set of bets.
    #[must_use]
    pub fn staked_and_matched<'a>(bets: impl IntoIterator<Item = &'a Bet>) -> (Self, Self) {
        let mut staked = Self::default();
        let mut matched = Self::default();
        for bet in bets {
            staked.add(bet.side, bet.staked);
            matched.add(bet.side, bet.matched);
        }
        (staked, matched)
    }
}

/// Snapshot of the current round broadcast to observers on every phase
/// change and once per second while betting is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub round_id: RoundId,
    pub phase: RoundPhase,
    pub countdown: u32,
    pub pending_bets_by_side: SideTotals,
    pub matched_by_side: SideTotals,
    /// Hidden while SPINNING; present from RESULTS onward.
    pub outcome: Option<Outcome>,
    /// Most recent first.
    pub recent_outcome_history: Vec<Outcome>,
    pub connected_players: usize,
    pub error: Option<String>,
}
