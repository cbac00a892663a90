//! The in-round bet ledger.
//!
//! Bets live in a flat arena (`Vec<Bet>`) with an auxiliary
//! `HashMap<(AccountId, Side), usize>` index, so a repeat stake from the same
//! account on the same side accumulates into the existing record instead of
//! creating a second one. Matches are append-only.
//!
//! Only the matcher moves `matched`; callers outside this crate can stake,
//! freeze and read.

use std::collections::HashMap;

use chrono::Utc;
use spinmatch_types::*;

/// Bets and matches for a single round.
#[derive(Debug, Clone)]
pub struct BetBook {
    round_id: RoundId,
    /// Arena of bets in first-placement order.
    bets: Vec<Bet>,
    /// `(account, side) -> index into bets`.
    index: HashMap<(AccountId, Side), usize>,
    /// Append-only fills.
    matches: Vec<Match>,
    /// Once frozen, no stake is accepted.
    frozen: bool,
}

impl BetBook {
    #[must_use]
    pub fn new(round_id: RoundId) -> Self {
        Self {
            round_id,
            bets: Vec::new(),
            index: HashMap::new(),
            matches: Vec::new(),
            frozen: false,
        }
    }

    #[must_use]
    pub fn round_id(&self) -> RoundId {
        self.round_id
    }

    // =================================================================
    // Staking
    // =================================================================

    /// Accumulate `amount` onto the account's bet for `side`.
    ///
    /// The caller has already taken the funds; this only records them.
    ///
    /// # Errors
    /// - `BettingClosed` once the book is frozen
    /// - `AmountOutOfRange` for a zero stake
    pub fn stake(&mut self, account: &AccountId, side: Side, amount: Amount) -> Result<&Bet> {
        if self.frozen {
            // A frozen book is only ever observed on the way into PROCESSING_BETS.
            return Err(SpinmatchError::BettingClosed {
                phase: RoundPhase::ProcessingBets,
            });
        }
        if amount == 0 {
            return Err(SpinmatchError::AmountOutOfRange {
                amount,
                min: 1,
                max: Amount::MAX,
            });
        }

        let key = (account.clone(), side);
        let idx = match self.index.get(&key) {
            Some(&idx) => {
                let bet = &mut self.bets[idx];
                bet.staked = bet
                    .staked
                    .checked_add(amount)
                    .ok_or_else(|| SpinmatchError::BalanceOverflow(account.clone()))?;
                idx
            }
            None => {
                let idx = self.bets.len();
                self.bets
                    .push(Bet::new(account.clone(), self.round_id, side, amount));
                self.index.insert(key, idx);
                idx
            }
        };
        Ok(&self.bets[idx])
    }

    /// Stop accepting stakes. Idempotent.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Mark every bet terminal (CLEANUP).
    pub fn mark_processed(&mut self) {
        self.frozen = true;
        for bet in &mut self.bets {
            bet.processed = true;
        }
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn bet(&self, account: &AccountId, side: Side) -> Option<&Bet> {
        self.index
            .get(&(account.clone(), side))
            .map(|&idx| &self.bets[idx])
    }

    #[must_use]
    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    #[must_use]
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    /// Staked and matched totals per side.
    #[must_use]
    pub fn totals(&self) -> (SideTotals, SideTotals) {
        SideTotals::staked_and_matched(&self.bets)
    }

    /// Sum of every stake in the book.
    #[must_use]
    pub fn total_staked(&self) -> Amount {
        self.bets.iter().map(|b| b.staked).sum()
    }

    /// `(arena index, remaining)` for every bet on `side` with something left.
    pub(crate) fn unmatched(&self, side: Side) -> Vec<(usize, Amount)> {
        self.bets
            .iter()
            .enumerate()
            .filter(|(_, bet)| bet.side == side && bet.remaining() > 0)
            .map(|(idx, bet)| (idx, bet.remaining()))
            .collect()
    }

    pub(crate) fn bet_at(&self, idx: usize) -> &Bet {
        &self.bets[idx]
    }

    /// Record a fill of `amount` between the bets at `a` and `b`.
    ///
    /// The caller guarantees opposite sides, different accounts and
    /// `amount <= remaining` on both.
    pub(crate) fn apply_fill(&mut self, a: usize, b: usize, amount: Amount) -> &Match {
        debug_assert!(amount > 0);
        debug_assert!(amount <= self.bets[a].remaining());
        debug_assert!(amount <= self.bets[b].remaining());

        self.bets[a].matched += amount;
        self.bets[b].matched += amount;

        let seq = self.matches.len() as u64;
        let (bet_a, bet_b) = (&self.bets[a], &self.bets[b]);
        self.matches.push(Match {
            id: MatchId::deterministic(self.round_id, seq),
            round_id: self.round_id,
            account_a: bet_a.account.clone(),
            side_a: bet_a.side,
            account_b: bet_b.account.clone(),
            side_b: bet_b.side,
            amount,
            matched_at: Utc::now(),
        });
        // Just pushed.
        &self.matches[self.matches.len() - 1]
    }

    /// Snapshot the book into a persistable record body.
    #[must_use]
    pub fn to_record(&self, round: Round, match_root: Option<String>) -> RoundRecord {
        RoundRecord {
            round,
            bets: self.bets.clone(),
            matches: self.matches.clone(),
            match_root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(name: &str) -> AccountId {
        AccountId::new(name)
    }

    #[test]
    fn repeat_stakes_accumulate() {
        let mut book = BetBook::new(RoundId(1));
        book.stake(&acct("alice"), Side::Red, 100).unwrap();
        book.stake(&acct("alice"), Side::Red, 50).unwrap();
        assert_eq!(book.bets().len(), 1);
        assert_eq!(book.bet(&acct("alice"), Side::Red).unwrap().staked, 150);
    }

    #[test]
    fn same_account_both_sides_are_separate_bets() {
        let mut book = BetBook::new(RoundId(1));
        book.stake(&acct("alice"), Side::Red, 100).unwrap();
        book.stake(&acct("alice"), Side::Black, 40).unwrap();
        assert_eq!(book.bets().len(), 2);
        let (staked, _) = book.totals();
        assert_eq!(staked, SideTotals { red: 100, black: 40 });
    }

    #[test]
    fn frozen_book_rejects_stakes() {
        let mut book = BetBook::new(RoundId(1));
        book.freeze();
        let err = book.stake(&acct("alice"), Side::Red, 100).unwrap_err();
        assert!(matches!(err, SpinmatchError::BettingClosed { .. }));
        assert!(book.is_empty());
    }

    #[test]
    fn zero_stake_rejected() {
        let mut book = BetBook::new(RoundId(1));
        assert!(book.stake(&acct("alice"), Side::Red, 0).is_err());
    }

    #[test]
    fn unmatched_lists_only_remaining() {
        let mut book = BetBook::new(RoundId(2));
        book.stake(&acct("a"), Side::Red, 100).unwrap();
        book.stake(&acct("b"), Side::Black, 60).unwrap();
        book.apply_fill(0, 1, 60);
        assert_eq!(book.unmatched(Side::Red), vec![(0, 40)]);
        assert!(book.unmatched(Side::Black).is_empty());
    }

    #[test]
    fn apply_fill_records_match() {
        let mut book = BetBook::new(RoundId(2));
        book.stake(&acct("a"), Side::Red, 100).unwrap();
        book.stake(&acct("b"), Side::Black, 100).unwrap();
        let m = book.apply_fill(0, 1, 100).clone();
        assert_eq!(m.amount, 100);
        assert_eq!(m.id, MatchId::deterministic(RoundId(2), 0));
        assert_eq!(m.side_b, m.side_a.opposite());
        assert!(book.bets().iter().all(Bet::is_fully_matched));
    }

    #[test]
    fn mark_processed_freezes_and_flags() {
        let mut book = BetBook::new(RoundId(3));
        book.stake(&acct("a"), Side::Red, 10).unwrap();
        book.mark_processed();
        assert!(book.is_frozen());
        assert!(book.bets().iter().all(|b| b.processed));
    }

    #[test]
    fn to_record_carries_bets_and_matches() {
        let mut book = BetBook::new(RoundId(5));
        book.stake(&acct("a"), Side::Red, 10).unwrap();
        let record = book.to_record(Round::new(RoundId(5)), None);
        assert_eq!(record.bets.len(), 1);
        assert!(record.matches.is_empty());
        assert_eq!(record.round.id, RoundId(5));
    }
}
