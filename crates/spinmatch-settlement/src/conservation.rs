//! Fee-adjusted conservation check.
//!
//! Per settled round:
//! ```text
//! credits <= debits
//! debits - credits == Σ over matches of (2 * amount - payout(amount))
//! ```
//!
//! For a voided round the retained amount is zero: every debit comes back.
//! A plan that breaks either law is never posted.

use rust_decimal::Decimal;
use spinmatch_types::{Amount, Bet, Match, Result, RoundId, SpinmatchError, constants};

use crate::payout::winning_payout;

/// Debit, credit and expected-retained totals for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundConservation {
    round_id: RoundId,
    debited: u128,
    credited: u128,
    expected_retained: u128,
}

impl RoundConservation {
    #[must_use]
    pub fn new(round_id: RoundId) -> Self {
        Self {
            round_id,
            debited: 0,
            credited: 0,
            expected_retained: 0,
        }
    }

    /// Totals for a round about to be settled: debits are the stakes, the
    /// expected retention is the fee on every match.
    ///
    /// # Errors
    /// Propagates payout range errors.
    pub fn for_settlement(
        round_id: RoundId,
        bets: &[Bet],
        matches: &[Match],
        fee: Decimal,
    ) -> Result<Self> {
        let mut check = Self::new(round_id);
        for bet in bets {
            check.record_debit(bet.staked);
        }
        for m in matches {
            let gross = u128::from(m.amount) * u128::from(constants::PAYOUT_MULTIPLIER);
            let payout = u128::from(winning_payout(m.amount, fee)?);
            check.expect_retained(gross.saturating_sub(payout));
        }
        Ok(check)
    }

    /// Totals for a round about to be voided.
    #[must_use]
    pub fn for_void(round_id: RoundId, bets: &[Bet]) -> Self {
        let mut check = Self::new(round_id);
        for bet in bets {
            check.record_debit(bet.staked);
        }
        check
    }

    pub fn record_debit(&mut self, amount: Amount) {
        self.debited += u128::from(amount);
    }

    pub fn record_credit(&mut self, amount: Amount) {
        self.credited += u128::from(amount);
    }

    pub fn expect_retained(&mut self, amount: u128) {
        self.expected_retained += amount;
    }

    #[must_use]
    pub fn debited(&self) -> u128 {
        self.debited
    }

    #[must_use]
    pub fn credited(&self) -> u128 {
        self.credited
    }

    /// # Errors
    /// [`SpinmatchError::ConservationViolation`] naming the broken law.
    pub fn verify(&self) -> Result<()> {
        if self.credited > self.debited {
            return Err(SpinmatchError::ConservationViolation {
                reason: format!(
                    "{}: credits {} exceed debits {}",
                    self.round_id, self.credited, self.debited
                ),
            });
        }
        let retained = self.debited - self.credited;
        if retained != self.expected_retained {
            return Err(SpinmatchError::ConservationViolation {
                reason: format!(
                    "{}: retained {retained} != expected {} (debits={}, credits={})",
                    self.round_id, self.expected_retained, self.debited, self.credited
                ),
            });
        }
        Ok(())
    }
}
