//! Settlement planning.
//!
//! Turns a round's bets, matches and outcome into the list of credits the
//! processor will post. Pure: no ledger access.
//!
//! ```text
//! refund(bet)   = bet.staked - bet.matched            (no fee)
//! payout(match) = floor(match.amount * 2 * (1 - fee)) (to the winning side)
//! ```

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use spinmatch_types::{
    AccountId, Amount, Bet, EntryKind, Match, Outcome, Result, RoundId, SpinmatchError, constants,
};

/// One credit to post during settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    pub account: AccountId,
    pub amount: Amount,
    pub kind: EntryKind,
}

/// Every credit a round owes, with running totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    pub round_id: RoundId,
    /// `None` for a voided round.
    pub outcome: Option<Outcome>,
    pub credits: Vec<Credit>,
    pub total_refunded: Amount,
    pub total_paid: Amount,
}

impl SettlementPlan {
    fn empty(round_id: RoundId, outcome: Option<Outcome>) -> Self {
        Self {
            round_id,
            outcome,
            credits: Vec::new(),
            total_refunded: 0,
            total_paid: 0,
        }
    }

    fn push(&mut self, account: &AccountId, amount: Amount, kind: EntryKind) {
        if amount == 0 {
            return;
        }
        match kind {
            EntryKind::Payout => self.total_paid += amount,
            _ => self.total_refunded += amount,
        }
        self.credits.push(Credit {
            account: account.clone(),
            amount,
            kind,
        });
    }

    /// Sum of every planned credit.
    #[must_use]
    pub fn total_credited(&self) -> Amount {
        self.total_refunded + self.total_paid
    }
}

/// Amount credited to the winner of a match of `amount`.
///
/// # Errors
/// `SettlementFailure` if the result does not fit an [`Amount`].
pub fn winning_payout(amount: Amount, fee: Decimal) -> Result<Amount> {
    let gross = Decimal::from(amount) * Decimal::from(constants::PAYOUT_MULTIPLIER);
    (gross * (Decimal::ONE - fee))
        .floor()
        .to_u64()
        .ok_or_else(|| SpinmatchError::SettlementFailure {
            reason: format!("payout for {amount} at fee {fee} out of range"),
        })
}

/// Plan the settlement of a completed round.
///
/// Unmatched remainders come back first, in bet order, then one payout per
/// match in fill order.
///
/// # Errors
/// `SettlementFailure` if a payout cannot be represented.
pub fn plan_settlement(
    round_id: RoundId,
    outcome: Outcome,
    bets: &[Bet],
    matches: &[Match],
    fee: Decimal,
) -> Result<SettlementPlan> {
    let mut plan = SettlementPlan::empty(round_id, Some(outcome));

    for bet in bets {
        plan.push(&bet.account, bet.remaining(), EntryKind::Refund);
    }
    for m in matches {
        let payout = winning_payout(m.amount, fee)?;
        plan.push(m.winner(outcome), payout, EntryKind::Payout);
    }
    Ok(plan)
}

/// Plan the voiding of a round: every stake is returned in full.
#[must_use]
pub fn plan_void(round_id: RoundId, bets: &[Bet]) -> SettlementPlan {
    let mut plan = SettlementPlan::empty(round_id, None);
    for bet in bets {
        plan.push(&bet.account, bet.staked, EntryKind::Refund);
    }
    plan
}
