//! Round settlement against the ledger.
//!
//! For one round, atomically:
//! 1. Check the settle-once guard
//! 2. Plan refunds and payouts
//! 3. Check the plan against the conservation law
//! 4. Post every credit inside one ledger transaction
//! 5. Commit, then mark the round settled
//!
//! Any failure in steps 4-5 rolls back the whole transaction and leaves the
//! round unsettled, so it can still be voided during recovery.

use std::sync::Arc;

use rust_decimal::Decimal;
use spinmatch_ledger::Ledger;
use spinmatch_types::{Amount, Bet, Match, Outcome, Result, RoundId, SpinmatchError};
use tracing::{info, warn};

use crate::conservation::RoundConservation;
use crate::idempotency::SettleOnceGuard;
use crate::payout::{SettlementPlan, plan_settlement, plan_void};

/// Rounds remembered by the settle-once guard.
const SETTLED_WINDOW: usize = 1024;

/// Totals of a posted settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReport {
    pub round_id: RoundId,
    pub outcome: Option<Outcome>,
    pub refunded: Amount,
    pub paid: Amount,
    pub credits: usize,
}

/// Posts round settlements and voids to the ledger.
pub struct SettlementProcessor {
    ledger: Arc<dyn Ledger>,
    fee: Decimal,
    guard: SettleOnceGuard,
}

impl SettlementProcessor {
    #[must_use]
    pub fn new(ledger: Arc<dyn Ledger>, fee: Decimal) -> Self {
        Self {
            ledger,
            fee,
            guard: SettleOnceGuard::new(SETTLED_WINDOW),
        }
    }

    #[must_use]
    pub fn is_settled(&self, round_id: RoundId) -> bool {
        self.guard.is_settled(round_id)
    }

    /// Settle a round whose outcome has been revealed.
    ///
    /// # Errors
    /// - `RoundAlreadySettled` on a second call for the same round
    /// - `SettlementFailure` for a conservation violation or any ledger error;
    ///   no credit is applied in that case
    pub async fn settle(
        &mut self,
        round_id: RoundId,
        outcome: Outcome,
        bets: &[Bet],
        matches: &[Match],
    ) -> Result<SettlementReport> {
        if self.guard.is_settled(round_id) {
            return Err(SpinmatchError::RoundAlreadySettled(round_id));
        }

        let plan = plan_settlement(round_id, outcome, bets, matches, self.fee)?;
        let mut check = RoundConservation::for_settlement(round_id, bets, matches, self.fee)?;
        check.record_credit(plan.total_credited());
        check.verify().map_err(|e| SpinmatchError::SettlementFailure {
            reason: e.to_string(),
        })?;

        self.post(&plan).await?;
        self.guard.mark_settled(round_id)?;

        info!(
            round = %round_id,
            outcome = outcome.number(),
            color = %outcome.side(),
            refunded = plan.total_refunded,
            paid = plan.total_paid,
            retained = check.debited() - check.credited(),
            "round settled"
        );
        Ok(Self::report(&plan))
    }

    /// Refund every stake of a round that will not be settled.
    ///
    /// # Errors
    /// - `RoundAlreadySettled` if the round's funds were already posted
    /// - `SettlementFailure` on any ledger error, with nothing applied
    pub async fn void_round(&mut self, round_id: RoundId, bets: &[Bet]) -> Result<SettlementReport> {
        if self.guard.is_settled(round_id) {
            return Err(SpinmatchError::RoundAlreadySettled(round_id));
        }

        let plan = plan_void(round_id, bets);
        let mut check = RoundConservation::for_void(round_id, bets);
        check.record_credit(plan.total_credited());
        check.verify().map_err(|e| SpinmatchError::SettlementFailure {
            reason: e.to_string(),
        })?;

        self.post(&plan).await?;
        self.guard.mark_settled(round_id)?;

        info!(round = %round_id, refunded = plan.total_refunded, "round voided");
        Ok(Self::report(&plan))
    }

    async fn post(&self, plan: &SettlementPlan) -> Result<()> {
        let failed = |e: SpinmatchError| SpinmatchError::SettlementFailure {
            reason: format!("{}: {e}", plan.round_id),
        };

        let mut tx = self.ledger.begin().await.map_err(failed)?;
        for credit in &plan.credits {
            if let Err(e) = tx
                .credit(&credit.account, credit.amount, credit.kind, Some(plan.round_id))
                .await
            {
                warn!(
                    round = %plan.round_id,
                    account = %credit.account,
                    error = %e,
                    "credit failed, rolling back settlement"
                );
                tx.rollback().await.map_err(failed)?;
                return Err(failed(e));
            }
        }
        tx.commit().await.map_err(failed)
    }

    fn report(plan: &SettlementPlan) -> SettlementReport {
        SettlementReport {
            round_id: plan.round_id,
            outcome: plan.outcome,
            refunded: plan.total_refunded,
            paid: plan.total_paid,
            credits: plan.credits.len(),
        }
    }
}
