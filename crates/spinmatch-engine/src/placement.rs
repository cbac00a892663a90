//! Bet placement gate.
//!
//! Every stake passes the same checks, in order, before any funds move:
//! 1. The round is in BETTING_OPEN, the countdown has not hit zero and the
//!    bet book is not frozen
//! 2. The amount is within the configured limits
//! 3. The ledger debit commits
//!
//! Only then is the stake written to the bet book and matched against the
//! opposite side. A rejection at any step leaves both ledger and book as
//! they were.

use spinmatch_ledger::Ledger;
use spinmatch_matchcore::{BetBook, run_matching_pass};
use spinmatch_types::{
    AccountId, Amount, Bet, EngineConfig, EntryKind, Match, Result, RoundPhase, Side,
    SpinmatchError,
};
use tracing::debug;

/// Reject stakes outside the betting window.
///
/// # Errors
/// `BettingClosed` naming the phase the stake arrived in.
pub fn check_window(phase: RoundPhase, countdown: u32, frozen: bool) -> Result<()> {
    if !phase.accepts_bets() {
        return Err(SpinmatchError::BettingClosed { phase });
    }
    if countdown == 0 || frozen {
        return Err(SpinmatchError::BettingClosed {
            phase: RoundPhase::ProcessingBets,
        });
    }
    Ok(())
}

/// # Errors
/// `AmountOutOfRange` outside `[min_bet, max_bet]`.
pub fn check_amount(amount: Amount, config: &EngineConfig) -> Result<()> {
    if amount < config.min_bet || amount > config.max_bet {
        return Err(SpinmatchError::AmountOutOfRange {
            amount,
            min: config.min_bet,
            max: config.max_bet,
        });
    }
    Ok(())
}

/// Result of an accepted stake.
#[derive(Debug, Clone)]
pub struct Placement {
    /// The account's bet on that side after matching.
    pub bet: Bet,
    /// Matches formed by the incremental pass.
    pub matches: Vec<Match>,
}

/// Debit the stake and record it, then match it against the opposite side.
///
/// The caller has already run [`check_window`] and [`check_amount`].
///
/// # Errors
/// `InsufficientFunds`, `AccountNotFound` or any ledger error. Nothing is
/// written to the book in that case.
pub async fn execute(
    ledger: &dyn Ledger,
    book: &mut BetBook,
    account: &AccountId,
    side: Side,
    amount: Amount,
) -> Result<Placement> {
    let round_id = book.round_id();

    let mut tx = ledger.begin().await?;
    if let Err(e) = tx
        .debit(account, amount, EntryKind::Stake, Some(round_id))
        .await
    {
        tx.rollback().await?;
        return Err(e);
    }
    tx.commit().await?;

    book.stake(account, side, amount)?;
    let matches = run_matching_pass(book, side);

    let bet = book
        .bet(account, side)
        .cloned()
        .ok_or_else(|| SpinmatchError::Internal(format!("bet for {account} vanished")))?;

    debug!(
        round = %round_id,
        %account,
        %side,
        amount,
        staked = bet.staked,
        matched = bet.matched,
        new_matches = matches.len(),
        "stake accepted"
    );
    Ok(Placement { bet, matches })
}
