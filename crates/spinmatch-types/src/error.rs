//! Error types for the SpinMatch round engine.
//!
//! All errors use the `SM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Bet placement errors (user-facing, never escalate)
//! - 2xx: Ledger / store errors
//! - 4xx: Round lifecycle errors
//! - 5xx: Matching errors
//! - 6xx: Settlement errors (fatal to the round)
//! - 7xx: Recovery errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{AccountId, Amount, RoundId, RoundPhase};

/// Central error enum for all SpinMatch operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpinmatchError {
    // =================================================================
    // Bet Placement Errors (1xx)
    // =================================================================
    /// A stake arrived outside BETTING_OPEN, or after the countdown hit zero.
    #[error("SM_ERR_100: Betting is currently closed (phase {phase})")]
    BettingClosed { phase: RoundPhase },

    /// Stake outside the configured min/max.
    #[error("SM_ERR_101: Amount {amount} out of range [{min}, {max}]")]
    AmountOutOfRange {
        amount: Amount,
        min: Amount,
        max: Amount,
    },

    /// The ledger refused the debit.
    #[error("SM_ERR_102: Insufficient balance: need {needed}, have {available}")]
    InsufficientFunds { needed: Amount, available: Amount },

    /// Side label was neither red nor black.
    #[error("SM_ERR_103: Invalid side: {0:?}")]
    InvalidSide(String),

    // =================================================================
    // Ledger / Store Errors (2xx)
    // =================================================================
    #[error("SM_ERR_200: Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The ledger backend failed or refused the unit of work.
    #[error("SM_ERR_201: Ledger unavailable: {reason}")]
    LedgerUnavailable { reason: String },

    /// The round store failed to read or write a record.
    #[error("SM_ERR_202: Round store failure: {reason}")]
    StoreFailure { reason: String },

    /// A credit would overflow the account balance.
    #[error("SM_ERR_203: Balance overflow for {0}")]
    BalanceOverflow(AccountId),

    // =================================================================
    // Round Errors (4xx)
    // =================================================================
    /// The state machine was asked for an edge that does not exist.
    #[error("SM_ERR_400: Invalid transition {from} -> {to}")]
    InvalidTransition { from: RoundPhase, to: RoundPhase },

    #[error("SM_ERR_401: Round not found: {0}")]
    RoundNotFound(RoundId),

    /// Drawn number outside 1–36.
    #[error("SM_ERR_402: Outcome {0} out of range")]
    OutcomeOutOfRange(u8),

    /// The round reached a phase that needs an outcome without one.
    #[error("SM_ERR_403: Round {0} has no outcome")]
    MissingOutcome(RoundId),

    // =================================================================
    // Matching Errors (5xx)
    // =================================================================
    #[error("SM_ERR_500: Matching failed: {reason}")]
    MatchingFailed { reason: String },

    // =================================================================
    // Settlement Errors (6xx)
    // =================================================================
    /// A ledger operation failed mid-payout; the whole settlement rolled back.
    #[error("SM_ERR_600: Settlement failed: {reason}")]
    SettlementFailure { reason: String },

    /// Settle-once guard tripped.
    #[error("SM_ERR_601: Round already settled: {0}")]
    RoundAlreadySettled(RoundId),

    /// Planned credits break the fee-adjusted conservation law.
    #[error("SM_ERR_602: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // Recovery Errors (7xx)
    // =================================================================
    /// No resumable round found, or voiding the failed round failed.
    #[error("SM_ERR_700: Recovery failed: {reason}")]
    RecoveryFailure { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    #[error("SM_ERR_900: Internal error: {0}")]
    Internal(String),

    #[error("SM_ERR_901: Serialization error: {0}")]
    Serialization(String),

    #[error("SM_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// The engine task is gone; commands can no longer be delivered.
    #[error("SM_ERR_903: Engine stopped")]
    EngineStopped,
}

impl SpinmatchError {
    /// Message shown to the player whose request failed.
    ///
    /// The three placement rejections map to fixed phrases; everything else
    /// falls back to the full coded message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::BettingClosed { .. } => "Betting is currently closed".to_string(),
            Self::InsufficientFunds { .. } => "Insufficient balance".to_string(),
            Self::AmountOutOfRange { .. } => "Amount out of range".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this error only rejects a single request and leaves the
    /// round untouched.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::BettingClosed { .. }
                | Self::AmountOutOfRange { .. }
                | Self::InsufficientFunds { .. }
                | Self::InvalidSide(_)
                | Self::AccountNotFound(_)
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SpinmatchError>;

impl From<serde_json::Error> for SpinmatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_for_rejections() {
        let closed = SpinmatchError::BettingClosed {
            phase: RoundPhase::Spinning,
        };
        assert_eq!(closed.user_message(), "Betting is currently closed");

        let funds = SpinmatchError::InsufficientFunds {
            needed: 100,
            available: 5,
        };
        assert_eq!(funds.user_message(), "Insufficient balance");

        let range = SpinmatchError::AmountOutOfRange {
            amount: 5,
            min: 10,
            max: 1000,
        };
        assert_eq!(range.user_message(), "Amount out of range");
    }

    #[test]
    fn other_errors_keep_coded_message() {
        let err = SpinmatchError::SettlementFailure {
            reason: "ledger timeout".into(),
        };
        assert_eq!(err.user_message(), "SM_ERR_600: Settlement failed: ledger timeout");
        assert!(!err.is_rejection());
    }

    #[test]
    fn betting_closed_display_names_phase() {
        let err = SpinmatchError::BettingClosed {
            phase: RoundPhase::ProcessingBets,
        };
        let msg = format!("{err}");
        assert!(msg.contains("SM_ERR_100"));
        assert!(msg.contains("PROCESSING_BETS"));
    }

    #[test]
    fn all_errors_have_sm_err_prefix() {
        let errors = vec![
            SpinmatchError::InvalidSide("green".into()),
            SpinmatchError::LedgerUnavailable { reason: "x".into() },
            SpinmatchError::InvalidTransition {
                from: RoundPhase::Spinning,
                to: RoundPhase::BettingOpen,
            },
            SpinmatchError::RoundAlreadySettled(RoundId(4)),
            SpinmatchError::RecoveryFailure { reason: "y".into() },
            SpinmatchError::EngineStopped,
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(msg.starts_with("SM_ERR_"), "Error missing SM_ERR_ prefix: {msg}");
        }
    }
}
