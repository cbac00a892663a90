//! Engine configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides. Call [`EngineConfig::validate`] after loading.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Amount, Result, SpinmatchError, constants};

/// Tunables for the round engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Connected players needed before betting opens.
    pub min_players: usize,
    /// Length of the betting window in seconds.
    pub betting_window_secs: u32,
    /// Hold in SPINNING before the outcome is revealed.
    pub spin_delay_ms: u64,
    /// Hold in RESULTS before cleanup.
    pub results_display_ms: u64,
    /// Fraction withheld from each winning payout, in `[0, 1)`.
    pub settlement_fee: Decimal,
    pub min_bet: Amount,
    pub max_bet: Amount,
    /// Recent outcomes kept for the snapshot.
    pub history_len: usize,
    /// Consecutive failed recoveries before backing off.
    pub max_recovery_attempts: u32,
    pub recovery_backoff_ms: u64,
    pub command_queue_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_players: constants::DEFAULT_MIN_PLAYERS,
            betting_window_secs: constants::DEFAULT_BETTING_WINDOW_SECS,
            spin_delay_ms: constants::DEFAULT_SPIN_DELAY_MS,
            results_display_ms: constants::DEFAULT_RESULTS_DISPLAY_MS,
            settlement_fee: Decimal::new(constants::DEFAULT_SETTLEMENT_FEE_BPS, 4),
            min_bet: constants::DEFAULT_MIN_BET,
            max_bet: constants::DEFAULT_MAX_BET,
            history_len: constants::DEFAULT_HISTORY_LEN,
            max_recovery_attempts: constants::DEFAULT_MAX_RECOVERY_ATTEMPTS,
            recovery_backoff_ms: constants::DEFAULT_RECOVERY_BACKOFF_MS,
            command_queue_depth: constants::DEFAULT_COMMAND_QUEUE_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Reject configurations the engine cannot run with.
    ///
    /// # Errors
    /// Returns [`SpinmatchError::Configuration`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(SpinmatchError::Configuration(msg));

        if self.min_players == 0 {
            return fail("min_players must be at least 1".into());
        }
        if self.betting_window_secs == 0 {
            return fail("betting_window_secs must be positive".into());
        }
        if self.min_bet == 0 {
            return fail("min_bet must be positive".into());
        }
        if self.min_bet > self.max_bet {
            return fail(format!(
                "min_bet {} exceeds max_bet {}",
                self.min_bet, self.max_bet
            ));
        }
        if self.settlement_fee.is_sign_negative() || self.settlement_fee >= Decimal::ONE {
            return fail(format!(
                "settlement_fee must be in [0, 1), got {}",
                self.settlement_fee
            ));
        }
        if self.history_len == 0 {
            return fail("history_len must be positive".into());
        }
        if self.command_queue_depth == 0 {
            return fail("command_queue_depth must be positive".into());
        }
        Ok(())
    }

    #[must_use]
    pub fn spin_delay(&self) -> Duration {
        Duration::from_millis(self.spin_delay_ms)
    }

    #[must_use]
    pub fn results_display(&self) -> Duration {
        Duration::from_millis(self.results_display_ms)
    }

    #[must_use]
    pub fn recovery_backoff(&self) -> Duration {
        Duration::from_millis(self.recovery_backoff_ms)
    }

    /// Total wall-clock length of one round once betting opens.
    #[must_use]
    pub fn round_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.betting_window_secs))
            + self.spin_delay()
            + self.results_display()
    }
}
