//! System-wide constants for the SpinMatch round engine.

/// Lowest number the wheel can land on.
pub const MIN_OUTCOME: u8 = 1;

/// Highest number the wheel can land on.
pub const MAX_OUTCOME: u8 = 36;

/// Connected players required before a round opens betting.
pub const DEFAULT_MIN_PLAYERS: usize = 2;

/// Default betting window, in seconds.
pub const DEFAULT_BETTING_WINDOW_SECS: u32 = 30;

/// Default spin animation delay in milliseconds.
pub const DEFAULT_SPIN_DELAY_MS: u64 = 4000;

/// Default results display delay in milliseconds.
pub const DEFAULT_RESULTS_DISPLAY_MS: u64 = 5000;

/// Default settlement fee in basis points (2.5%).
pub const DEFAULT_SETTLEMENT_FEE_BPS: i64 = 250;

/// Smallest accepted stake.
pub const DEFAULT_MIN_BET: u64 = 10;

/// Largest accepted stake per placement.
pub const DEFAULT_MAX_BET: u64 = 1000;

/// Number of recent outcomes kept for the snapshot.
pub const DEFAULT_HISTORY_LEN: usize = 10;

/// Consecutive recovery failures tolerated before backing off.
pub const DEFAULT_MAX_RECOVERY_ATTEMPTS: u32 = 3;

/// Delay before retrying recovery after backing off, in milliseconds.
pub const DEFAULT_RECOVERY_BACKOFF_MS: u64 = 5000;

/// Capacity of the engine's command queue.
pub const DEFAULT_COMMAND_QUEUE_DEPTH: usize = 1024;

/// Winning side receives this multiple of the matched amount, before fees.
pub const PAYOUT_MULTIPLIER: u64 = 2;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "SpinMatch";
