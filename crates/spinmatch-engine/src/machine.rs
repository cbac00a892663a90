//! Round state machine.
//!
//! A pure function from `(phase, trigger, gate)` to the next phase and the
//! ordered effects the driver must run on entry. No I/O, no clock.
//!
//! ```text
//! INITIALIZING -> WAITING_FOR_PLAYERS -> BETTING_OPEN -> PROCESSING_BETS
//!   -> SPINNING -> RESULTS -> CLEANUP -> (BETTING_OPEN | WAITING_FOR_PLAYERS)
//!
//! any phase -> ERROR -> (WAITING_FOR_PLAYERS | INITIALIZING)
//! ```
//!
//! Triggers that do not apply to the current phase yield `None` and are
//! dropped by the driver.

use std::fmt;

use spinmatch_types::RoundPhase;

/// Something that happened to the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// The round was created and the engine is ready to take players.
    ConnectionEstablished,
    /// A player connected or disconnected, or the gate must be re-checked.
    PlayersChanged,
    /// The betting countdown reached zero.
    CountdownExpired,
    /// Matched amounts are final and persisted.
    BetsProcessed,
    /// The spin delay elapsed.
    SpinCompleted,
    /// The results display delay elapsed.
    DisplayTimeout,
    /// The finished round is archived.
    CleanupCompleted,
    /// An effect failed.
    Fault,
    RecoverySucceeded,
    RecoveryFailed,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Work the driver performs when entering a phase, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Abort every timer of the phase being left.
    CancelTimers,
    /// Start a fresh round with the next id and an empty bet book.
    CreateRound,
    /// Start the betting countdown.
    StartCountdown,
    /// Refuse further stakes.
    FreezeBets,
    /// Full matching pass over unmatched remainders.
    RunMatching,
    /// Save matched amounts in one batch.
    PersistBets,
    /// Draw the outcome without revealing it.
    DrawOutcome,
    ScheduleSpin,
    RevealOutcome,
    /// Post refunds and payouts in one ledger transaction.
    Settle,
    ScheduleDisplay,
    MarkProcessed,
    RecordHistory,
    ArchiveRound,
    /// Save the round with its error message.
    RecordFailure,
    /// Void the failed round and look for a resumable one.
    Recover,
    /// Broadcast a game-state snapshot.
    Publish,
    /// Feed another trigger back into the machine.
    Emit(Trigger),
}

/// Facts outside the phase that some edges depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gate {
    /// Connected players meet the configured minimum.
    pub players_ready: bool,
}

/// A legal phase change plus its entry effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: RoundPhase,
    pub to: RoundPhase,
    pub effects: Vec<Effect>,
}

/// Effects run once when the engine starts, before any trigger.
#[must_use]
pub fn startup_effects() -> Vec<Effect> {
    enter_initializing()
}

/// Resolve `trigger` in `phase`.
///
/// Returns `None` when the trigger does not apply. Every returned
/// transition is an edge of [`RoundPhase::can_transition_to`].
#[must_use]
pub fn transition(phase: RoundPhase, trigger: Trigger, gate: Gate) -> Option<Transition> {
    use RoundPhase as P;
    use Trigger as T;

    let (to, effects) = match (phase, trigger) {
        (P::Error, T::Fault) => return None,
        (_, T::Fault) => (
            P::Error,
            vec![
                Effect::CancelTimers,
                Effect::RecordFailure,
                Effect::Publish,
                Effect::Recover,
            ],
        ),

        (P::Initializing, T::ConnectionEstablished) => {
            (P::WaitingForPlayers, enter_waiting(gate, false))
        }

        (P::WaitingForPlayers, T::PlayersChanged) if gate.players_ready => (
            P::BettingOpen,
            vec![
                Effect::CancelTimers,
                Effect::StartCountdown,
                Effect::Publish,
            ],
        ),

        (P::BettingOpen, T::CountdownExpired) => (
            P::ProcessingBets,
            vec![
                Effect::CancelTimers,
                // Expiry: stop placements, then match what was taken.
                Effect::FreezeBets,
                Effect::RunMatching,
                // Processing: idempotent pass, then persist.
                Effect::RunMatching,
                Effect::PersistBets,
                Effect::Publish,
                Effect::Emit(T::BetsProcessed),
            ],
        ),

        (P::ProcessingBets, T::BetsProcessed) => (
            P::Spinning,
            vec![
                Effect::CancelTimers,
                Effect::DrawOutcome,
                Effect::Publish,
                Effect::ScheduleSpin,
            ],
        ),

        (P::Spinning, T::SpinCompleted) => (
            P::Results,
            vec![
                Effect::CancelTimers,
                Effect::RevealOutcome,
                Effect::Settle,
                Effect::Publish,
                Effect::ScheduleDisplay,
            ],
        ),

        (P::Results, T::DisplayTimeout) => (
            P::Cleanup,
            vec![
                Effect::CancelTimers,
                Effect::MarkProcessed,
                Effect::RecordHistory,
                Effect::ArchiveRound,
                Effect::Publish,
                Effect::Emit(T::CleanupCompleted),
            ],
        ),

        (P::Cleanup, T::CleanupCompleted) if gate.players_ready => (
            P::BettingOpen,
            vec![
                Effect::CancelTimers,
                Effect::CreateRound,
                Effect::StartCountdown,
                Effect::Publish,
            ],
        ),
        (P::Cleanup, T::CleanupCompleted) => (P::WaitingForPlayers, enter_waiting(gate, true)),

        (P::Error, T::RecoverySucceeded) => (P::WaitingForPlayers, enter_waiting(gate, true)),
        (P::Error, T::RecoveryFailed) => (P::Initializing, enter_initializing()),

        _ => return None,
    };

    debug_assert!(phase.can_transition_to(to), "{phase} -> {to}");
    Some(Transition {
        from: phase,
        to,
        effects,
    })
}

fn enter_initializing() -> Vec<Effect> {
    vec![
        Effect::CancelTimers,
        Effect::CreateRound,
        Effect::Publish,
        Effect::Emit(Trigger::ConnectionEstablished),
    ]
}

fn enter_waiting(gate: Gate, new_round: bool) -> Vec<Effect> {
    let mut effects = vec![Effect::CancelTimers];
    if new_round {
        effects.push(Effect::CreateRound);
    }
    effects.push(Effect::Publish);
    if gate.players_ready {
        // Threshold already met on entry.
        effects.push(Effect::Emit(Trigger::PlayersChanged));
    }
    effects
}
