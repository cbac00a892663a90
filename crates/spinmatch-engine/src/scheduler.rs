//! Phase timers.
//!
//! Each timer is a spawned task that sleeps and then posts a
//! [`Command::Timer`] back to the driver. Timers belong to the phase that
//! scheduled them: [`Scheduler::cancel_all`] aborts them and bumps the
//! generation, so an expiry already sitting in the command queue is
//! recognised as stale and dropped.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::driver::Command;

/// What a timer expiry means to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// One second of the betting countdown elapsed.
    CountdownTick,
    SpinDelay,
    DisplayDelay,
    /// Backoff before another recovery attempt.
    RecoveryBackoff,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Owns the timers of the current phase.
///
/// Holds only a weak sender so pending timers never keep the engine alive
/// once every handle is gone.
pub(crate) struct Scheduler {
    commands: mpsc::WeakSender<Command>,
    generation: u64,
    tasks: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub(crate) fn new(commands: mpsc::WeakSender<Command>) -> Self {
        Self {
            commands,
            generation: 0,
            tasks: Vec::new(),
        }
    }

    /// Post `kind` to the driver after `delay`.
    pub(crate) fn schedule(&mut self, kind: TimerKind, delay: Duration) {
        self.tasks.retain(|task| !task.is_finished());

        let generation = self.generation;
        let commands = self.commands.clone();
        trace!(%kind, generation, delay_ms = delay.as_millis(), "timer scheduled");
        self.tasks.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(commands) = commands.upgrade() {
                let _ = commands.send(Command::Timer { kind, generation }).await;
            }
        }));
    }

    /// Abort every pending timer and invalidate queued expiries.
    pub(crate) fn cancel_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.generation += 1;
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_finished()).count()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
