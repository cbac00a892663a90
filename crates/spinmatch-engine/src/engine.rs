//! Public handle to a running engine.

use std::sync::Arc;

use spinmatch_ledger::{Ledger, RoundStore};
use spinmatch_types::{AccountId, Amount, Bet, EngineConfig, GameState, Result, Side, SpinmatchError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::draw::OutcomeSource;
use crate::driver::{Command, Driver, Ports};
use crate::publisher::EngineEvent;

/// Cheap, cloneable handle to the engine task.
///
/// The task stops on [`EngineHandle::shutdown`] or once every handle has
/// been dropped.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
}

impl EngineHandle {
    /// Validate `config` and start the engine on the current runtime.
    ///
    /// # Errors
    /// `Configuration` if `config` is rejected.
    pub fn spawn(
        config: EngineConfig,
        ledger: Arc<dyn Ledger>,
        store: Arc<dyn RoundStore>,
        draw: Box<dyn OutcomeSource>,
    ) -> Result<(Self, JoinHandle<()>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.command_queue_depth);
        let driver = Driver::new(
            config,
            Ports {
                ledger,
                store,
                draw,
            },
            rx,
            tx.downgrade(),
        );
        let task = tokio::spawn(driver.run());
        Ok((Self { commands: tx }, task))
    }

    /// Stake `amount` on `side` for the open round.
    ///
    /// Returns the account's bet on that side after incremental matching.
    ///
    /// # Errors
    /// - `BettingClosed` outside BETTING_OPEN or once the countdown hits zero
    /// - `AmountOutOfRange`, `InsufficientFunds`, `AccountNotFound`
    /// - `EngineStopped` if the engine is gone
    pub async fn place_bet(&self, account: AccountId, side: Side, amount: Amount) -> Result<Bet> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::PlaceBet {
            account,
            side,
            amount,
            reply,
        })
        .await?;
        rx.await.map_err(|_| SpinmatchError::EngineStopped)?
    }

    pub async fn connect(&self, account: AccountId) -> Result<()> {
        self.send(Command::Connect { account }).await
    }

    pub async fn disconnect(&self, account: AccountId) -> Result<()> {
        self.send(Command::Disconnect { account }).await
    }

    /// Current game state as an observer would see it.
    pub async fn snapshot(&self) -> Result<GameState> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| SpinmatchError::EngineStopped)
    }

    /// Register an observer. The first event is the current game state.
    pub async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<EngineEvent>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Subscribe { reply }).await?;
        rx.await.map_err(|_| SpinmatchError::EngineStopped)
    }

    /// Ask the engine to stop after the command in progress.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SpinmatchError::EngineStopped)
    }
}
