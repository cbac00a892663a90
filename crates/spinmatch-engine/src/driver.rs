//! The engine task.
//!
//! A single task owns the round, the bet book, the timers and the observer
//! list. Every request arrives as a [`Command`] on one queue and is handled
//! to completion before the next is read, so a stake that arrives while a
//! transition is running waits behind it.
//!
//! Transitions come from [`machine::transition`]; the driver runs their
//! effects in order. An effect that fails stops the list and feeds
//! [`Trigger::Fault`] back in, which lands the round in ERROR.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use spinmatch_ledger::{Ledger, RoundStore};
use spinmatch_matchcore::{BetBook, match_root_hex, run_matching_pass};
use spinmatch_settlement::SettlementProcessor;
use spinmatch_types::{
    AccountId, Amount, Bet, EngineConfig, GameState, Match, Outcome, Result, Round, RoundId,
    RoundPhase, RoundRecord, Side, SideTotals, SpinmatchError,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::draw::OutcomeSource;
use crate::history::OutcomeHistory;
use crate::machine::{self, Effect, Gate, Trigger};
use crate::placement;
use crate::publisher::{EngineEvent, EventKind, MatchBatch, Publisher};
use crate::scheduler::{Scheduler, TimerKind};

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Requests to the engine task.
#[derive(Debug)]
pub(crate) enum Command {
    PlaceBet {
        account: AccountId,
        side: Side,
        amount: Amount,
        reply: oneshot::Sender<Result<Bet>>,
    },
    Connect {
        account: AccountId,
    },
    Disconnect {
        account: AccountId,
    },
    Snapshot {
        reply: oneshot::Sender<GameState>,
    },
    Subscribe {
        reply: oneshot::Sender<mpsc::UnboundedReceiver<EngineEvent>>,
    },
    Timer {
        kind: TimerKind,
        generation: u64,
    },
    Shutdown,
}

/// Collaborators the driver is built from.
pub(crate) struct Ports {
    pub(crate) ledger: Arc<dyn Ledger>,
    pub(crate) store: Arc<dyn RoundStore>,
    pub(crate) draw: Box<dyn OutcomeSource>,
}

pub(crate) struct Driver {
    config: EngineConfig,
    ledger: Arc<dyn Ledger>,
    store: Arc<dyn RoundStore>,
    draw: Box<dyn OutcomeSource>,
    settlement: SettlementProcessor,

    round: Round,
    book: BetBook,
    /// Drawn on entering SPINNING, hidden until RESULTS.
    pending_outcome: Option<Outcome>,
    history: OutcomeHistory,
    players: HashSet<AccountId>,
    next_round: RoundId,
    /// Recovery attempts since the last archived round.
    recovery_attempts: u32,

    scheduler: Scheduler,
    publisher: Publisher,
    commands: mpsc::Receiver<Command>,
}

impl Driver {
    pub(crate) fn new(
        config: EngineConfig,
        ports: Ports,
        commands: mpsc::Receiver<Command>,
        weak: mpsc::WeakSender<Command>,
    ) -> Self {
        let Ports {
            ledger,
            store,
            draw,
        } = ports;
        let settlement = SettlementProcessor::new(Arc::clone(&ledger), config.settlement_fee);
        let first = RoundId(1);
        Self {
            history: OutcomeHistory::new(config.history_len),
            config,
            ledger,
            store,
            draw,
            settlement,
            round: Round::new(first),
            book: BetBook::new(first),
            pending_outcome: None,
            players: HashSet::new(),
            next_round: first,
            recovery_attempts: 0,
            scheduler: Scheduler::new(weak),
            publisher: Publisher::new(),
            commands,
        }
    }

    /// Run until shut down or until every handle is dropped.
    pub(crate) async fn run(mut self) {
        self.resume_numbering().await;
        info!(
            first_round = %self.next_round,
            min_players = self.config.min_players,
            betting_window_secs = self.config.betting_window_secs,
            "engine started"
        );

        let mut queue = VecDeque::new();
        if self.run_effects(machine::startup_effects(), &mut queue).await {
            if let Err(e) = self.checkpoint().await {
                self.fault(&e, &mut queue);
            }
        }
        self.drive(queue).await;

        while let Some(command) = self.commands.recv().await {
            match command {
                Command::PlaceBet {
                    account,
                    side,
                    amount,
                    reply,
                } => {
                    let result = self.place_bet(&account, side, amount).await;
                    if let Err(e) = &result {
                        debug!(%account, %side, amount, error = %e, "stake rejected");
                    }
                    let _ = reply.send(result);
                }
                Command::Connect { account } => {
                    if self.players.insert(account.clone()) {
                        info!(%account, connected = self.players.len(), "player connected");
                    }
                    self.players_changed().await;
                }
                Command::Disconnect { account } => {
                    if self.players.remove(&account) {
                        info!(%account, connected = self.players.len(), "player disconnected");
                    }
                    self.players_changed().await;
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                Command::Subscribe { reply } => {
                    let rx = self.publisher.subscribe(self.snapshot());
                    let _ = reply.send(rx);
                }
                Command::Timer { kind, generation } => {
                    if self.scheduler.is_current(generation) {
                        self.on_timer(kind).await;
                    } else {
                        debug!(%kind, generation, "stale timer dropped");
                    }
                }
                Command::Shutdown => break,
            }
        }

        self.scheduler.cancel_all();
        info!(round = %self.round.id, phase = %self.round.phase, "engine stopped");
    }

    // =================================================================
    // Transitions
    // =================================================================

    async fn fire(&mut self, trigger: Trigger) {
        self.drive(VecDeque::from([trigger])).await;
    }

    async fn drive(&mut self, mut queue: VecDeque<Trigger>) {
        while let Some(trigger) = queue.pop_front() {
            let phase = self.round.phase;
            let Some(transition) = machine::transition(phase, trigger, self.gate()) else {
                debug!(%phase, %trigger, "trigger ignored");
                continue;
            };
            if !transition.from.can_transition_to(transition.to) {
                error!(from = %transition.from, to = %transition.to, "illegal transition refused");
                continue;
            }

            info!(
                round = %self.round.id,
                from = %transition.from,
                to = %transition.to,
                %trigger,
                "phase transition"
            );
            self.round.phase = transition.to;
            if transition.from == RoundPhase::Initializing {
                self.round.player_count = self.players.len();
            }
            if self.run_effects(transition.effects, &mut queue).await
                && transition.to != RoundPhase::Error
            {
                if let Err(e) = self.checkpoint().await {
                    self.fault(&e, &mut queue);
                }
            }
        }
    }

    /// Run `effects` in order. Returns `false` if one failed, in which case
    /// `queue` holds only [`Trigger::Fault`].
    async fn run_effects(&mut self, effects: Vec<Effect>, queue: &mut VecDeque<Trigger>) -> bool {
        for effect in effects {
            match self.apply(effect).await {
                Ok(Some(next)) => queue.push_back(next),
                Ok(None) => {}
                Err(e) => {
                    self.fault(&e, queue);
                    return false;
                }
            }
        }
        true
    }

    fn fault(&mut self, err: &SpinmatchError, queue: &mut VecDeque<Trigger>) {
        error!(round = %self.round.id, phase = %self.round.phase, error = %err, "round fault");
        self.round.error_message = Some(err.to_string());
        queue.clear();
        queue.push_back(Trigger::Fault);
    }

    async fn apply(&mut self, effect: Effect) -> Result<Option<Trigger>> {
        match effect {
            Effect::CancelTimers => self.scheduler.cancel_all(),
            Effect::CreateRound => self.create_round(),
            Effect::StartCountdown => {
                self.round.countdown = self.config.betting_window_secs;
                self.scheduler.schedule(TimerKind::CountdownTick, COUNTDOWN_TICK);
            }
            Effect::FreezeBets => {
                self.round.countdown = 0;
                self.book.freeze();
            }
            Effect::RunMatching => {
                let matches = run_matching_pass(&mut self.book, Side::Red);
                self.publish_matches(matches);
            }
            Effect::PersistBets => self.store.save_round(&self.record()).await?,
            Effect::DrawOutcome => {
                let outcome = self.draw.draw()?;
                debug!(round = %self.round.id, "outcome drawn");
                self.pending_outcome = Some(outcome);
            }
            Effect::ScheduleSpin => self
                .scheduler
                .schedule(TimerKind::SpinDelay, self.config.spin_delay()),
            Effect::RevealOutcome => {
                let outcome = self
                    .pending_outcome
                    .take()
                    .ok_or(SpinmatchError::MissingOutcome(self.round.id))?;
                info!(
                    round = %self.round.id,
                    outcome = outcome.number(),
                    color = %outcome.side(),
                    "outcome revealed"
                );
                self.round.outcome = Some(outcome);
            }
            Effect::Settle => {
                let outcome = self
                    .round
                    .outcome
                    .ok_or(SpinmatchError::MissingOutcome(self.round.id))?;
                self.settlement
                    .settle(self.round.id, outcome, self.book.bets(), self.book.matches())
                    .await?;
            }
            Effect::ScheduleDisplay => self
                .scheduler
                .schedule(TimerKind::DisplayDelay, self.config.results_display()),
            Effect::MarkProcessed => {
                self.book.mark_processed();
                self.round.ended_at = Some(Utc::now());
            }
            Effect::RecordHistory => {
                if let Some(outcome) = self.round.outcome {
                    self.history.push(outcome);
                }
            }
            Effect::ArchiveRound => {
                let record = self.record();
                self.store.save_round(&record).await?;
                self.recovery_attempts = 0;
                info!(
                    round = %self.round.id,
                    bets = record.bets.len(),
                    matches = record.matches.len(),
                    match_root = record.match_root.as_deref().unwrap_or(""),
                    "round archived"
                );
            }
            Effect::RecordFailure => {
                if let Err(e) = self.store.save_round(&self.record()).await {
                    warn!(round = %self.round.id, error = %e, "failed round not saved");
                }
            }
            Effect::Recover => return Ok(self.recover(false).await),
            Effect::Publish => {
                let state = self.snapshot();
                self.publisher.publish(&EventKind::GameState(state));
            }
            Effect::Emit(trigger) => return Ok(Some(trigger)),
        }
        Ok(None)
    }

    // =================================================================
    // Effects
    // =================================================================

    fn create_round(&mut self) {
        let id = self.next_round;
        self.next_round = id.next();

        let mut round = Round::new(id);
        round.phase = self.round.phase;
        if round.phase != RoundPhase::Initializing {
            round.player_count = self.players.len();
        }
        self.round = round;
        self.book = BetBook::new(id);
        self.pending_outcome = None;
        debug!(round = %id, phase = %self.round.phase, "round created");
    }

    fn record(&self) -> RoundRecord {
        let root = (!self.book.matches().is_empty()).then(|| match_root_hex(self.book.matches()));
        self.book.to_record(self.round.clone(), root)
    }

    async fn checkpoint(&mut self) -> Result<()> {
        self.store.save_round(&self.record()).await
    }

    /// Void the failed round and find where to resume.
    ///
    /// Returns the trigger that leaves ERROR, or `None` when backing off.
    async fn recover(&mut self, retrying: bool) -> Option<Trigger> {
        if !retrying && self.recovery_attempts >= self.config.max_recovery_attempts {
            warn!(
                attempts = self.recovery_attempts,
                backoff_ms = self.config.recovery_backoff_ms,
                "recovery backing off"
            );
            self.scheduler
                .schedule(TimerKind::RecoveryBackoff, self.config.recovery_backoff());
            return None;
        }
        self.recovery_attempts += 1;

        match self.try_recover().await {
            Ok(resume_after) => {
                self.next_round = self.next_round.max(resume_after.next());
                info!(
                    failed_round = %self.round.id,
                    resume_after = %resume_after,
                    next_round = %self.next_round,
                    "recovered"
                );
                Some(Trigger::RecoverySucceeded)
            }
            Err(e) => {
                warn!(
                    failed_round = %self.round.id,
                    attempt = self.recovery_attempts,
                    error = %e,
                    "recovery failed, reinitializing"
                );
                Some(Trigger::RecoveryFailed)
            }
        }
    }

    async fn try_recover(&mut self) -> Result<RoundId> {
        let failed = self.round.id;
        if !self.book.is_empty() && !self.settlement.is_settled(failed) {
            self.settlement
                .void_round(failed, self.book.bets())
                .await
                .map_err(|e| SpinmatchError::RecoveryFailure {
                    reason: format!("void of {failed}: {e}"),
                })?;
        }

        let latest = self
            .store
            .latest_resumable()
            .await
            .map_err(|e| SpinmatchError::RecoveryFailure {
                reason: e.to_string(),
            })?
            .ok_or_else(|| SpinmatchError::RecoveryFailure {
                reason: "no resumable round".into(),
            })?;
        Ok(latest.round.id)
    }

    /// Continue numbering after whatever the store already holds.
    async fn resume_numbering(&mut self) {
        match self.store.latest_round_id().await {
            Ok(Some(latest)) => self.next_round = latest.next(),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "round store unreadable at startup"),
        }
    }

    // =================================================================
    // Commands
    // =================================================================

    async fn place_bet(&mut self, account: &AccountId, side: Side, amount: Amount) -> Result<Bet> {
        placement::check_window(self.round.phase, self.round.countdown, self.book.is_frozen())?;
        placement::check_amount(amount, &self.config)?;

        let placed =
            placement::execute(self.ledger.as_ref(), &mut self.book, account, side, amount).await?;
        self.publish_matches(placed.matches);
        Ok(placed.bet)
    }

    async fn players_changed(&mut self) {
        if self.round.phase != RoundPhase::Initializing {
            self.round.player_count = self.players.len();
        }
        self.fire(Trigger::PlayersChanged).await;
    }

    async fn on_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::CountdownTick => self.on_tick().await,
            TimerKind::SpinDelay => self.fire(Trigger::SpinCompleted).await,
            TimerKind::DisplayDelay => self.fire(Trigger::DisplayTimeout).await,
            TimerKind::RecoveryBackoff => {
                if self.round.phase == RoundPhase::Error {
                    if let Some(trigger) = self.recover(true).await {
                        self.fire(trigger).await;
                    }
                }
            }
        }
    }

    async fn on_tick(&mut self) {
        if self.round.phase != RoundPhase::BettingOpen {
            return;
        }
        self.round.countdown = self.round.countdown.saturating_sub(1);
        if self.round.countdown > 0 {
            let state = self.snapshot();
            self.publisher.publish(&EventKind::GameState(state));
            self.scheduler.schedule(TimerKind::CountdownTick, COUNTDOWN_TICK);
        } else {
            self.fire(Trigger::CountdownExpired).await;
        }
    }

    // =================================================================
    // Views
    // =================================================================

    fn gate(&self) -> Gate {
        Gate {
            players_ready: self.players.len() >= self.config.min_players,
        }
    }

    fn snapshot(&self) -> GameState {
        let (staked, matched): (SideTotals, SideTotals) = self.book.totals();
        GameState {
            round_id: self.round.id,
            phase: self.round.phase,
            countdown: self.round.countdown,
            pending_bets_by_side: staked,
            matched_by_side: matched,
            outcome: self.round.outcome,
            recent_outcome_history: self.history.recent(),
            connected_players: self.players.len(),
            error: self.round.error_message.clone(),
        }
    }

    fn publish_matches(&mut self, matches: Vec<Match>) {
        if matches.is_empty() {
            return;
        }
        self.publisher.publish(&EventKind::MatchesFormed(MatchBatch {
            round_id: self.round.id,
            matches,
        }));
    }
}
