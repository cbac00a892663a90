//! Round lifecycle tests against a running engine.
//!
//! Time is paused: the runtime jumps straight to the next timer whenever
//! every task is idle, so a full round runs instantly while still following
//! the configured delays.

use std::sync::Arc;
use std::time::Duration;

use spinmatch_engine::{EngineEvent, EngineHandle, EventKind, FixedDraw, MatchBatch};
use spinmatch_ledger::{InMemoryLedger, InMemoryRoundStore, Ledger, RoundStore};
use spinmatch_types::{
    AccountId, EngineConfig, EntryKind, GameState, Round, RoundId, RoundPhase, RoundRecord, Side,
    SpinmatchError,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const RED: u8 = 1;
const BLACK: u8 = 2;
const FUNDING: u64 = 1000;

fn acct(name: &str) -> AccountId {
    AccountId::new(name)
}

fn config() -> EngineConfig {
    EngineConfig {
        betting_window_secs: 3,
        ..EngineConfig::default()
    }
}

/// Helper: an engine over in-memory adapters with funded accounts.
struct Harness {
    engine: EngineHandle,
    task: JoinHandle<()>,
    ledger: InMemoryLedger,
    store: Arc<InMemoryRoundStore>,
    events: UnboundedReceiver<EngineEvent>,
}

impl Harness {
    async fn start(draw: FixedDraw) -> Self {
        Self::start_with_store(draw, Arc::new(InMemoryRoundStore::new())).await
    }

    /// Start over a store that may already hold rounds.
    async fn start_with_store(draw: FixedDraw, store: Arc<InMemoryRoundStore>) -> Self {
        let ledger = InMemoryLedger::new();
        for name in ["alice", "bob", "carol"] {
            ledger.deposit(&acct(name), FUNDING).await.unwrap();
        }
        let (engine, task) = EngineHandle::spawn(
            config(),
            Arc::new(ledger.clone()),
            store.clone(),
            Box::new(draw),
        )
        .unwrap();
        let events = engine.subscribe().await.unwrap();
        Self {
            engine,
            task,
            ledger,
            store,
            events,
        }
    }

    async fn join(&self, names: &[&str]) {
        for name in names {
            self.engine.connect(acct(name)).await.unwrap();
        }
    }

    async fn next_event(&mut self) -> EngineEvent {
        tokio::time::timeout(Duration::from_secs(300), self.events.recv())
            .await
            .expect("no event within 300s")
            .expect("engine stopped")
    }

    /// Skip events until a game state satisfies `pred`.
    async fn state_where(&mut self, pred: impl Fn(&GameState) -> bool) -> GameState {
        loop {
            if let EventKind::GameState(state) = self.next_event().await.kind {
                if pred(&state) {
                    return state;
                }
            }
        }
    }

    async fn phase(&mut self, phase: RoundPhase) -> GameState {
        self.state_where(|s| s.phase == phase).await
    }

    async fn next_matches(&mut self) -> MatchBatch {
        loop {
            if let EventKind::MatchesFormed(batch) = self.next_event().await.kind {
                return batch;
            }
        }
    }

    async fn balance(&self, name: &str) -> u64 {
        self.ledger.balance(&acct(name)).await.unwrap()
    }

    async fn stake(&self, name: &str, side: Side, amount: u64) {
        self.engine.place_bet(acct(name), side, amount).await.unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn matched_pair_pays_winner_minus_fee() {
    let mut h = Harness::start(FixedDraw::always(RED)).await;
    h.join(&["alice", "bob"]).await;

    let open = h.phase(RoundPhase::BettingOpen).await;
    assert_eq!(open.round_id, RoundId(1));
    assert_eq!(open.countdown, 3);
    assert_eq!(open.connected_players, 2);

    let red = h.engine.place_bet(acct("alice"), Side::Red, 100).await.unwrap();
    assert_eq!(red.matched, 0);
    let black = h.engine.place_bet(acct("bob"), Side::Black, 100).await.unwrap();
    assert_eq!(black.matched, 100);

    let batch = h.next_matches().await;
    assert_eq!(batch.round_id, RoundId(1));
    assert_eq!(batch.matches.len(), 1);
    assert_eq!(batch.matches[0].amount, 100);

    let results = h.phase(RoundPhase::Results).await;
    assert_eq!(results.outcome.map(|o| o.number()), Some(RED));
    assert_eq!(results.matched_by_side.red, 100);
    assert_eq!(results.matched_by_side.black, 100);

    assert_eq!(h.balance("alice").await, FUNDING - 100 + 195);
    assert_eq!(h.balance("bob").await, FUNDING - 100);
}

#[tokio::test(start_paused = true)]
async fn finished_round_is_archived_with_match_root() {
    let mut h = Harness::start(FixedDraw::always(BLACK)).await;
    h.join(&["alice", "bob"]).await;
    h.phase(RoundPhase::BettingOpen).await;
    h.stake("alice", Side::Red, 150).await;
    h.stake("bob", Side::Black, 100).await;

    let next = h
        .state_where(|s| s.phase == RoundPhase::BettingOpen && s.round_id == RoundId(2))
        .await;
    assert!(next.outcome.is_none());
    assert_eq!(next.pending_bets_by_side.red, 0);

    let record = h.store.load_round(RoundId(1)).await.unwrap().unwrap();
    assert_eq!(record.round.phase, RoundPhase::Cleanup);
    assert!(record.round.ended_at.is_some());
    assert_eq!(record.matches.len(), 1);
    assert!(record.match_root.is_some());
    assert!(record.bets.iter().all(|b| b.processed));

    // Unmatched 50 of alice's 150 came back; bob won the matched 100.
    assert_eq!(h.balance("alice").await, FUNDING - 100);
    assert_eq!(h.balance("bob").await, FUNDING - 100 + 195);
}

#[tokio::test(start_paused = true)]
async fn unopposed_stake_refunded_in_full() {
    let mut h = Harness::start(FixedDraw::always(BLACK)).await;
    h.join(&["alice", "bob"]).await;
    h.phase(RoundPhase::BettingOpen).await;
    h.stake("alice", Side::Red, 100).await;

    let snapshot = h.engine.snapshot().await.unwrap();
    assert_eq!(snapshot.pending_bets_by_side.red, 100);
    assert_eq!(snapshot.pending_bets_by_side.black, 0);
    assert_eq!(snapshot.matched_by_side.red, 0);

    h.phase(RoundPhase::Results).await;
    assert_eq!(h.balance("alice").await, FUNDING);
    let refunds: Vec<_> = h
        .ledger
        .journal(&acct("alice"))
        .await
        .into_iter()
        .filter(|e| e.kind == EntryKind::Refund)
        .collect();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].amount, 100);
    assert_eq!(refunds[0].round_id, Some(RoundId(1)));
}

#[tokio::test(start_paused = true)]
async fn stake_after_close_rejected_without_debit() {
    let mut h = Harness::start(FixedDraw::always(RED)).await;

    let err = h
        .engine
        .place_bet(acct("alice"), Side::Red, 100)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SpinmatchError::BettingClosed {
            phase: RoundPhase::WaitingForPlayers
        }
    );

    h.join(&["alice", "bob"]).await;
    h.phase(RoundPhase::Spinning).await;

    let err = h
        .engine
        .place_bet(acct("alice"), Side::Red, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, SpinmatchError::BettingClosed { .. }));
    assert_eq!(err.user_message(), "Betting is currently closed");
    assert_eq!(h.balance("alice").await, FUNDING);
    assert!(
        h.ledger
            .journal(&acct("alice"))
            .await
            .iter()
            .all(|e| e.kind != EntryKind::Stake)
    );
}

#[tokio::test(start_paused = true)]
async fn rejected_stakes_leave_round_running() {
    let mut h = Harness::start(FixedDraw::always(RED)).await;
    h.ledger.withdraw(&acct("carol"), FUNDING - 50).await.unwrap();
    h.join(&["alice", "bob"]).await;
    h.phase(RoundPhase::BettingOpen).await;

    let too_small = h.engine.place_bet(acct("alice"), Side::Red, 5).await;
    assert!(matches!(too_small, Err(SpinmatchError::AmountOutOfRange { .. })));
    let too_large = h.engine.place_bet(acct("alice"), Side::Red, 5000).await;
    assert!(matches!(too_large, Err(SpinmatchError::AmountOutOfRange { .. })));
    let broke = h.engine.place_bet(acct("carol"), Side::Black, 100).await;
    assert!(matches!(broke, Err(SpinmatchError::InsufficientFunds { .. })));
    let unknown = h.engine.place_bet(acct("dave"), Side::Black, 100).await;
    assert!(matches!(unknown, Err(SpinmatchError::AccountNotFound(_))));

    let snapshot = h.engine.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, RoundPhase::BettingOpen);
    assert!(snapshot.error.is_none());
    assert_eq!(h.balance("carol").await, 50);
}

#[tokio::test(start_paused = true)]
async fn countdown_broadcast_every_second() {
    let mut h = Harness::start(FixedDraw::always(RED)).await;
    h.join(&["alice", "bob"]).await;

    let open = h.phase(RoundPhase::BettingOpen).await;
    let opened = Instant::now();
    let mut countdowns = vec![open.countdown];
    let processing = loop {
        let state = h.state_where(|_| true).await;
        if state.phase == RoundPhase::BettingOpen {
            countdowns.push(state.countdown);
        } else {
            break state;
        }
    };

    assert_eq!(countdowns, vec![3, 2, 1]);
    assert_eq!(processing.phase, RoundPhase::ProcessingBets);
    assert_eq!(processing.countdown, 0);
    let elapsed = opened.elapsed();
    assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn outcome_hidden_while_spinning() {
    let mut h = Harness::start(FixedDraw::always(7)).await;
    h.join(&["alice", "bob"]).await;

    let spinning = h.phase(RoundPhase::Spinning).await;
    assert!(spinning.outcome.is_none());
    assert!(h.engine.snapshot().await.unwrap().outcome.is_none());

    let started = Instant::now();
    let results = h.phase(RoundPhase::Results).await;
    assert_eq!(results.outcome.map(|o| o.number()), Some(7));
    assert!(started.elapsed() >= config().spin_delay());
}

#[tokio::test(start_paused = true)]
async fn waits_for_enough_players() {
    let mut h = Harness::start(FixedDraw::always(RED)).await;
    h.join(&["alice", "alice"]).await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    let snapshot = h.engine.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, RoundPhase::WaitingForPlayers);
    assert_eq!(snapshot.round_id, RoundId(1));
    assert_eq!(snapshot.connected_players, 1);

    h.join(&["bob"]).await;
    h.phase(RoundPhase::BettingOpen).await;

    // Leaving mid-round does not stop it, but the next round waits.
    h.engine.disconnect(acct("bob")).await.unwrap();
    h.phase(RoundPhase::Results).await;
    let waiting = h
        .state_where(|s| s.phase == RoundPhase::WaitingForPlayers)
        .await;
    assert_eq!(waiting.round_id, RoundId(2));
    assert_eq!(waiting.connected_players, 1);
}

#[tokio::test(start_paused = true)]
async fn disconnect_while_betting_keeps_stakes() {
    let mut h = Harness::start(FixedDraw::always(RED)).await;
    h.join(&["alice", "bob"]).await;
    h.phase(RoundPhase::BettingOpen).await;
    h.stake("alice", Side::Red, 100).await;
    h.stake("bob", Side::Black, 100).await;

    h.engine.disconnect(acct("alice")).await.unwrap();
    h.engine.disconnect(acct("bob")).await.unwrap();

    let results = h.phase(RoundPhase::Results).await;
    assert_eq!(results.connected_players, 0);
    assert_eq!(results.matched_by_side.red, 100);
    assert_eq!(results.matched_by_side.black, 100);
    assert_eq!(h.balance("alice").await, FUNDING - 100 + 195);
    assert_eq!(h.balance("bob").await, FUNDING - 100);

    let waiting = h
        .state_where(|s| s.phase == RoundPhase::WaitingForPlayers)
        .await;
    assert_eq!(waiting.round_id, RoundId(2));
}

#[tokio::test(start_paused = true)]
async fn restart_numbers_past_failed_round() {
    let store = Arc::new(InMemoryRoundStore::new());
    let mut archived = Round::new(RoundId(1));
    archived.phase = RoundPhase::Cleanup;
    store.save_round(&RoundRecord::new(archived)).await.unwrap();
    let mut failed = Round::new(RoundId(2));
    failed.phase = RoundPhase::Error;
    failed.error_message = Some("ledger down".into());
    store.save_round(&RoundRecord::new(failed)).await.unwrap();

    let h = Harness::start_with_store(FixedDraw::always(RED), store).await;
    let first = h.engine.snapshot().await.unwrap();
    assert_eq!(first.round_id, RoundId(3));

    let kept = h.store.load_round(RoundId(2)).await.unwrap().unwrap();
    assert_eq!(kept.round.phase, RoundPhase::Error);
    assert_eq!(kept.round.error_message.as_deref(), Some("ledger down"));
}

#[tokio::test(start_paused = true)]
async fn history_lists_newest_first() {
    let mut h = Harness::start(FixedDraw::new([RED, BLACK])).await;
    h.join(&["alice", "bob"]).await;

    let third = h
        .state_where(|s| s.phase == RoundPhase::BettingOpen && s.round_id == RoundId(3))
        .await;
    let numbers: Vec<u8> = third
        .recent_outcome_history
        .iter()
        .map(|o| o.number())
        .collect();
    assert_eq!(numbers, vec![BLACK, RED]);
}

#[tokio::test(start_paused = true)]
async fn failed_settlement_voids_round_and_resumes() {
    let mut h = Harness::start(FixedDraw::always(RED)).await;
    h.join(&["alice", "bob"]).await;

    h.phase(RoundPhase::BettingOpen).await;
    h.stake("alice", Side::Red, 100).await;
    h.stake("bob", Side::Black, 100).await;

    h.state_where(|s| s.phase == RoundPhase::BettingOpen && s.round_id == RoundId(2))
        .await;
    h.stake("alice", Side::Red, 100).await;
    h.stake("bob", Side::Black, 100).await;
    h.ledger.fail_next_commit().await;

    let failed = h.phase(RoundPhase::Error).await;
    assert_eq!(failed.round_id, RoundId(2));
    assert!(failed.error.is_some());

    let resumed = h.phase(RoundPhase::BettingOpen).await;
    assert_eq!(resumed.round_id, RoundId(3));
    assert!(resumed.error.is_none());

    // Round 1 paid out; round 2 stakes came back in full.
    assert_eq!(h.balance("alice").await, FUNDING - 100 + 195);
    assert_eq!(h.balance("bob").await, FUNDING - 100);
    let voided = h.store.load_round(RoundId(2)).await.unwrap().unwrap();
    assert_eq!(voided.round.phase, RoundPhase::Error);
    assert!(
        h.ledger
            .journal(&acct("bob"))
            .await
            .iter()
            .any(|e| e.kind == EntryKind::Refund && e.round_id == Some(RoundId(2)))
    );
}

#[tokio::test(start_paused = true)]
async fn failure_without_resumable_round_reinitializes() {
    let mut h = Harness::start(FixedDraw::always(BLACK)).await;
    h.join(&["alice", "bob"]).await;

    h.phase(RoundPhase::BettingOpen).await;
    h.stake("alice", Side::Red, 100).await;
    h.stake("bob", Side::Black, 100).await;
    h.ledger.fail_next_commit().await;

    h.phase(RoundPhase::Error).await;
    let fresh = h.phase(RoundPhase::Initializing).await;
    assert_eq!(fresh.round_id, RoundId(2));
    assert!(fresh.error.is_none());

    let open = h.phase(RoundPhase::BettingOpen).await;
    assert_eq!(open.round_id, RoundId(2));
    assert_eq!(h.balance("alice").await, FUNDING);
    assert_eq!(h.balance("bob").await, FUNDING);
}

#[tokio::test(start_paused = true)]
async fn store_outage_backs_off_then_recovers() {
    let mut h = Harness::start(FixedDraw::always(RED)).await;
    h.join(&["alice", "bob"]).await;
    h.state_where(|s| s.phase == RoundPhase::BettingOpen && s.round_id == RoundId(2))
        .await;

    h.store.fail_saves(true);
    h.phase(RoundPhase::Error).await;

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(
        h.engine.snapshot().await.unwrap().phase,
        RoundPhase::Error
    );

    h.store.fail_saves(false);
    let open = h
        .state_where(|s| s.phase == RoundPhase::BettingOpen && s.error.is_none())
        .await;
    assert!(open.round_id > RoundId(2));
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_engine() {
    let mut h = Harness::start(FixedDraw::always(RED)).await;
    h.join(&["alice", "bob"]).await;
    h.phase(RoundPhase::BettingOpen).await;

    h.engine.shutdown().await.unwrap();
    h.task.await.unwrap();

    let err = h.engine.snapshot().await.unwrap_err();
    assert_eq!(err, SpinmatchError::EngineStopped);
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_stops_engine() {
    let mut h = Harness::start(FixedDraw::always(RED)).await;
    h.join(&["alice", "bob"]).await;
    h.phase(RoundPhase::BettingOpen).await;

    let Harness { engine, task, .. } = h;
    drop(engine);
    tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("engine kept running")
        .unwrap();
}

#[tokio::test]
async fn invalid_config_refused() {
    let config = EngineConfig {
        min_players: 0,
        ..EngineConfig::default()
    };
    let result = EngineHandle::spawn(
        config,
        Arc::new(InMemoryLedger::new()),
        Arc::new(InMemoryRoundStore::new()),
        Box::new(FixedDraw::always(RED)),
    );
    assert!(matches!(result, Err(SpinmatchError::Configuration(_))));
}
