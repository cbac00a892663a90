//! Event fan-out to observers.
//!
//! Each observer gets its own unbounded channel and its own sequence
//! numbers, so events arrive in production order with no gaps. Observers
//! whose receiver is gone are pruned on the next publish.

use serde::{Deserialize, Serialize};
use spinmatch_types::{GameState, Match, RoundId};
use tokio::sync::mpsc;
use tracing::debug;

/// Matches produced by one matching pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchBatch {
    pub round_id: RoundId,
    pub matches: Vec<Match>,
}

/// Payload of an outbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum EventKind {
    GameState(GameState),
    MatchesFormed(MatchBatch),
}

/// One outbound event, numbered per observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub seq: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

struct Observer {
    tx: mpsc::UnboundedSender<EngineEvent>,
    seq: u64,
}

impl Observer {
    fn send(&mut self, kind: EventKind) -> bool {
        self.seq += 1;
        self.tx
            .send(EngineEvent {
                seq: self.seq,
                kind,
            })
            .is_ok()
    }
}

#[derive(Default)]
pub(crate) struct Publisher {
    observers: Vec<Observer>,
}

impl Publisher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register an observer and hand it `initial` as its first event.
    pub(crate) fn subscribe(&mut self, initial: GameState) -> mpsc::UnboundedReceiver<EngineEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut observer = Observer { tx, seq: 0 };
        if observer.send(EventKind::GameState(initial)) {
            self.observers.push(observer);
        }
        rx
    }

    pub(crate) fn publish(&mut self, kind: &EventKind) {
        let before = self.observers.len();
        self.observers.retain_mut(|o| o.send(kind.clone()));
        let dropped = before - self.observers.len();
        if dropped > 0 {
            debug!(dropped, remaining = self.observers.len(), "observers pruned");
        }
    }

    #[cfg(test)]
    pub(crate) fn observer_count(&self) -> usize {
        self.observers.len()
    }
}
