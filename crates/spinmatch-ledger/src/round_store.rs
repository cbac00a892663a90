//! Round persistence port and in-memory adapter.
//!
//! The engine saves the round record on every phase change and archives it
//! at CLEANUP. Recovery reads back the most recent round that did not end
//! in ERROR.

use std::collections::BTreeMap;
#[cfg(any(test, feature = "test-helpers"))]
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use spinmatch_types::{Result, RoundId, RoundRecord};
use tokio::sync::RwLock;
use tracing::debug;

/// Persistence for round records.
#[async_trait]
pub trait RoundStore: Send + Sync + 'static {
    /// Insert or replace the record for `record.round.id`.
    async fn save_round(&self, record: &RoundRecord) -> Result<()>;

    async fn load_round(&self, id: RoundId) -> Result<Option<RoundRecord>>;

    /// Highest-numbered record whose round is not in ERROR.
    async fn latest_resumable(&self) -> Result<Option<RoundRecord>>;

    /// Highest round id on record, whatever its phase.
    async fn latest_round_id(&self) -> Result<Option<RoundId>>;
}

/// Round records keyed by id, held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRoundStore {
    records: RwLock<BTreeMap<RoundId, RoundRecord>>,
    #[cfg(any(test, feature = "test-helpers"))]
    fail_saves: AtomicBool,
}

impl InMemoryRoundStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl InMemoryRoundStore {
    /// Make every save fail until switched back off.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RoundStore for InMemoryRoundStore {
    async fn save_round(&self, record: &RoundRecord) -> Result<()> {
        #[cfg(any(test, feature = "test-helpers"))]
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(spinmatch_types::SpinmatchError::StoreFailure {
                reason: format!("save of {} refused", record.round.id),
            });
        }
        debug!(round = %record.round.id, phase = %record.round.phase, "round saved");
        self.records
            .write()
            .await
            .insert(record.round.id, record.clone());
        Ok(())
    }

    async fn load_round(&self, id: RoundId) -> Result<Option<RoundRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn latest_resumable(&self) -> Result<Option<RoundRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .rev()
            .find(|r| r.is_resumable())
            .cloned())
    }

    async fn latest_round_id(&self) -> Result<Option<RoundId>> {
        Ok(self.records.read().await.keys().next_back().copied())
    }
}

#[cfg(test)]
mod tests {
    use spinmatch_types::{Round, RoundPhase, SpinmatchError};

    use super::*;

    fn record(id: u64, phase: RoundPhase) -> RoundRecord {
        let mut round = Round::new(RoundId(id));
        round.phase = phase;
        RoundRecord::new(round)
    }

    #[tokio::test]
    async fn save_replaces_by_id() {
        let store = InMemoryRoundStore::new();
        store.save_round(&record(1, RoundPhase::BettingOpen)).await.unwrap();
        store.save_round(&record(1, RoundPhase::Cleanup)).await.unwrap();

        assert_eq!(store.len().await, 1);
        let loaded = store.load_round(RoundId(1)).await.unwrap().unwrap();
        assert_eq!(loaded.round.phase, RoundPhase::Cleanup);
        assert!(store.load_round(RoundId(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_resumable_skips_error_rounds() {
        let store = InMemoryRoundStore::new();
        assert!(store.latest_resumable().await.unwrap().is_none());

        store.save_round(&record(1, RoundPhase::Cleanup)).await.unwrap();
        store.save_round(&record(2, RoundPhase::Cleanup)).await.unwrap();
        store.save_round(&record(3, RoundPhase::Error)).await.unwrap();

        let latest = store.latest_resumable().await.unwrap().unwrap();
        assert_eq!(latest.round.id, RoundId(2));
    }

    #[tokio::test]
    async fn latest_round_id_counts_error_rounds() {
        let store = InMemoryRoundStore::new();
        assert!(store.latest_round_id().await.unwrap().is_none());

        store.save_round(&record(1, RoundPhase::Cleanup)).await.unwrap();
        store.save_round(&record(2, RoundPhase::Error)).await.unwrap();

        assert_eq!(store.latest_round_id().await.unwrap(), Some(RoundId(2)));
        assert_eq!(
            store.latest_resumable().await.unwrap().unwrap().round.id,
            RoundId(1)
        );
    }

    #[tokio::test]
    async fn injected_save_failure() {
        let store = InMemoryRoundStore::new();
        store.fail_saves(true);
        let err = store
            .save_round(&record(1, RoundPhase::Initializing))
            .await
            .unwrap_err();
        assert!(matches!(err, SpinmatchError::StoreFailure { .. }));
        assert!(store.is_empty().await);

        store.fail_saves(false);
        store.save_round(&record(1, RoundPhase::Initializing)).await.unwrap();
        assert_eq!(store.len().await, 1);
    }
}
