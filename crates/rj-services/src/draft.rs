//! Local Draft Store.
//!
//! A single slot on the device. Every operation runs inside one critical
//! section so a save can never interleave with a clear.

use chrono::Duration;
use rj_core::{Clock, Draft, EntryId, JournalEntryInput, KeyValueStore, KvError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const DRAFT_KEY: &str = "journal_draft";
pub const MAX_DRAFT_AGE_DAYS: i64 = 7;

pub struct LocalDraftStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    max_age: Duration,
    slot: Mutex<()>,
}

impl LocalDraftStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_max_age(kv, clock, Duration::days(MAX_DRAFT_AGE_DAYS))
    }

    pub fn with_max_age(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, max_age: Duration) -> Self {
        Self {
            kv,
            clock,
            max_age,
            slot: Mutex::new(()),
        }
    }

    /// Overwrites the slot and stamps `saved_at`. Re-staging the same entry for
    /// the same id keeps the original stamp. Returns `false` on any storage
    /// failure (quota included) instead of propagating it.
    pub async fn save(&self, entry: &JournalEntryInput, entry_id: Option<EntryId>) -> bool {
        let _slot = self.slot.lock().await;
        let saved_at = match self.load_locked().await {
            Some(staged) if staged.entry_id == entry_id && staged.entry == *entry => staged.saved_at,
            _ => self.clock.now(),
        };
        let draft = Draft {
            entry: entry.clone(),
            entry_id,
            saved_at,
        };
        self.write_locked(&draft).await
    }

    /// Puts a previously loaded draft back as it was.
    pub async fn restore(&self, draft: &Draft) -> bool {
        let _slot = self.slot.lock().await;
        self.write_locked(draft).await
    }

    async fn write_locked(&self, draft: &Draft) -> bool {
        let payload = match serde_json::to_string(draft) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "failed to serialize draft");
                return false;
            }
        };

        match self.kv.set(DRAFT_KEY, &payload).await {
            Ok(()) => {
                info!(saved_at = %draft.saved_at, "draft staged");
                true
            }
            Err(KvError::QuotaExceeded) => {
                warn!("local storage is full, cannot save draft");
                false
            }
            Err(e) => {
                warn!(error = %e, "failed to save draft");
                false
            }
        }
    }

    /// The staged draft, or `None` when absent, unreadable or stale.
    /// A stale draft is removed as a side effect.
    pub async fn load(&self) -> Option<Draft> {
        let _slot = self.slot.lock().await;
        self.load_locked().await
    }

    async fn load_locked(&self) -> Option<Draft> {
        let raw = match self.kv.get(DRAFT_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "failed to read draft");
                return None;
            }
        };

        let draft: Draft = match serde_json::from_str(&raw) {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "discarding unreadable draft payload");
                return None;
            }
        };

        if self.clock.now() - draft.saved_at > self.max_age {
            debug!(saved_at = %draft.saved_at, "draft is stale, evicting");
            if let Err(e) = self.kv.remove(DRAFT_KEY).await {
                warn!(error = %e, "failed to evict stale draft");
            }
            return None;
        }
        Some(draft)
    }

    pub async fn clear(&self) -> bool {
        let _slot = self.slot.lock().await;
        match self.kv.remove(DRAFT_KEY).await {
            Ok(()) => {
                debug!("draft cleared");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to clear draft");
                false
            }
        }
    }

    pub async fn has(&self) -> bool {
        self.load().await.is_some()
    }

    /// Rounded hours since the draft was saved.
    pub async fn age_in_hours(&self) -> Option<i64> {
        let draft = self.load().await?;
        let age = self.clock.now() - draft.saved_at;
        Some((age.num_seconds() as f64 / 3600.0).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rj_core::ManualClock;
    use rj_storage_local::MemoryKeyValueStore;

    fn input(liked: &str) -> JournalEntryInput {
        JournalEntryInput {
            date: "2024-01-10".into(),
            rating: Some(7.0),
            liked: liked.into(),
            ..Default::default()
        }
    }

    fn store(kv: Arc<MemoryKeyValueStore>) -> (LocalDraftStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()));
        (LocalDraftStore::new(kv, clock.clone()), clock)
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let (drafts, _clock) = store(Arc::new(MemoryKeyValueStore::new()));
        let entry = input("  raw text kept verbatim \u{1} ");
        assert!(drafts.save(&entry, None).await);

        let loaded = drafts.load().await.expect("draft present");
        assert_eq!(loaded.entry, entry);
        assert_eq!(loaded.entry_id, None);
    }

    #[tokio::test]
    async fn new_save_overwrites_the_slot() {
        let (drafts, _clock) = store(Arc::new(MemoryKeyValueStore::new()));
        drafts.save(&input("first"), None).await;
        drafts.save(&input("second"), None).await;
        assert_eq!(drafts.load().await.unwrap().entry.liked, "second");
    }

    #[tokio::test]
    async fn restaging_the_same_entry_keeps_its_age() {
        let (drafts, clock) = store(Arc::new(MemoryKeyValueStore::new()));
        let id = uuid::Uuid::now_v7();
        drafts.save(&input("train ride"), Some(id)).await;

        clock.advance(Duration::hours(30));
        assert!(drafts.save(&input("train ride"), Some(id)).await);
        assert_eq!(drafts.age_in_hours().await, Some(30));

        assert!(drafts.save(&input("train ride, edited"), Some(id)).await);
        assert_eq!(drafts.age_in_hours().await, Some(0));
    }

    #[tokio::test]
    async fn restore_writes_the_draft_back_verbatim() {
        let (drafts, clock) = store(Arc::new(MemoryKeyValueStore::new()));
        drafts.save(&input("x"), None).await;
        let staged = drafts.load().await.unwrap();
        drafts.clear().await;

        clock.advance(Duration::hours(5));
        assert!(drafts.restore(&staged).await);
        assert_eq!(drafts.load().await, Some(staged));
        assert_eq!(drafts.age_in_hours().await, Some(5));
    }

    #[tokio::test]
    async fn stale_draft_is_evicted() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let (drafts, clock) = store(kv.clone());
        drafts.save(&input("old"), None).await;

        clock.advance(Duration::days(7));
        assert!(drafts.has().await, "exactly seven days is still fresh");

        clock.advance(Duration::minutes(1));
        assert!(drafts.load().await.is_none());
        assert_eq!(kv.get(DRAFT_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn quota_failure_is_soft() {
        let (drafts, _clock) = store(Arc::new(MemoryKeyValueStore::with_quota(8)));
        assert!(!drafts.save(&input("nope"), None).await);
        assert!(!drafts.has().await);
    }

    #[tokio::test]
    async fn age_is_rounded_hours() {
        let (drafts, clock) = store(Arc::new(MemoryKeyValueStore::new()));
        assert_eq!(drafts.age_in_hours().await, None);

        drafts.save(&input("x"), None).await;
        clock.advance(Duration::minutes(20));
        assert_eq!(drafts.age_in_hours().await, Some(0));
        clock.advance(Duration::minutes(80));
        assert_eq!(drafts.age_in_hours().await, Some(2));
    }

    #[tokio::test]
    async fn corrupt_payload_reads_as_absent() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set(DRAFT_KEY, "{not json").await.unwrap();
        let (drafts, _clock) = store(kv);
        assert!(drafts.load().await.is_none());
    }

    #[tokio::test]
    async fn clear_empties_the_slot() {
        let (drafts, _clock) = store(Arc::new(MemoryKeyValueStore::new()));
        drafts.save(&input("x"), None).await;
        assert!(drafts.clear().await);
        assert!(!drafts.has().await);
    }
}
