//! # rj-store-memory
//!
//! Process-local `JournalRepo` and `StreakRepo`. Used when the binary is built
//! without a database feature, and by behaviour tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rj_core::models::{EntryId, EntryPage, JournalEntry, StreakRecord, UpsertOutcome, UserId};
use rj_core::traits::{JournalRepo, StreakRepo};
use rj_core::StoreError;
use tracing::debug;

#[derive(Default)]
pub struct MemoryJournalRepo {
    entries: DashMap<EntryId, JournalEntry>,
}

impl MemoryJournalRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl JournalRepo for MemoryJournalRepo {
    /// The shard lock held by `entry` makes the existence check and the write
    /// one step.
    async fn upsert(&self, entry: JournalEntry) -> Result<UpsertOutcome, StoreError> {
        match self.entries.entry(entry.id) {
            Entry::Occupied(mut slot) => {
                if slot.get().user_id != entry.user_id {
                    return Err(StoreError::PermissionDenied(format!(
                        "journal entry {} belongs to another user",
                        entry.id
                    )));
                }
                let stored = JournalEntry {
                    created_at: slot.get().created_at,
                    ..entry
                };
                slot.insert(stored.clone());
                debug!(id = %stored.id, "journal entry updated");
                Ok(UpsertOutcome { entry: stored, created: false })
            }
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                debug!(id = %entry.id, "journal entry created");
                Ok(UpsertOutcome { entry, created: true })
            }
        }
    }

    async fn get(&self, user_id: UserId, id: EntryId) -> Result<Option<JournalEntry>, StoreError> {
        Ok(self
            .entries
            .get(&id)
            .filter(|e| e.user_id == user_id)
            .map(|e| e.clone()))
    }

    async fn get_by_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Option<JournalEntry>, StoreError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.user_id == user_id && e.date == date)
            .max_by_key(|e| e.created_at)
            .map(|e| e.clone()))
    }

    async fn list(&self, user_id: UserId, limit: u32, offset: u32) -> Result<EntryPage, StoreError> {
        let mut owned: Vec<JournalEntry> = self
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.clone())
            .collect();
        owned.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));

        let total = owned.len() as u64;
        let entries = owned
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(EntryPage::new(entries, total, offset))
    }

    async fn list_by_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let mut found: Vec<JournalEntry> = self
            .entries
            .iter()
            .filter(|e| e.user_id == user_id && e.date == date)
            .map(|e| e.clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn delete(&self, user_id: UserId, id: EntryId) -> Result<(), StoreError> {
        self.entries
            .remove_if(&id, |_, e| e.user_id == user_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("journal entry {id}")))
    }
}

#[derive(Default)]
pub struct MemoryStreakRepo {
    records: DashMap<UserId, StreakRecord>,
    provisioned: bool,
}

impl MemoryStreakRepo {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            provisioned: true,
        }
    }

    /// Behaves like streak storage whose table was never created.
    pub fn unprovisioned() -> Self {
        Self::default()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.provisioned {
            Ok(())
        } else {
            Err(StoreError::NotProvisioned("user_streaks".into()))
        }
    }
}

#[async_trait]
impl StreakRepo for MemoryStreakRepo {
    async fn get(&self, user_id: UserId) -> Result<Option<StreakRecord>, StoreError> {
        self.check()?;
        Ok(self.records.get(&user_id).map(|r| *r))
    }

    async fn upsert(&self, user_id: UserId, record: StreakRecord) -> Result<(), StoreError> {
        self.check()?;
        self.records.insert(user_id, record);
        Ok(())
    }
}
