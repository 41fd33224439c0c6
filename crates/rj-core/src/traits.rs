//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use crate::error::{KvError, StoreError};
use crate::models::{EntryId, EntryPage, JournalEntry, StreakRecord, UpsertOutcome, UserId};
use async_trait::async_trait;
use chrono::NaiveDate;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Remote journal storage, keyed uniquely by entry id and scoped per user.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait JournalRepo: Send + Sync {
    /// Inserts or updates by `entry.id`. On update the stored `created_at` wins.
    /// Fails with `PermissionDenied` when the id belongs to another user.
    async fn upsert(&self, entry: JournalEntry) -> Result<UpsertOutcome, StoreError>;

    async fn get(&self, user_id: UserId, id: EntryId) -> Result<Option<JournalEntry>, StoreError>;

    /// Most recently created entry for that calendar date.
    async fn get_by_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Option<JournalEntry>, StoreError>;

    /// Ordered by `date` then `created_at`, both descending.
    async fn list(&self, user_id: UserId, limit: u32, offset: u32) -> Result<EntryPage, StoreError>;

    /// Every entry for that calendar date, newest first.
    async fn list_by_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<JournalEntry>, StoreError>;

    async fn delete(&self, user_id: UserId, id: EntryId) -> Result<(), StoreError>;
}

/// One streak record per user. May report `NotProvisioned`.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait StreakRepo: Send + Sync {
    async fn get(&self, user_id: UserId) -> Result<Option<StreakRecord>, StoreError>;
    async fn upsert(&self, user_id: UserId, record: StreakRecord) -> Result<(), StoreError>;
}

/// Session contract.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// `StoreError::Unauthenticated` when nobody is signed in.
    async fn current_user_id(&self) -> Result<UserId, StoreError>;
}

/// Device-local string storage (one string per key).
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), KvError>;
    async fn remove(&self, key: &str) -> Result<(), KvError>;
}

/// Best-effort text cleanup (e.g. an AI grammar pass).
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait TextCleanup: Send + Sync {
    async fn cleanup(&self, text: &str) -> anyhow::Result<String>;
}
