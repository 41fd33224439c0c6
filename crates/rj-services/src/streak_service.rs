//! # Streak Service
//!
//! Read-modify-write of a user's [`StreakRecord`] around the pure engine in
//! `rj_core::streak`, serialized per user.

use dashmap::DashMap;
use rj_core::streak::update_streak;
use rj_core::{AuthProvider, LocalCalendar, StoreError, StreakRecord, StreakRepo, StreakUpdate, UserId};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct StreakService {
    repo: Arc<dyn StreakRepo>,
    auth: Arc<dyn AuthProvider>,
    calendar: Arc<dyn LocalCalendar>,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl StreakService {
    pub fn new(
        repo: Arc<dyn StreakRepo>,
        auth: Arc<dyn AuthProvider>,
        calendar: Arc<dyn LocalCalendar>,
    ) -> Self {
        Self {
            repo,
            auth,
            calendar,
            locks: DashMap::new(),
        }
    }

    fn user_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        self.locks.entry(user_id).or_default().clone()
    }

    /// Counts one brand-new entry created at `now`.
    ///
    /// Without a session this is the neutral zero-state. When streak storage
    /// is not provisioned the computed result is returned unpersisted.
    pub async fn record_new_entry(&self, now: DateTime<Utc>) -> Result<StreakUpdate, StoreError> {
        let user_id = match self.auth.current_user_id().await {
            Ok(id) => id,
            Err(StoreError::Unauthenticated) => {
                debug!("no session, returning neutral streak");
                return Ok(StreakUpdate::neutral());
            }
            Err(e) => return Err(e),
        };

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let previous = match self.repo.get(user_id).await {
            Ok(record) => record,
            Err(StoreError::NotProvisioned(detail)) => {
                warn!(%detail, "streak storage not provisioned, using defaults");
                return Ok(StreakUpdate::first_journal(now));
            }
            Err(e) => return Err(e),
        };

        let update = update_streak(self.calendar.as_ref(), previous.as_ref(), now);

        match self.repo.upsert(user_id, update.record).await {
            Ok(()) => {}
            Err(StoreError::NotProvisioned(detail)) => {
                warn!(%detail, "streak storage not provisioned, result not persisted");
                return Ok(update);
            }
            Err(e) => return Err(e),
        }

        info!(
            user_id = %user_id,
            current = update.record.current_streak,
            longest = update.record.longest_streak,
            relationship = update.day_relationship.as_str(),
            "streak updated"
        );
        Ok(update)
    }

    /// Current record for display. Any failure reads as the zero record.
    pub async fn current(&self) -> StreakRecord {
        let user_id = match self.auth.current_user_id().await {
            Ok(id) => id,
            Err(_) => return StreakRecord::default(),
        };
        match self.repo.get(user_id).await {
            Ok(record) => record.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "failed to read streak");
                StreakRecord::default()
            }
        }
    }
}
