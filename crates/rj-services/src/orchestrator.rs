//! # Save Orchestrator
//!
//! validate → stage-or-send → classify → retry-or-return.

use crate::connectivity::ConnectivityMonitor;
use crate::draft::LocalDraftStore;
use crate::streak_service::StreakService;
use chrono::{DateTime, NaiveDate, Utc};
use rj_core::validation::{sanitize_entry, validate_entry};
use rj_core::{
    AuthProvider, Clock, EntryId, EntryPage, JournalEntry, JournalEntryInput, JournalRepo, Result, SaveError,
    StreakUpdate,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Linear backoff: attempt `n` (0-based) waits `base_delay * (n + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * (attempt + 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedEntry {
    pub id: EntryId,
    /// Present only for brand-new entries whose streak update succeeded.
    pub streak: Option<StreakUpdate>,
    pub is_new_entry: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(SavedEntry),
    /// Written to the local draft only; nothing was sent.
    Staged { entry_id: EntryId },
}

pub struct SaveOrchestrator {
    journals: Arc<dyn JournalRepo>,
    auth: Arc<dyn AuthProvider>,
    drafts: Arc<LocalDraftStore>,
    connectivity: Arc<ConnectivityMonitor>,
    streaks: Arc<StreakService>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl SaveOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        journals: Arc<dyn JournalRepo>,
        auth: Arc<dyn AuthProvider>,
        drafts: Arc<LocalDraftStore>,
        connectivity: Arc<ConnectivityMonitor>,
        streaks: Arc<StreakService>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            journals,
            auth,
            drafts,
            connectivity,
            streaks,
            clock,
            policy,
        }
    }

    pub fn drafts(&self) -> &Arc<LocalDraftStore> {
        &self.drafts
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    /// Saves `candidate`, updating `existing_id` when given.
    ///
    /// New entries get a client-generated id up front so a staged draft and
    /// any later replay target the same row.
    pub async fn save_entry(
        &self,
        candidate: &JournalEntryInput,
        existing_id: Option<EntryId>,
    ) -> Result<SaveOutcome> {
        validate_entry(candidate)?;
        let entry_id = existing_id.unwrap_or_else(Uuid::now_v7);

        if !self.connectivity.is_online() {
            return if self.drafts.save(candidate, Some(entry_id)).await {
                info!(%entry_id, "offline, entry staged as draft");
                Ok(SaveOutcome::Staged { entry_id })
            } else {
                error!(%entry_id, "offline and the draft could not be written");
                Err(SaveError::Network { draft_saved: false })
            };
        }

        let mut attempt = 0;
        let mut draft_saved = false;
        loop {
            match self.attempt(candidate, entry_id).await {
                Ok(saved) => {
                    self.drafts.clear().await;
                    info!(
                        id = %saved.id,
                        is_new_entry = saved.is_new_entry,
                        attempt,
                        "journal entry saved"
                    );
                    return Ok(SaveOutcome::Saved(saved));
                }
                Err(err) => {
                    let err = if err.is_network() {
                        if !draft_saved {
                            draft_saved = self.drafts.save(candidate, Some(entry_id)).await;
                        }
                        err.with_draft(draft_saved)
                    } else {
                        err
                    };

                    let budget = err.automatic_retries().min(self.policy.max_retries);
                    if attempt >= budget {
                        error!(kind = ?err.kind(), attempt, draft_saved, "save failed");
                        return Err(staged_or(err, draft_saved));
                    }

                    let delay = self.policy.delay_for(attempt);
                    warn!(kind = ?err.kind(), attempt, ?delay, "save failed, retrying");
                    tokio::time::sleep(delay).await;
                    if !self.connectivity.is_online() {
                        debug!("waiting for connectivity before retrying");
                    }
                    self.connectivity.wait_for_online().await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, candidate: &JournalEntryInput, entry_id: EntryId) -> Result<SavedEntry> {
        let user_id = self.auth.current_user_id().await?;
        let clean = sanitize_entry(candidate)?;
        let now = self.clock.now();

        let entry = JournalEntry {
            id: entry_id,
            user_id,
            date: clean.date,
            rating: clean.rating,
            liked: non_empty(clean.liked),
            didnt_like: non_empty(clean.didnt_like),
            other_thoughts: non_empty(clean.other_thoughts),
            tomorrow_plans: non_empty(clean.tomorrow_plans),
            created_at: now,
            updated_at: now,
        };

        let outcome = self.journals.upsert(entry).await.map_err(|e| {
            warn!(error = %e, "journal upsert failed");
            SaveError::from(e)
        })?;

        let streak = if outcome.created {
            self.count_streak(now).await
        } else {
            None
        };

        Ok(SavedEntry {
            id: outcome.entry.id,
            streak,
            is_new_entry: outcome.created,
        })
    }

    async fn count_streak(&self, now: DateTime<Utc>) -> Option<StreakUpdate> {
        match self.streaks.record_new_entry(now).await {
            Ok(update) => Some(update),
            Err(e) => {
                warn!(error = %e, "streak update failed, entry kept");
                None
            }
        }
    }

    pub async fn entry_for_date(&self, date: NaiveDate) -> Result<Option<JournalEntry>> {
        let user_id = self.auth.current_user_id().await?;
        Ok(self.journals.get_by_date(user_id, date).await?)
    }

    /// One page of history, newest date first.
    pub async fn history(&self, limit: u32, offset: u32) -> Result<EntryPage> {
        let user_id = self.auth.current_user_id().await?;
        let page = self.journals.list(user_id, limit, offset).await?;
        debug!(limit, offset, total = page.total, "history loaded");
        Ok(page)
    }

    pub async fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<JournalEntry>> {
        let user_id = self.auth.current_user_id().await?;
        Ok(self.journals.list_by_date(user_id, date).await?)
    }

    pub async fn delete_entry(&self, id: EntryId) -> Result<()> {
        let user_id = self.auth.current_user_id().await?;
        self.journals.delete(user_id, id).await?;
        info!(%id, "journal entry deleted");
        Ok(())
    }
}

/// Once a draft holds the entry, retryable failures report the staged network error.
fn staged_or(err: SaveError, draft_saved: bool) -> SaveError {
    if draft_saved && !err.draft_saved() && err.can_retry() {
        SaveError::Network { draft_saved: true }
    } else {
        err
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
