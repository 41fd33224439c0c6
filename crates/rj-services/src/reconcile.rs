//! # Reconciliation Flow
//!
//! Offers a staged draft back to the user after reconnecting. Nothing is
//! written without an explicit [`SyncDecision`].

use crate::orchestrator::{SaveOrchestrator, SaveOutcome, SavedEntry};
use rj_core::{Draft, SaveError};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SyncPrompt {
    pub draft: Draft,
    pub age_hours: i64,
    pub age_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    SyncNow,
    Discard,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Synced(SavedEntry),
    Discarded,
    /// The draft is kept and the prompt should be shown again.
    Retry { reason: Option<SaveError> },
    NothingPending,
}

pub fn describe_age(hours: i64) -> String {
    match hours {
        h if h < 1 => "just now".to_string(),
        1 => "1 hour ago".to_string(),
        h => format!("{h} hours ago"),
    }
}

pub struct ReconciliationFlow {
    orchestrator: Arc<SaveOrchestrator>,
}

impl ReconciliationFlow {
    pub fn new(orchestrator: Arc<SaveOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// A prompt when back online after an offline period with a draft waiting.
    pub async fn pending(&self) -> Option<SyncPrompt> {
        if !self.orchestrator.connectivity().just_reconnected() {
            return None;
        }
        let drafts = self.orchestrator.drafts();
        let draft = drafts.load().await?;
        let age_hours = drafts.age_in_hours().await.unwrap_or(0);
        Some(SyncPrompt {
            draft,
            age_hours,
            age_text: describe_age(age_hours),
        })
    }

    pub async fn resolve(&self, decision: SyncDecision) -> ReconcileOutcome {
        let drafts = self.orchestrator.drafts();
        let connectivity = self.orchestrator.connectivity();

        let Some(draft) = drafts.load().await else {
            connectivity.clear_was_offline();
            return ReconcileOutcome::NothingPending;
        };

        match decision {
            SyncDecision::Discard => {
                drafts.clear().await;
                connectivity.clear_was_offline();
                info!("staged draft discarded");
                ReconcileOutcome::Discarded
            }
            SyncDecision::SyncNow => {
                match self.orchestrator.save_entry(&draft.entry, draft.entry_id).await {
                    Ok(SaveOutcome::Saved(saved)) => {
                        connectivity.clear_was_offline();
                        info!(id = %saved.id, "staged draft synced");
                        ReconcileOutcome::Synced(saved)
                    }
                    Ok(SaveOutcome::Staged { .. }) => {
                        warn!("went offline again during sync, draft kept");
                        ReconcileOutcome::Retry { reason: None }
                    }
                    Err(err) => {
                        warn!(kind = ?err.kind(), "draft sync failed, draft kept");
                        if !err.draft_saved() && !drafts.has().await && !drafts.restore(&draft).await {
                            warn!(
                                saved_at = %draft.saved_at,
                                "could not put the draft back, it is lost"
                            );
                        }
                        ReconcileOutcome::Retry { reason: Some(err) }
                    }
                }
            }
        }
    }
}
