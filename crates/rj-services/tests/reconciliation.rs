mod common;

use chrono::Duration;
use common::{entry, Harness};
use rj_core::{SaveError, StoreError};
use rj_services::{ReconcileOutcome, SaveOutcome, SyncDecision};

#[tokio::test(start_paused = true)]
async fn offline_draft_is_offered_and_discarded() {
    let h = Harness::builder().offline().build();
    let flow = h.reconciliation();

    let outcome = h
        .orchestrator
        .save_entry(&entry("2024-01-10", "wrote on the train"), None)
        .await
        .unwrap();
    assert!(matches!(outcome, SaveOutcome::Staged { .. }));
    assert!(flow.pending().await.is_none(), "still offline");

    h.clock.advance(Duration::hours(3));
    h.connectivity.report(true);

    let prompt = flow.pending().await.expect("reconnection prompt");
    assert_eq!(prompt.age_hours, 3);
    assert_eq!(prompt.age_text, "3 hours ago");
    assert_eq!(prompt.draft.entry.liked, "wrote on the train");

    assert_eq!(flow.resolve(SyncDecision::Discard).await, ReconcileOutcome::Discarded);
    assert!(!h.drafts.has().await);
    assert!(!h.connectivity.was_offline());
    assert_eq!(h.journals.upserts(), 0);
    assert!(h.journals.inner.is_empty());
    assert!(flow.pending().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn sync_now_writes_the_draft_and_clears_state() {
    let h = Harness::builder().offline().build();
    let flow = h.reconciliation();
    let SaveOutcome::Staged { entry_id } = h
        .orchestrator
        .save_entry(&entry("2024-01-10", "sunrise"), None)
        .await
        .unwrap()
    else {
        panic!("expected staged outcome");
    };

    h.connectivity.report(true);
    let ReconcileOutcome::Synced(saved) = flow.resolve(SyncDecision::SyncNow).await else {
        panic!("expected sync");
    };

    assert_eq!(saved.id, entry_id);
    assert!(saved.is_new_entry);
    assert_eq!(saved.streak.map(|s| s.current_streak()), Some(1));
    assert!(!h.drafts.has().await);
    assert!(!h.connectivity.was_offline());
    assert!(flow.pending().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_sync_keeps_the_draft_for_another_prompt() {
    let h = Harness::builder().offline().build();
    let flow = h.reconciliation();
    h.orchestrator
        .save_entry(&entry("2024-01-10", "sunrise"), None)
        .await
        .unwrap();

    h.connectivity.report(true);
    h.journals.fail_next([StoreError::PermissionDenied("policy".into())]);

    let outcome = flow.resolve(SyncDecision::SyncNow).await;
    assert_eq!(
        outcome,
        ReconcileOutcome::Retry {
            reason: Some(SaveError::PermissionDenied)
        }
    );
    assert!(h.drafts.has().await);
    assert!(flow.pending().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn failed_sync_keeps_the_original_draft_age() {
    let h = Harness::builder().offline().build();
    let flow = h.reconciliation();
    h.orchestrator
        .save_entry(&entry("2024-01-10", "sunrise"), None)
        .await
        .unwrap();

    h.clock.advance(Duration::hours(30));
    h.connectivity.report(true);
    assert_eq!(flow.pending().await.unwrap().age_hours, 30);

    h.journals.fail_next((0..3).map(|_| StoreError::Network("timeout".into())));
    assert_eq!(
        flow.resolve(SyncDecision::SyncNow).await,
        ReconcileOutcome::Retry {
            reason: Some(SaveError::Network { draft_saved: true })
        }
    );

    let prompt = flow.pending().await.expect("draft offered again");
    assert_eq!(prompt.age_hours, 30);
    assert_eq!(prompt.age_text, "30 hours ago");

    h.clock.advance(Duration::days(7));
    assert!(flow.pending().await.is_none(), "age limit still applies");
}

#[tokio::test(start_paused = true)]
async fn non_network_sync_failure_leaves_the_draft_untouched() {
    let h = Harness::builder().offline().build();
    let flow = h.reconciliation();
    h.orchestrator
        .save_entry(&entry("2024-01-10", "sunrise"), None)
        .await
        .unwrap();
    h.clock.advance(Duration::hours(4));
    h.connectivity.report(true);

    h.journals.fail_next([
        StoreError::Backend("disk I/O error".into()),
        StoreError::Backend("disk I/O error".into()),
    ]);
    let outcome = flow.resolve(SyncDecision::SyncNow).await;
    assert_eq!(outcome, ReconcileOutcome::Retry { reason: Some(SaveError::Unknown) });
    assert_eq!(h.drafts.age_in_hours().await, Some(4));
}

#[tokio::test(start_paused = true)]
async fn replaying_an_edit_never_touches_the_streak() {
    let h = Harness::new();
    let flow = h.reconciliation();
    let SaveOutcome::Saved(first) = h
        .orchestrator
        .save_entry(&entry("2024-01-10", "coffee"), None)
        .await
        .unwrap()
    else {
        panic!("expected remote save");
    };
    let streak_before = h.streaks.current().await;

    h.connectivity.report(false);
    h.clock.advance(Duration::days(1));
    h.orchestrator
        .save_entry(&entry("2024-01-10", "coffee, second thoughts"), Some(first.id))
        .await
        .unwrap();

    h.connectivity.report(true);
    let ReconcileOutcome::Synced(replayed) = flow.resolve(SyncDecision::SyncNow).await else {
        panic!("expected sync");
    };
    assert_eq!(replayed.id, first.id);
    assert!(!replayed.is_new_entry);
    assert_eq!(h.streaks.current().await, streak_before);
}

#[tokio::test(start_paused = true)]
async fn stale_draft_is_never_offered() {
    let h = Harness::builder().offline().build();
    let flow = h.reconciliation();
    h.orchestrator
        .save_entry(&entry("2024-01-10", "old news"), None)
        .await
        .unwrap();

    h.clock.advance(Duration::days(8));
    h.connectivity.report(true);
    assert!(flow.pending().await.is_none());
    assert_eq!(flow.resolve(SyncDecision::SyncNow).await, ReconcileOutcome::NothingPending);
    assert_eq!(h.journals.upserts(), 0);
}

#[tokio::test(start_paused = true)]
async fn no_prompt_without_an_offline_period() {
    let h = Harness::new();
    h.drafts.save(&entry("2024-01-10", "left over"), None).await;
    assert!(h.reconciliation().pending().await.is_none());
}
