#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rj_auth_simple::SessionAuthProvider;
use rj_core::{
    AuthProvider, EntryId, EntryPage, JournalEntry, JournalEntryInput, JournalRepo, KeyValueStore,
    ManualClock, StoreError, StreakRepo, UpsertOutcome, UserId,
};
use rj_services::{
    ConnectivityMonitor, LocalDraftStore, ReconciliationFlow, RetryPolicy, SaveOrchestrator,
    StreakService,
};
use rj_storage_local::MemoryKeyValueStore;
use rj_store_memory::{MemoryJournalRepo, MemoryStreakRepo};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Memory repo that fails upserts from a queue before delegating.
#[derive(Default)]
pub struct FlakyJournalRepo {
    pub inner: MemoryJournalRepo,
    failures: Mutex<VecDeque<StoreError>>,
    upserts: AtomicUsize,
    drop_link: Mutex<Option<Arc<ConnectivityMonitor>>>,
}

impl FlakyJournalRepo {
    pub fn fail_next(&self, errors: impl IntoIterator<Item = StoreError>) {
        self.failures.lock().unwrap().extend(errors);
    }

    /// Reports the device offline whenever an injected failure fires.
    pub fn drop_link_on_failure(&self, connectivity: Arc<ConnectivityMonitor>) {
        *self.drop_link.lock().unwrap() = Some(connectivity);
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JournalRepo for FlakyJournalRepo {
    async fn upsert(&self, entry: JournalEntry) -> Result<UpsertOutcome, StoreError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let failure = self.failures.lock().unwrap().pop_front();
        if let Some(err) = failure {
            if let Some(link) = self.drop_link.lock().unwrap().as_ref() {
                link.report(false);
            }
            return Err(err);
        }
        self.inner.upsert(entry).await
    }

    async fn get(&self, user_id: UserId, id: EntryId) -> Result<Option<JournalEntry>, StoreError> {
        self.inner.get(user_id, id).await
    }

    async fn get_by_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Option<JournalEntry>, StoreError> {
        self.inner.get_by_date(user_id, date).await
    }

    async fn list(&self, user_id: UserId, limit: u32, offset: u32) -> Result<EntryPage, StoreError> {
        self.inner.list(user_id, limit, offset).await
    }

    async fn list_by_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        self.inner.list_by_date(user_id, date).await
    }

    async fn delete(&self, user_id: UserId, id: EntryId) -> Result<(), StoreError> {
        self.inner.delete(user_id, id).await
    }
}

pub struct Harness {
    pub user: UserId,
    pub journals: Arc<FlakyJournalRepo>,
    pub streak_repo: Arc<dyn StreakRepo>,
    pub clock: Arc<ManualClock>,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub drafts: Arc<LocalDraftStore>,
    pub streaks: Arc<StreakService>,
    pub orchestrator: Arc<SaveOrchestrator>,
}

pub struct HarnessBuilder {
    online: bool,
    auth: Option<Arc<dyn AuthProvider>>,
    streak_repo: Option<Arc<dyn StreakRepo>>,
    kv: Option<Arc<dyn KeyValueStore>>,
}

impl HarnessBuilder {
    pub fn offline(mut self) -> Self {
        self.online = false;
        self
    }

    pub fn auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn streak_repo(mut self, repo: Arc<dyn StreakRepo>) -> Self {
        self.streak_repo = Some(repo);
        self
    }

    pub fn kv(mut self, kv: Arc<dyn KeyValueStore>) -> Self {
        self.kv = Some(kv);
        self
    }

    pub fn build(self) -> Harness {
        let user = Uuid::new_v4();
        let clock = Arc::new(ManualClock::new(at(10, 9)));
        let auth = self
            .auth
            .unwrap_or_else(|| Arc::new(SessionAuthProvider::signed_in(user)) as Arc<dyn AuthProvider>);
        let streak_repo = self
            .streak_repo
            .unwrap_or_else(|| Arc::new(MemoryStreakRepo::new()) as Arc<dyn StreakRepo>);
        let kv = self
            .kv
            .unwrap_or_else(|| Arc::new(MemoryKeyValueStore::new()) as Arc<dyn KeyValueStore>);

        let journals = Arc::new(FlakyJournalRepo::default());
        let connectivity = Arc::new(ConnectivityMonitor::new(self.online));
        let drafts = Arc::new(LocalDraftStore::new(kv, clock.clone()));
        let streaks = Arc::new(StreakService::new(streak_repo.clone(), auth.clone(), Arc::new(Utc)));
        let orchestrator = Arc::new(SaveOrchestrator::new(
            journals.clone(),
            auth,
            drafts.clone(),
            connectivity.clone(),
            streaks.clone(),
            clock.clone(),
            RetryPolicy::default(),
        ));

        Harness {
            user,
            journals,
            streak_repo,
            clock,
            connectivity,
            drafts,
            streaks,
            orchestrator,
        }
    }
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            online: true,
            auth: None,
            streak_repo: None,
            kv: None,
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn reconciliation(&self) -> ReconciliationFlow {
        ReconciliationFlow::new(self.orchestrator.clone())
    }
}

/// 2024-01-`day` at `hour`:00 UTC.
pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

pub fn entry(date: &str, liked: &str) -> JournalEntryInput {
    JournalEntryInput {
        date: date.to_string(),
        rating: Some(8.0),
        liked: liked.to_string(),
        didnt_like: String::new(),
        other_thoughts: String::new(),
        tomorrow_plans: "stretch".to_string(),
    }
}
