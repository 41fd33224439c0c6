//! Assembles the services from the adapters selected at compile time.

use anyhow::{anyhow, Context};
use chrono::{FixedOffset, Local};
use configs::AppConfig;
use rj_auth_simple::SessionAuthProvider;
use rj_core::{Clock, JournalRepo, KeyValueStore, LocalCalendar, StreakRepo, SystemClock, TextCleanup};
use rj_services::{
    ConnectivityMonitor, LocalDraftStore, ReconciliationFlow, RetryPolicy, SaveOrchestrator,
    StreakService, TextCleaner,
};
use rj_storage_local::FileKeyValueStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

// Feature-gated imports
#[cfg(feature = "db-sqlite")]
use rj_db_sqlite::{SqliteJournalRepo, SqliteStreakRepo};

#[cfg(all(feature = "db-memory", not(feature = "db-sqlite")))]
use rj_store_memory::{MemoryJournalRepo, MemoryStreakRepo};

#[cfg(feature = "cleanup-http")]
use rj_cleanup_http::HttpTextCleanup;

#[cfg(not(any(feature = "db-sqlite", feature = "db-memory")))]
compile_error!("enable one of the `db-sqlite` or `db-memory` features");

pub struct App {
    pub orchestrator: Arc<SaveOrchestrator>,
    pub reconcile: ReconciliationFlow,
    pub streaks: Arc<StreakService>,
    pub cleaner: TextCleaner,
    pub clock: Arc<dyn Clock>,
    pub calendar: Arc<dyn LocalCalendar>,
}

pub struct Overrides {
    pub offline: bool,
    pub profile: Option<String>,
}

fn calendar(cfg: &AppConfig) -> anyhow::Result<Arc<dyn LocalCalendar>> {
    let calendar: Arc<dyn LocalCalendar> = match cfg.calendar.utc_offset_minutes {
        Some(minutes) => Arc::new(
            FixedOffset::east_opt(minutes * 60)
                .ok_or_else(|| anyhow!("utc offset of {minutes} minutes is out of range"))?,
        ),
        None => Arc::new(Local),
    };
    Ok(calendar)
}

#[cfg(feature = "db-sqlite")]
async fn repositories(cfg: &AppConfig) -> anyhow::Result<(Arc<dyn JournalRepo>, Arc<dyn StreakRepo>)> {
    let pool = rj_db_sqlite::connect(&cfg.database.url, cfg.database.max_connections)
        .await
        .context("failed to open the journal database")?;
    rj_db_sqlite::migrate(&pool).await.context("failed to prepare the schema")?;
    let journals: Arc<dyn JournalRepo> = Arc::new(SqliteJournalRepo::new(pool.clone()));
    let streaks: Arc<dyn StreakRepo> = Arc::new(SqliteStreakRepo::new(pool));
    Ok((journals, streaks))
}

#[cfg(all(feature = "db-memory", not(feature = "db-sqlite")))]
async fn repositories(_cfg: &AppConfig) -> anyhow::Result<(Arc<dyn JournalRepo>, Arc<dyn StreakRepo>)> {
    tracing::warn!("memory-backed build, entries are lost on exit");
    let journals: Arc<dyn JournalRepo> = Arc::new(MemoryJournalRepo::new());
    let streaks: Arc<dyn StreakRepo> = Arc::new(MemoryStreakRepo::new());
    Ok((journals, streaks))
}

#[cfg(feature = "cleanup-http")]
fn remote_cleanup(cfg: AppConfig) -> anyhow::Result<Option<Arc<dyn TextCleanup>>> {
    let cleanup = cfg.cleanup;
    match cleanup.endpoint {
        Some(endpoint) => {
            let client: Arc<dyn TextCleanup> = Arc::new(HttpTextCleanup::new(
                endpoint,
                cleanup.api_key,
                Duration::from_secs(cleanup.timeout_secs),
            )?);
            Ok(Some(client))
        }
        None => Ok(None),
    }
}

#[cfg(not(feature = "cleanup-http"))]
fn remote_cleanup(_cfg: AppConfig) -> anyhow::Result<Option<Arc<dyn TextCleanup>>> {
    Ok(None)
}

impl App {
    pub async fn build(cfg: AppConfig, overrides: Overrides) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let calendar = calendar(&cfg)?;
        let (journals, streak_repo) = repositories(&cfg).await?;

        let profile = overrides.profile.unwrap_or_else(|| cfg.profile.name.clone());
        let auth = Arc::new(SessionAuthProvider::for_profile(&profile));
        debug!(%profile, "profile selected");

        let mut kv = FileKeyValueStore::new(cfg.drafts.dir.clone());
        if let Some(quota) = cfg.drafts.quota_bytes {
            kv = kv.with_quota(quota);
        }
        let kv: Arc<dyn KeyValueStore> = Arc::new(kv);
        let drafts = Arc::new(LocalDraftStore::with_max_age(
            kv,
            clock.clone(),
            chrono::Duration::days(cfg.drafts.max_age_days),
        ));

        // A draft left by an earlier run means that run ended offline.
        let pending_draft = drafts.has().await;
        let connectivity = Arc::new(ConnectivityMonitor::with_state(!overrides.offline, pending_draft));

        let streaks = Arc::new(StreakService::new(streak_repo, auth.clone(), calendar.clone()));
        let policy = RetryPolicy {
            max_retries: cfg.retry.max_retries,
            base_delay: Duration::from_millis(cfg.retry.base_delay_ms),
        };
        let orchestrator = Arc::new(SaveOrchestrator::new(
            journals,
            auth,
            drafts,
            connectivity.clone(),
            streaks.clone(),
            clock.clone(),
            policy,
        ));

        let cleaner = TextCleaner::new(remote_cleanup(cfg)?, connectivity);
        info!(offline = overrides.offline, pending_draft, "rusty-journal ready");

        Ok(Self {
            reconcile: ReconciliationFlow::new(orchestrator.clone()),
            orchestrator,
            streaks,
            cleaner,
            clock,
            calendar,
        })
    }
}
