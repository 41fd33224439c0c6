//! # rj-db-sqlite Implementation
//!
//! Maps the SQLite relational model onto `rj-core` journal and streak models.
//! Ids are stored as 16-byte BLOBs, timestamps as RFC 3339 TEXT.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rj_core::models::{EntryId, EntryPage, JournalEntry, StreakRecord, UpsertOutcome, UserId};
use rj_core::traits::{JournalRepo, StreakRepo};
use rj_core::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS journal_entries (
        id              BLOB PRIMARY KEY,
        user_id         BLOB NOT NULL,
        date            TEXT NOT NULL,
        rating          REAL CHECK (rating IS NULL OR (rating >= 1 AND rating <= 10)),
        liked           TEXT,
        didnt_like      TEXT,
        other_thoughts  TEXT,
        tomorrow_plans  TEXT,
        created_at      TEXT NOT NULL,
        updated_at      TEXT NOT NULL,
        revision        INTEGER NOT NULL DEFAULT 1
    )",
    "CREATE INDEX IF NOT EXISTS idx_journal_entries_user_date ON journal_entries (user_id, date)",
    "CREATE TABLE IF NOT EXISTS user_streaks (
        user_id                 BLOB PRIMARY KEY,
        current_streak          INTEGER NOT NULL DEFAULT 0,
        longest_streak          INTEGER NOT NULL DEFAULT 0,
        last_journal_created_at TEXT,
        updated_at              TEXT NOT NULL
    )",
];

const ENTRY_COLUMNS: &str = "id, user_id, date, rating, liked, didnt_like, other_thoughts, \
                             tomorrow_plans, created_at, updated_at, revision";

/// Opens a pool. In-memory databases are pinned to one connection, since
/// each SQLite connection would otherwise see its own empty database.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(map_sqlx)?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = url.contains(":memory:");
    let mut pool_options = SqlitePoolOptions::new();
    let max_connections = if in_memory {
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        1
    } else {
        max_connections.max(1)
    };

    let pool = pool_options
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(map_sqlx)?;
    debug!(url, max_connections, "sqlite pool opened");
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await.map_err(map_sqlx)?;
    }
    info!("sqlite schema ready");
    Ok(())
}

/// Translates driver errors. Raw detail stays inside the `StoreError`.
pub fn map_sqlx(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => {
            let message = db.message().to_string();
            if message.contains("no such table") {
                StoreError::NotProvisioned(message)
            } else if db.is_unique_violation() {
                StoreError::Conflict(message)
            } else if db.is_check_violation() || db.is_foreign_key_violation() {
                StoreError::Invalid(message)
            } else {
                StoreError::Backend(message)
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound("row".into()),
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Connection(err.to_string()),
        sqlx::Error::Tls(_) => StoreError::Network(err.to_string()),
        _ => StoreError::Backend(err.to_string()),
    }
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Result<Uuid, StoreError> {
    Uuid::from_slice(blob).map_err(|e| StoreError::Backend(format!("malformed id: {e}")))
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(map_sqlx)
}

fn row_to_entry(row: &SqliteRow) -> Result<JournalEntry, StoreError> {
    Ok(JournalEntry {
        id: blob_to_uuid(&column::<Vec<u8>>(row, "id")?)?,
        user_id: blob_to_uuid(&column::<Vec<u8>>(row, "user_id")?)?,
        date: column::<NaiveDate>(row, "date")?,
        rating: column::<Option<f64>>(row, "rating")?,
        liked: column(row, "liked")?,
        didnt_like: column(row, "didnt_like")?,
        other_thoughts: column(row, "other_thoughts")?,
        tomorrow_plans: column(row, "tomorrow_plans")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
        updated_at: column::<DateTime<Utc>>(row, "updated_at")?,
    })
}

pub struct SqliteJournalRepo {
    pool: SqlitePool,
}

impl SqliteJournalRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JournalRepo for SqliteJournalRepo {
    /// Single-statement upsert. `revision` starts at 1 and is bumped on every
    /// update, so `created` is decided by the same write that stores the row.
    /// The `WHERE` guard leaves rows of other users untouched and returns
    /// nothing for them.
    async fn upsert(&self, entry: JournalEntry) -> Result<UpsertOutcome, StoreError> {
        let sql = format!(
            "INSERT INTO journal_entries (id, user_id, date, rating, liked, didnt_like, \
                 other_thoughts, tomorrow_plans, created_at, updated_at, revision)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)
             ON CONFLICT(id) DO UPDATE SET
                 date = excluded.date,
                 rating = excluded.rating,
                 liked = excluded.liked,
                 didnt_like = excluded.didnt_like,
                 other_thoughts = excluded.other_thoughts,
                 tomorrow_plans = excluded.tomorrow_plans,
                 updated_at = excluded.updated_at,
                 revision = journal_entries.revision + 1
             WHERE journal_entries.user_id = excluded.user_id
             RETURNING {ENTRY_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(uuid_to_blob(entry.id))
            .bind(uuid_to_blob(entry.user_id))
            .bind(entry.date)
            .bind(entry.rating)
            .bind(entry.liked)
            .bind(entry.didnt_like)
            .bind(entry.other_thoughts)
            .bind(entry.tomorrow_plans)
            .bind(entry.created_at)
            .bind(entry.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let Some(row) = row else {
            return Err(StoreError::PermissionDenied(format!(
                "journal entry {} belongs to another user",
                entry.id
            )));
        };

        let revision: i64 = column(&row, "revision")?;
        Ok(UpsertOutcome {
            entry: row_to_entry(&row)?,
            created: revision == 1,
        })
    }

    async fn get(&self, user_id: UserId, id: EntryId) -> Result<Option<JournalEntry>, StoreError> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE id = ? AND user_id = ?");
        let row = sqlx::query(&sql)
            .bind(uuid_to_blob(id))
            .bind(uuid_to_blob(user_id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn get_by_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Option<JournalEntry>, StoreError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries
             WHERE user_id = ? AND date = ?
             ORDER BY julianday(created_at) DESC
             LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(uuid_to_blob(user_id))
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn list(&self, user_id: UserId, limit: u32, offset: u32) -> Result<EntryPage, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM journal_entries WHERE user_id = ?")
            .bind(uuid_to_blob(user_id))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries
             WHERE user_id = ?
             ORDER BY date DESC, julianday(created_at) DESC
             LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&sql)
            .bind(uuid_to_blob(user_id))
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let entries = rows.iter().map(row_to_entry).collect::<Result<Vec<_>, _>>()?;
        Ok(EntryPage::new(entries, total.max(0) as u64, offset))
    }

    async fn list_by_date(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries
             WHERE user_id = ? AND date = ?
             ORDER BY julianday(created_at) DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(uuid_to_blob(user_id))
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn delete(&self, user_id: UserId, id: EntryId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM journal_entries WHERE id = ? AND user_id = ?")
            .bind(uuid_to_blob(id))
            .bind(uuid_to_blob(user_id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("journal entry {id}")));
        }
        Ok(())
    }
}

pub struct SqliteStreakRepo {
    pool: SqlitePool,
}

impl SqliteStreakRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StreakRepo for SqliteStreakRepo {
    async fn get(&self, user_id: UserId) -> Result<Option<StreakRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT current_streak, longest_streak, last_journal_created_at
             FROM user_streaks WHERE user_id = ?",
        )
        .bind(uuid_to_blob(user_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(StreakRecord {
            current_streak: column::<i64>(&row, "current_streak")?.max(0) as u32,
            longest_streak: column::<i64>(&row, "longest_streak")?.max(0) as u32,
            last_journal_created_at: column(&row, "last_journal_created_at")?,
        }))
    }

    async fn upsert(&self, user_id: UserId, record: StreakRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO user_streaks (user_id, current_streak, longest_streak, last_journal_created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 current_streak = excluded.current_streak,
                 longest_streak = excluded.longest_streak,
                 last_journal_created_at = excluded.last_journal_created_at,
                 updated_at = excluded.updated_at",
        )
        .bind(uuid_to_blob(user_id))
        .bind(i64::from(record.current_streak))
        .bind(i64::from(record.longest_streak))
        .bind(record.last_journal_created_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }
}
