//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Journal.
//! Entry ids are UUID v7 (time-ordered), generated on the client for new entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type EntryId = Uuid;
pub type UserId = Uuid;

/// A journal entry as typed (or dictated) by the user, before validation.
///
/// This is also the payload of a [`Draft`], so the values are kept verbatim
/// for later re-editing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntryInput {
    /// User-assigned calendar date (`YYYY-MM-DD`), distinct from creation time.
    pub date: String,
    pub rating: Option<f64>,
    #[serde(default)]
    pub liked: String,
    #[serde(default)]
    pub didnt_like: String,
    #[serde(default)]
    pub other_thoughts: String,
    #[serde(default)]
    pub tomorrow_plans: String,
}

impl JournalEntryInput {
    /// The four free-text fields, labelled for error messages.
    pub fn text_fields(&self) -> [(&'static str, &str); 4] {
        [
            ("liked", self.liked.as_str()),
            ("didntLike", self.didnt_like.as_str()),
            ("otherThoughts", self.other_thoughts.as_str()),
            ("tomorrowPlans", self.tomorrow_plans.as_str()),
        ]
    }
}

/// A persisted journal entry, scoped to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub date: NaiveDate,
    /// Within [1.0, 10.0], one decimal.
    pub rating: Option<f64>,
    pub liked: Option<String>,
    pub didnt_like: Option<String>,
    pub other_thoughts: Option<String>,
    pub tomorrow_plans: Option<String>,
    /// Set once on creation and preserved across edits by the store.
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a keyed upsert. `created` is decided by the store in the same
/// operation as the write.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub entry: JournalEntry,
    pub created: bool,
}

/// One page of a user's history, newest date first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPage {
    pub entries: Vec<JournalEntry>,
    /// All entries the user has, across pages.
    pub total: u64,
    pub has_more: bool,
}

impl EntryPage {
    pub fn new(entries: Vec<JournalEntry>, total: u64, offset: u32) -> Self {
        let has_more = total > u64::from(offset) + entries.len() as u64;
        Self {
            entries,
            total,
            has_more,
        }
    }
}

/// A client-side staged entry awaiting a successful remote write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    #[serde(flatten)]
    pub entry: JournalEntryInput,
    /// Id the staged save was targeting, so a replay lands on the same row.
    #[serde(default)]
    pub entry_id: Option<EntryId>,
    pub saved_at: DateTime<Utc>,
}

/// Per-user streak bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_journal_created_at: Option<DateTime<Utc>>,
}

/// Calendar relationship between the last counted write and a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayRelationship {
    FirstJournal,
    SameDay,
    Consecutive,
    Broken,
}

impl DayRelationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayRelationship::FirstJournal => "first_journal",
            DayRelationship::SameDay => "same_day",
            DayRelationship::Consecutive => "consecutive",
            DayRelationship::Broken => "broken",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakFlags {
    /// `longest_streak` increased during this update.
    pub is_new_record: bool,
    /// `current_streak` is greater than before this update.
    pub streak_increased: bool,
    /// The day relationship was `broken`.
    pub streak_reset: bool,
}

/// Output of the streak engine for one new-entry write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakUpdate {
    pub record: StreakRecord,
    pub previous_streak: u32,
    pub day_relationship: DayRelationship,
    pub flags: StreakFlags,
}

impl StreakUpdate {
    /// Zero-state for callers without a session. Nothing is mutated.
    pub fn neutral() -> Self {
        Self {
            record: StreakRecord::default(),
            previous_streak: 0,
            day_relationship: DayRelationship::SameDay,
            flags: StreakFlags::default(),
        }
    }

    /// Computed default for when streak storage is not provisioned yet.
    pub fn first_journal(now: DateTime<Utc>) -> Self {
        Self {
            record: StreakRecord {
                current_streak: 1,
                longest_streak: 1,
                last_journal_created_at: Some(now),
            },
            previous_streak: 0,
            day_relationship: DayRelationship::FirstJournal,
            flags: StreakFlags {
                is_new_record: true,
                streak_increased: true,
                streak_reset: false,
            },
        }
    }

    pub fn current_streak(&self) -> u32 {
        self.record.current_streak
    }
}

/// A celebrated streak length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub days: u32,
    pub message: &'static str,
    pub emoji: &'static str,
}
