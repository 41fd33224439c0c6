//! # Streak Engine
//!
//! Pure functions over [`StreakRecord`]. Callers invoke [`update_streak`] only
//! after a brand-new entry has been persisted; edits never reach this module.

use crate::clock::LocalCalendar;
use crate::models::{DayRelationship, Milestone, StreakFlags, StreakRecord, StreakUpdate};
use chrono::{DateTime, Utc};

const MILESTONES: [Milestone; 4] = [
    Milestone { days: 7, message: "One week strong! 💪", emoji: "💪" },
    Milestone { days: 30, message: "One month streak! Amazing! 🎉", emoji: "🎉" },
    Milestone { days: 100, message: "100 days! You're incredible! 🏆", emoji: "🏆" },
    Milestone { days: 365, message: "One year! Legendary! 🌟", emoji: "🌟" },
];

/// Classifies `now` against `last` on the calendar's local dates.
///
/// Never returns `FirstJournal`; that case has no `last` to compare with.
/// A `now` dated before `last` counts as `Broken`.
pub fn day_relationship<C>(calendar: &C, last: DateTime<Utc>, now: DateTime<Utc>) -> DayRelationship
where
    C: LocalCalendar + ?Sized,
{
    let last_day = calendar.local_date(last);
    let current_day = calendar.local_date(now);

    if last_day == current_day {
        DayRelationship::SameDay
    } else if current_day.pred_opt() == Some(last_day) {
        DayRelationship::Consecutive
    } else {
        DayRelationship::Broken
    }
}

pub fn update_streak<C>(
    calendar: &C,
    previous: Option<&StreakRecord>,
    now: DateTime<Utc>,
) -> StreakUpdate
where
    C: LocalCalendar + ?Sized,
{
    let prior = previous.copied().unwrap_or_default();

    let (relationship, current) = match prior.last_journal_created_at {
        None => (DayRelationship::FirstJournal, 1),
        Some(last) => match day_relationship(calendar, last, now) {
            DayRelationship::SameDay => (DayRelationship::SameDay, prior.current_streak),
            DayRelationship::Consecutive => {
                (DayRelationship::Consecutive, prior.current_streak.saturating_add(1))
            }
            other => (other, 1),
        },
    };
    let longest = prior.longest_streak.max(current);

    StreakUpdate {
        record: StreakRecord {
            current_streak: current,
            longest_streak: longest,
            last_journal_created_at: Some(now),
        },
        previous_streak: prior.current_streak,
        day_relationship: relationship,
        flags: StreakFlags {
            is_new_record: longest > prior.longest_streak,
            streak_increased: current > prior.current_streak,
            streak_reset: relationship == DayRelationship::Broken,
        },
    }
}

pub fn milestone(streak: u32) -> Option<Milestone> {
    MILESTONES.iter().copied().find(|m| m.days == streak)
}

/// Which acknowledgement to show after a new entry was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Celebration {
    Milestone(Milestone),
    NewRecord { days: u32 },
    Reset,
    SameDay { days: u32 },
    Increased { days: u32 },
}

impl Celebration {
    pub fn message(&self) -> String {
        match self {
            Celebration::Milestone(m) => m.message.to_string(),
            Celebration::NewRecord { days } => format!("🎉 New personal record! {} days!", days),
            Celebration::Reset => "Streak reset. Starting fresh at 1 day! 💪".to_string(),
            Celebration::SameDay { days } => format!(
                "Already journaled today! Current streak: {} {}",
                days,
                day_word(*days)
            ),
            Celebration::Increased { days } => {
                format!("🔥 {} {} streak! Keep it going!", days, day_word(*days))
            }
        }
    }

    /// Milestones and records get the confetti treatment.
    pub fn is_festive(&self) -> bool {
        matches!(self, Celebration::Milestone(_) | Celebration::NewRecord { .. })
    }
}

fn day_word(days: u32) -> &'static str {
    if days == 1 {
        "day"
    } else {
        "days"
    }
}

/// Priority: milestone, new record, reset, same day, increased.
pub fn celebration(update: &StreakUpdate) -> Option<Celebration> {
    let days = update.current_streak();
    if let Some(m) = milestone(days) {
        return Some(Celebration::Milestone(m));
    }
    if update.flags.is_new_record {
        return Some(Celebration::NewRecord { days });
    }
    if update.flags.streak_reset {
        return Some(Celebration::Reset);
    }
    if update.day_relationship == DayRelationship::SameDay {
        return Some(Celebration::SameDay { days });
    }
    if update.flags.streak_increased {
        return Some(Celebration::Increased { days });
    }
    None
}
