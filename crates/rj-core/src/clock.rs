//! # Clock and local calendar
//!
//! "Same day" and "yesterday" are decided on a local calendar date. The basis
//! is injected rather than read from the host so every comparison (and every
//! test) uses one timezone.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::sync::Mutex;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Maps UTC instants onto a local calendar and back.
pub trait LocalCalendar: Send + Sync {
    fn local_datetime(&self, at: DateTime<Utc>) -> NaiveDateTime;

    /// Earliest UTC instant for a local wall-clock time, `None` inside a DST gap.
    fn resolve_local(&self, local: NaiveDateTime) -> Option<DateTime<Utc>>;

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        self.local_datetime(at).date()
    }
}

impl<Tz> LocalCalendar for Tz
where
    Tz: TimeZone + Send + Sync,
{
    fn local_datetime(&self, at: DateTime<Utc>) -> NaiveDateTime {
        at.with_timezone(self).naive_local()
    }

    fn resolve_local(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Next local occurrence of `at` strictly after `now`.
pub fn next_local_occurrence<C>(calendar: &C, now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc>
where
    C: LocalCalendar + ?Sized,
{
    let local_now = calendar.local_datetime(now);
    let mut candidate = local_now.date().and_time(at);
    if candidate <= local_now {
        candidate += Duration::days(1);
    }
    // A wall-clock time swallowed by a DST gap fires an hour later.
    calendar
        .resolve_local(candidate)
        .or_else(|| calendar.resolve_local(candidate + Duration::hours(1)))
        .unwrap_or(now + Duration::days(1))
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn local_date_follows_the_injected_offset() {
        let at = utc("2024-01-10T23:30:00Z");
        assert_eq!(Utc.local_date(at), NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());

        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(tokyo.local_date(at), NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
    }

    #[test]
    fn next_occurrence_rolls_to_tomorrow_once_passed() {
        let at = NaiveTime::from_hms_opt(20, 0, 0).unwrap();

        let before = utc("2024-01-10T19:00:00Z");
        assert_eq!(next_local_occurrence(&Utc, before, at), utc("2024-01-10T20:00:00Z"));

        let after = utc("2024-01-10T20:00:00Z");
        assert_eq!(next_local_occurrence(&Utc, after, at), utc("2024-01-11T20:00:00Z"));
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(utc("2024-01-10T09:00:00Z"));
        clock.advance(Duration::hours(3));
        assert_eq!(clock.now(), utc("2024-01-10T12:00:00Z"));
    }
}
