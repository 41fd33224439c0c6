//! # Reminder Scheduler
//!
//! Timers are owned by a [`TimerRegistry`] held by whoever starts them.
//! Dropping the registry aborts everything it still holds.

use chrono::NaiveTime;
use rj_core::{next_local_occurrence, Clock, LocalCalendar};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Receives fired reminders.
pub trait ReminderSink: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

#[derive(Default)]
pub struct TimerRegistry {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock().unwrap_or_else(|p| p.into_inner());
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    pub fn active(&self) -> usize {
        let handles = self.handles.lock().unwrap_or_else(|p| p.into_inner());
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    pub fn cancel_all(&self) {
        let mut handles = self.handles.lock().unwrap_or_else(|p| p.into_inner());
        let count = handles.len();
        for handle in handles.drain(..) {
            handle.abort();
        }
        if count > 0 {
            debug!(count, "timers cancelled");
        }
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

pub struct ReminderScheduler {
    clock: Arc<dyn Clock>,
    calendar: Arc<dyn LocalCalendar>,
    sink: Arc<dyn ReminderSink>,
    timers: TimerRegistry,
}

impl ReminderScheduler {
    pub fn new(clock: Arc<dyn Clock>, calendar: Arc<dyn LocalCalendar>, sink: Arc<dyn ReminderSink>) -> Self {
        Self {
            clock,
            calendar,
            sink,
            timers: TimerRegistry::new(),
        }
    }

    /// Fires at the next local `at`, then once per local day.
    pub fn schedule_daily(&self, at: NaiveTime, title: impl Into<String>, body: impl Into<String>) {
        let clock = self.clock.clone();
        let calendar = self.calendar.clone();
        let sink = self.sink.clone();
        let title = title.into();
        let body = body.into();

        let handle = tokio::spawn(async move {
            loop {
                let now = clock.now();
                let next = next_local_occurrence(calendar.as_ref(), now, at);
                let wait = match (next - now).to_std() {
                    Ok(wait) => wait,
                    Err(e) => {
                        warn!(error = %e, "reminder time already passed, firing now");
                        std::time::Duration::ZERO
                    }
                };
                debug!(%next, "next reminder scheduled");
                tokio::time::sleep(wait).await;
                info!(%title, "reminder fired");
                sink.notify(&title, &body);
            }
        });
        self.timers.register(handle);
    }

    pub fn active(&self) -> usize {
        self.timers.active()
    }

    pub fn cancel_all(&self) {
        self.timers.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rj_core::ManualClock;

    #[derive(Default)]
    struct RecordingSink {
        fired: Mutex<Vec<String>>,
    }

    impl ReminderSink for RecordingSink {
        fn notify(&self, title: &str, _body: &str) {
            self.fired.lock().unwrap().push(title.to_string());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_at_the_next_local_time() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 10, 19, 0, 0).unwrap()));
        let sink = Arc::new(RecordingSink::default());
        let scheduler = ReminderScheduler::new(clock.clone(), Arc::new(Utc), sink.clone());
        scheduler.schedule_daily(NaiveTime::from_hms_opt(20, 0, 0).unwrap(), "Journal", "Time to write");

        tokio::time::sleep(std::time::Duration::from_secs(59 * 60)).await;
        assert!(sink.fired.lock().unwrap().is_empty());

        clock.advance(Duration::hours(1));
        tokio::time::sleep(std::time::Duration::from_secs(61)).await;
        assert_eq!(*sink.fired.lock().unwrap(), vec!["Journal".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_stops_every_timer() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 10, 19, 0, 0).unwrap()));
        let sink = Arc::new(RecordingSink::default());
        let scheduler = ReminderScheduler::new(clock, Arc::new(Utc), sink.clone());
        scheduler.schedule_daily(NaiveTime::from_hms_opt(20, 0, 0).unwrap(), "a", "");
        scheduler.schedule_daily(NaiveTime::from_hms_opt(21, 0, 0).unwrap(), "b", "");
        tokio::task::yield_now().await;
        assert_eq!(scheduler.active(), 2);

        scheduler.cancel_all();
        tokio::time::sleep(std::time::Duration::from_secs(3 * 3600)).await;
        assert!(sink.fired.lock().unwrap().is_empty());
        assert_eq!(scheduler.active(), 0);
    }
}
