//! Connectivity Monitor.
//!
//! Holds the current online flag (fed by the device's online/offline events)
//! and a sticky `was_offline` flag that stays set from the first transition to
//! offline until a consumer clears it.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::info;

pub struct ConnectivityMonitor {
    online: watch::Sender<bool>,
    was_offline: AtomicBool,
}

impl ConnectivityMonitor {
    pub fn new(online: bool) -> Self {
        Self::with_state(online, false)
    }

    /// Restores a monitor whose session already saw an offline period.
    pub fn with_state(online: bool, was_offline: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self {
            online: tx,
            was_offline: AtomicBool::new(was_offline || !online),
        }
    }

    /// Sink for native online/offline events.
    pub fn report(&self, online: bool) {
        let previous = self.online.send_replace(online);
        if previous == online {
            return;
        }
        if online {
            info!("connectivity restored");
        } else {
            self.was_offline.store(true, Ordering::SeqCst);
            info!("connectivity lost");
        }
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    pub fn was_offline(&self) -> bool {
        self.was_offline.load(Ordering::SeqCst)
    }

    pub fn clear_was_offline(&self) {
        self.was_offline.store(false, Ordering::SeqCst);
    }

    /// Online now after having been offline earlier in the session.
    pub fn just_reconnected(&self) -> bool {
        self.is_online() && self.was_offline()
    }

    /// Resolves immediately when online, otherwise on the next online transition.
    pub async fn wait_for_online(&self) {
        let mut rx = self.online.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|online| *online).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn was_offline_is_sticky_until_cleared() {
        let monitor = ConnectivityMonitor::new(true);
        assert!(!monitor.was_offline());

        monitor.report(false);
        monitor.report(true);
        assert!(monitor.is_online());
        assert!(monitor.was_offline());
        assert!(monitor.just_reconnected());

        monitor.clear_was_offline();
        assert!(!monitor.just_reconnected());
    }

    #[test]
    fn repeated_online_events_do_not_set_the_flag() {
        let monitor = ConnectivityMonitor::new(true);
        monitor.report(true);
        assert!(!monitor.was_offline());
    }

    #[tokio::test]
    async fn wait_for_online_returns_after_transition() {
        let monitor = Arc::new(ConnectivityMonitor::new(false));
        let waiter = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.wait_for_online().await })
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!waiter.is_finished());

        monitor.report(true);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should resolve")
            .unwrap();
    }
}
