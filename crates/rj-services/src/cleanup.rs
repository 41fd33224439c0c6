//! Best-effort text cleanup with the local normalizer as fallback.

use crate::connectivity::ConnectivityMonitor;
use rj_core::grammar;
use rj_core::TextCleanup;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct TextCleaner {
    remote: Option<Arc<dyn TextCleanup>>,
    connectivity: Arc<ConnectivityMonitor>,
}

impl TextCleaner {
    pub fn new(remote: Option<Arc<dyn TextCleanup>>, connectivity: Arc<ConnectivityMonitor>) -> Self {
        Self {
            remote,
            connectivity,
        }
    }

    pub fn local_only(connectivity: Arc<ConnectivityMonitor>) -> Self {
        Self::new(None, connectivity)
    }

    /// Never fails. Blank text comes back unchanged.
    pub async fn clean(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let remote = match &self.remote {
            Some(remote) if self.connectivity.is_online() => remote,
            _ => return grammar::normalize(text),
        };

        match remote.cleanup(text).await {
            Ok(cleaned) if !cleaned.trim().is_empty() => {
                debug!("remote cleanup applied");
                cleaned
            }
            Ok(_) => {
                warn!("remote cleanup returned empty text, using local normalizer");
                grammar::normalize(text)
            }
            Err(e) => {
                warn!(error = %e, "remote cleanup failed, using local normalizer");
                grammar::normalize(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rj_core::MockTextCleanup;

    #[tokio::test]
    async fn remote_result_is_used_when_online() {
        let mut remote = MockTextCleanup::new();
        remote
            .expect_cleanup()
            .returning(|_| Ok("I had a great day.".to_string()));
        let cleaner = TextCleaner::new(Some(Arc::new(remote)), Arc::new(ConnectivityMonitor::new(true)));
        assert_eq!(cleaner.clean("i had a grate day").await, "I had a great day.");
    }

    #[tokio::test]
    async fn remote_error_falls_back() {
        let mut remote = MockTextCleanup::new();
        remote
            .expect_cleanup()
            .returning(|_| Err(anyhow::anyhow!("503 Service Unavailable")));
        let cleaner = TextCleaner::new(Some(Arc::new(remote)), Arc::new(ConnectivityMonitor::new(true)));
        assert_eq!(cleaner.clean("im tired").await, "I'm tired.");
    }

    #[tokio::test]
    async fn offline_never_calls_remote() {
        let mut remote = MockTextCleanup::new();
        remote.expect_cleanup().never();
        let cleaner = TextCleaner::new(Some(Arc::new(remote)), Arc::new(ConnectivityMonitor::new(false)));
        assert_eq!(cleaner.clean("gonna rest").await, "Going to rest.");
    }
}
