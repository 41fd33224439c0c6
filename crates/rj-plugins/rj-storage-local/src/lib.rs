//! # rj-storage-local
//! rusty-journal/crates/rj-plugins/rj-storage-local/src/lib.rs
//! Device-local implementations of `KeyValueStore`.
//! Features: one JSON file per key, atomic replace via tmp file + rename, byte quota.

use async_trait::async_trait;
use dashmap::DashMap;
use rj_core::traits::KeyValueStore;
use rj_core::KvError;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};

/// ENOSPC on unix.
const OUT_OF_SPACE: i32 = 28;

fn check_key(key: &str) -> Result<(), KvError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(KvError::InvalidKey(key.to_string()))
    }
}

fn check_quota(quota: Option<usize>, value: &str) -> Result<(), KvError> {
    match quota {
        Some(limit) if value.len() > limit => Err(KvError::QuotaExceeded),
        _ => Ok(()),
    }
}

fn io_error(err: std::io::Error) -> KvError {
    if err.raw_os_error() == Some(OUT_OF_SPACE) {
        KvError::QuotaExceeded
    } else {
        KvError::Io(err.to_string())
    }
}

pub struct FileKeyValueStore {
    /// Directory holding one `<key>.json` per key (e.g., "./data/drafts")
    root_path: PathBuf,
    quota_bytes: Option<usize>,
}

impl FileKeyValueStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root_path: root,
            quota_bytes: None,
        }
    }

    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root_path.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        check_key(key)?;
        match fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(e)),
        }
    }

    /// Writes `<key>.json.tmp`, then renames it over the target so readers
    /// only ever see a complete value.
    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        check_key(key)?;
        check_quota(self.quota_bytes, value)?;

        fs::create_dir_all(&self.root_path).await.map_err(io_error)?;

        let target = self.path_for(key);
        let tmp = target.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp, value).await {
            let _ = fs::remove_file(&tmp).await;
            warn!(key, error = %e, "local write failed");
            return Err(io_error(e));
        }
        fs::rename(&tmp, &target).await.map_err(io_error)?;
        debug!(key, bytes = value.len(), "local value written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        check_key(key)?;
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }
}

/// Volatile store with the same key rules and quota semantics.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: DashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            values: DashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        check_key(key)?;
        Ok(self.values.get(key).map(|v| v.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        check_key(key)?;
        check_quota(self.quota_bytes, value)?;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        check_key(key)?;
        self.values.remove(key);
        Ok(())
    }
}
