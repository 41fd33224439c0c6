//! # Errors
//!
//! Two layers: `StoreError` is what adapters report (raw detail included),
//! `SaveError` is what callers and users see (raw detail never included).

use thiserror::Error;

/// Coarse classification shared by both layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    AuthRequired,
    PermissionDenied,
    NotFound,
    Network,
    Connection,
    RateLimited,
    Unknown,
}

/// User-facing failure of a save attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaveError {
    /// Terminal, user-correctable (shown inline)
    #[error("{0}")]
    Validation(String),

    /// Terminal, the caller must re-authenticate
    #[error("Your session has expired. Please sign in again.")]
    AuthRequired,

    #[error("You don't have permission to perform this action.")]
    PermissionDenied,

    #[error("The entry you're looking for doesn't exist.")]
    NotFound,

    /// Retryable; `draft_saved` tells whether the entry was staged locally
    #[error("{}", network_message(.draft_saved))]
    Network { draft_saved: bool },

    /// Retryable; same staging semantics as `Network`
    #[error("{}", connection_message(.draft_saved))]
    Connection { draft_saved: bool },

    #[error("Too many requests. Please wait a moment and try again.")]
    RateLimited,

    #[error("Couldn't save your journal entry. Please try again.")]
    Unknown,
}

fn network_message(draft_saved: &bool) -> &'static str {
    if *draft_saved {
        "Connection lost. Your journal has been saved as a draft and will sync when you reconnect."
    } else {
        "Could not save offline. Please retry while online."
    }
}

fn connection_message(draft_saved: &bool) -> &'static str {
    if *draft_saved {
        "Couldn't reach the server. Your journal has been saved as a draft and will sync when you reconnect."
    } else {
        "Couldn't reach the server and could not save offline. Please retry while online."
    }
}

impl SaveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SaveError::Validation(_) => ErrorKind::Validation,
            SaveError::AuthRequired => ErrorKind::AuthRequired,
            SaveError::PermissionDenied => ErrorKind::PermissionDenied,
            SaveError::NotFound => ErrorKind::NotFound,
            SaveError::Network { .. } => ErrorKind::Network,
            SaveError::Connection { .. } => ErrorKind::Connection,
            SaveError::RateLimited => ErrorKind::RateLimited,
            SaveError::Unknown => ErrorKind::Unknown,
        }
    }

    /// Network-related failures are the ones that stage a draft.
    pub fn is_network(&self) -> bool {
        matches!(self, SaveError::Network { .. } | SaveError::Connection { .. })
    }

    /// Whether the user should be offered a manual retry.
    pub fn can_retry(&self) -> bool {
        self.automatic_retries() > 0
    }

    /// Upper bound of automatic retries for this kind of failure.
    pub fn automatic_retries(&self) -> u32 {
        match self {
            SaveError::Network { .. } | SaveError::Connection { .. } | SaveError::RateLimited => 2,
            SaveError::Unknown => 1,
            _ => 0,
        }
    }

    /// Same failure, annotated with whether a draft now holds the entry.
    pub fn with_draft(self, draft_saved: bool) -> Self {
        match self {
            SaveError::Network { .. } => SaveError::Network { draft_saved },
            SaveError::Connection { .. } => SaveError::Connection { draft_saved },
            other => other,
        }
    }

    pub fn draft_saved(&self) -> bool {
        matches!(
            self,
            SaveError::Network { draft_saved: true } | SaveError::Connection { draft_saved: true }
        )
    }
}

/// Failures reported by storage and session adapters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("no authenticated session")]
    Unauthenticated,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Backing table or bucket does not exist yet
    #[error("storage not provisioned: {0}")]
    NotProvisioned(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("connection failure: {0}")]
    Connection(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Unique violation or equivalent
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rejected by a storage-level constraint
    #[error("invalid data: {0}")]
    Invalid(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for SaveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unauthenticated => SaveError::AuthRequired,
            StoreError::PermissionDenied(_) => SaveError::PermissionDenied,
            StoreError::NotFound(_) => SaveError::NotFound,
            StoreError::Network(_) => SaveError::Network { draft_saved: false },
            StoreError::Connection(_) => SaveError::Connection { draft_saved: false },
            StoreError::RateLimited(_) => SaveError::RateLimited,
            StoreError::Conflict(_) => SaveError::Validation("This entry already exists.".into()),
            StoreError::Invalid(_) => {
                SaveError::Validation("Please check your input and try again.".into())
            }
            StoreError::NotProvisioned(_) | StoreError::Backend(_) => SaveError::Unknown,
        }
    }
}

/// Failures of device-local key-value storage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KvError {
    #[error("local storage is full")]
    QuotaExceeded,

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("local storage I/O: {0}")]
    Io(String),
}

/// Every rule an entry violated, in check order.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn first(&self) -> &str {
        self.0
            .first()
            .map(String::as_str)
            .unwrap_or("Please check your input and try again")
    }
}

impl From<ValidationErrors> for SaveError {
    fn from(errs: ValidationErrors) -> Self {
        SaveError::Validation(errs.first().to_string())
    }
}

/// A specialized Result type for save logic.
pub type Result<T> = std::result::Result<T, SaveError>;
