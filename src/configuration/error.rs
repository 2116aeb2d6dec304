use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::model::MAX_CONFIGURATIONS;
use crate::database::port::PersistenceError;

/// Failures surfaced by the configuration store, each with a stable code
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("{0}")]
    Validation(String),

    #[error("A configuration named '{0}' already exists")]
    DuplicateName(String),

    #[error("Configuration limit of {} reached", MAX_CONFIGURATIONS)]
    LimitExceeded,

    #[error("Failed to encrypt configurations: {0}")]
    EncryptFailed(String),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),
}

impl ConfigStoreError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigStoreError::Validation(_) => "VALIDATION_ERROR",
            ConfigStoreError::DuplicateName(_) => "DUPLICATE_NAME",
            ConfigStoreError::LimitExceeded => "LIMIT_EXCEEDED",
            ConfigStoreError::EncryptFailed(_) => "ENCRYPT_FAILED",
            ConfigStoreError::UserNotFound(_) => "USER_NOT_FOUND",
            ConfigStoreError::PersistenceFailed(_) => "PERSISTENCE_FAILED",
        }
    }

    /// Persistence failures may succeed on retry; nothing else will
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConfigStoreError::PersistenceFailed(_))
    }
}

impl From<PersistenceError> for ConfigStoreError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::UserNotFound(id) => ConfigStoreError::UserNotFound(id),
            other => ConfigStoreError::PersistenceFailed(other.to_string()),
        }
    }
}

/// Non-blocking problems found while loading a user's bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadWarning {
    /// Stored blob could not be opened; treated as empty
    DecryptFailed,
    /// Blob opened but did not hold a bundle; treated as empty
    InvalidPayload,
    /// Some entries were invalid and skipped
    EntriesDropped { count: usize },
}

impl LoadWarning {
    pub fn message(&self) -> String {
        match self {
            LoadWarning::DecryptFailed | LoadWarning::InvalidPayload => {
                "Saved configurations could not be read and were ignored".to_string()
            }
            LoadWarning::EntriesDropped { count } => {
                format!("{} saved configuration(s) were invalid and ignored", count)
            }
        }
    }
}
