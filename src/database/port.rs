use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::access::ScopePredicate;
use crate::types::{EntityKind, ReportType};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Persistence call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Encrypted column as read, with the version a conditional write must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredBlob {
    pub blob: Option<String>,
    pub version: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Committed { version: i64 },
    /// The row changed since it was read; nothing was written
    Conflict,
}

/// Extra narrowing applied inside a scope. Never widens it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowQuery {
    pub report_type: Option<ReportType>,
    pub limit: i64,
}

impl Default for RowQuery {
    fn default() -> Self {
        Self {
            report_type: None,
            limit: 500,
        }
    }
}

/// Storage the subsystem consumes: one encrypted column per user row, and
/// tenant rows that can only be fetched through a scope.
///
/// Implementations must turn a deny scope into a query that cannot return
/// rows, not into an unfiltered one.
#[async_trait]
pub trait PersistencePort: Send + Sync {
    async fn get_encrypted_config(&self, user_id: Uuid) -> Result<StoredBlob, PersistenceError>;

    /// Single atomic column update, applied only if the stored version still
    /// equals `expected_version`.
    async fn set_encrypted_config(
        &self,
        user_id: Uuid,
        blob: &str,
        expected_version: i64,
    ) -> Result<WriteOutcome, PersistenceError>;

    async fn query_scoped(
        &self,
        entity: EntityKind,
        scope: &ScopePredicate,
        query: &RowQuery,
    ) -> Result<Vec<Value>, PersistenceError>;

    async fn health_check(&self) -> Result<(), PersistenceError>;
}

/// Run a port call under a deadline
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, PersistenceError>
where
    F: Future<Output = Result<T, PersistenceError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(PersistenceError::Timeout(limit)),
    }
}
