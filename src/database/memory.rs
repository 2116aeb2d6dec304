use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::port::{PersistenceError, PersistencePort, RowQuery, StoredBlob, WriteOutcome};
use crate::access::ScopePredicate;
use crate::types::EntityKind;

/// In-process backend with the same conditional-write and scoping rules as
/// the Postgres one. Used for local development and tests.
#[derive(Default)]
pub struct MemoryPersistence {
    users: RwLock<HashMap<Uuid, StoredBlob>>,
    rows: RwLock<HashMap<EntityKind, Vec<Value>>>,
    auto_provision: bool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown users get an empty row on first access instead of `UserNotFound`
    pub fn with_auto_provision() -> Self {
        Self {
            auto_provision: true,
            ..Self::default()
        }
    }

    pub async fn add_user(&self, user_id: Uuid) {
        self.users.write().await.entry(user_id).or_default();
    }

    pub async fn insert_row(&self, entity: EntityKind, row: Value) {
        self.rows.write().await.entry(entity).or_default().push(row);
    }

    pub async fn stored(&self, user_id: Uuid) -> Option<StoredBlob> {
        self.users.read().await.get(&user_id).cloned()
    }

    /// Replace the column out of band, bumping the version like any write
    pub async fn overwrite(&self, user_id: Uuid, blob: Option<String>) {
        let mut users = self.users.write().await;
        let stored = users.entry(user_id).or_default();
        stored.blob = blob;
        stored.version += 1;
    }
}

#[async_trait]
impl PersistencePort for MemoryPersistence {
    async fn get_encrypted_config(&self, user_id: Uuid) -> Result<StoredBlob, PersistenceError> {
        if let Some(stored) = self.users.read().await.get(&user_id) {
            return Ok(stored.clone());
        }
        if self.auto_provision {
            return Ok(self.users.write().await.entry(user_id).or_default().clone());
        }
        Err(PersistenceError::UserNotFound(user_id))
    }

    async fn set_encrypted_config(
        &self,
        user_id: Uuid,
        blob: &str,
        expected_version: i64,
    ) -> Result<WriteOutcome, PersistenceError> {
        let mut users = self.users.write().await;
        let stored = users
            .get_mut(&user_id)
            .ok_or(PersistenceError::UserNotFound(user_id))?;

        if stored.version != expected_version {
            return Ok(WriteOutcome::Conflict);
        }
        stored.blob = Some(blob.to_string());
        stored.version += 1;
        Ok(WriteOutcome::Committed { version: stored.version })
    }

    async fn query_scoped(
        &self,
        entity: EntityKind,
        scope: &ScopePredicate,
        query: &RowQuery,
    ) -> Result<Vec<Value>, PersistenceError> {
        if scope.is_deny() {
            return Ok(vec![]);
        }

        let rows = self.rows.read().await;
        let mut visible: Vec<Value> = rows
            .get(&entity)
            .map(|rows| {
                rows.iter()
                    .filter(|row| scope.matches(row))
                    .filter(|row| match query.report_type {
                        Some(t) => row.get("type").and_then(Value::as_str) == Some(t.as_str()),
                        None => true,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // Newest first, like the SQL backend; RFC 3339 strings sort chronologically
        visible.sort_by(|a, b| {
            let created = |row: &Value| row.get("created_at").and_then(Value::as_str).map(str::to_string);
            created(b).cmp(&created(a))
        });
        visible.truncate(usize::try_from(query.limit).unwrap_or(0));
        Ok(visible)
    }

    async fn health_check(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}
