use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::port::{PersistenceError, PersistencePort, RowQuery, StoredBlob, WriteOutcome};
use super::scoped_query::ScopedSelect;
use crate::access::ScopePredicate;
use crate::types::EntityKind;

/// Postgres-backed port. The encrypted column lives on `users`; tenant rows
/// live in `bots` and `reports`, each carrying `company` and `store`.
#[derive(Clone)]
pub struct PgPersistence {
    pool: PgPool,
}

impl PgPersistence {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersistencePort for PgPersistence {
    async fn get_encrypted_config(&self, user_id: Uuid) -> Result<StoredBlob, PersistenceError> {
        let row = sqlx::query("SELECT filter_configs, filter_configs_version FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(PersistenceError::UserNotFound(user_id))?;

        Ok(StoredBlob {
            blob: row.try_get("filter_configs")?,
            version: row.try_get("filter_configs_version")?,
        })
    }

    async fn set_encrypted_config(
        &self,
        user_id: Uuid,
        blob: &str,
        expected_version: i64,
    ) -> Result<WriteOutcome, PersistenceError> {
        let query = r#"
            UPDATE users
            SET filter_configs = $2,
                filter_configs_version = filter_configs_version + 1
            WHERE id = $1
            AND filter_configs_version = $3
            RETURNING filter_configs_version
        "#;

        let updated = sqlx::query(query)
            .bind(user_id)
            .bind(blob)
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = updated {
            return Ok(WriteOutcome::Committed {
                version: row.try_get("filter_configs_version")?,
            });
        }

        // No row matched: either the version moved or the user is gone
        let exists = sqlx::query("SELECT 1 FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();

        if exists {
            Ok(WriteOutcome::Conflict)
        } else {
            Err(PersistenceError::UserNotFound(user_id))
        }
    }

    async fn query_scoped(
        &self,
        entity: EntityKind,
        scope: &ScopePredicate,
        query: &RowQuery,
    ) -> Result<Vec<Value>, PersistenceError> {
        let sql = ScopedSelect::new(entity, scope).narrow(query).to_sql();

        let mut q = sqlx::query(&sql.query);
        for param in &sql.params {
            q = q.bind(param);
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<Value, _>("row").map_err(PersistenceError::from))
            .collect()
    }

    async fn health_check(&self) -> Result<(), PersistenceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
