use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::codec;
use super::error::{ConfigStoreError, LoadWarning};
use super::locks::UserLocks;
use super::model::{
    sanitize_name, ConfigurationBundle, FilterConfiguration, FIELD_MAX_LEN, MAX_SELECTED_FIELDS,
    NAME_MAX_LEN, NAME_MIN_LEN, RESPONSE_FILTER_MAX_LEN,
};
use crate::access::Identity;
use crate::crypto::{ConfigCipher, UserKey};
use crate::database::port::{bounded, PersistencePort, WriteOutcome};
use crate::types::ReportType;

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Deadline for each persistence call
    pub persistence_timeout: Duration,
    /// Conditional-write attempts before giving up on a contended row
    pub max_write_attempts: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            persistence_timeout: Duration::from_secs(5),
            max_write_attempts: 3,
        }
    }
}

/// Caller input for a new configuration, before sanitizing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConfiguration {
    pub name: String,
    pub selected_fields: Vec<String>,
    #[serde(default)]
    pub response_filter: Option<String>,
    #[serde(rename = "type")]
    pub report_type: ReportType,
}

impl NewConfiguration {
    fn sanitize(self) -> Result<NewConfiguration, ConfigStoreError> {
        let name = sanitize_name(&self.name);
        let name_len = name.chars().count();
        if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&name_len) {
            return Err(ConfigStoreError::Validation(format!(
                "Name must be between {} and {} characters",
                NAME_MIN_LEN, NAME_MAX_LEN
            )));
        }

        let selected_fields: Vec<String> = self
            .selected_fields
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
        if selected_fields.is_empty() {
            return Err(ConfigStoreError::Validation("Select at least one field".to_string()));
        }
        if selected_fields.len() > MAX_SELECTED_FIELDS {
            return Err(ConfigStoreError::Validation(format!(
                "At most {} fields can be selected",
                MAX_SELECTED_FIELDS
            )));
        }
        if selected_fields.iter().any(|f| f.chars().count() > FIELD_MAX_LEN) {
            return Err(ConfigStoreError::Validation(format!(
                "Field names are limited to {} characters",
                FIELD_MAX_LEN
            )));
        }

        let response_filter = self
            .response_filter
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        if response_filter
            .as_ref()
            .is_some_and(|f| f.chars().count() > RESPONSE_FILTER_MAX_LEN)
        {
            return Err(ConfigStoreError::Validation(format!(
                "Response filter is limited to {} characters",
                RESPONSE_FILTER_MAX_LEN
            )));
        }

        Ok(NewConfiguration {
            name,
            selected_fields,
            response_filter,
            report_type: self.report_type,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigListing {
    pub configurations: Vec<FilterConfiguration>,
    pub warnings: Vec<LoadWarning>,
}

struct LoadedBundle {
    bundle: ConfigurationBundle,
    version: i64,
    warnings: Vec<LoadWarning>,
}

/// What a mutation did to the in-memory bundle
enum Mutation<T> {
    Changed(T),
    Unchanged(T),
}

/// Saved-filter presets for each user, sealed in a single encrypted column.
///
/// Writes for one user are serialized by a per-user lock, and every write is
/// conditional on the version that was read, so a writer in another process
/// is detected and retried rather than overwritten.
pub struct ConfigStore {
    persistence: Arc<dyn PersistencePort>,
    cipher: ConfigCipher,
    locks: UserLocks,
    options: StoreOptions,
}

impl ConfigStore {
    pub fn new(persistence: Arc<dyn PersistencePort>, cipher: ConfigCipher, options: StoreOptions) -> Self {
        Self {
            persistence,
            cipher,
            locks: UserLocks::new(),
            options,
        }
    }

    pub async fn list(
        &self,
        identity: &Identity,
        report_type: Option<ReportType>,
    ) -> Result<ConfigListing, ConfigStoreError> {
        let key = self.key_for(identity)?;
        let loaded = self.load(&key).await?;

        let configurations = match report_type {
            Some(t) => loaded.bundle.of_type(t).cloned().collect(),
            None => loaded.bundle.configurations,
        };

        Ok(ConfigListing {
            configurations,
            warnings: loaded.warnings,
        })
    }

    pub async fn save(
        &self,
        identity: &Identity,
        input: NewConfiguration,
    ) -> Result<FilterConfiguration, ConfigStoreError> {
        let input = input.sanitize()?;

        self.mutate(identity, |bundle| {
            if bundle.find_by_name(&input.name).is_some() {
                return Err(ConfigStoreError::DuplicateName(input.name.clone()));
            }
            if bundle.is_full() {
                return Err(ConfigStoreError::LimitExceeded);
            }

            let now = Utc::now();
            let config = FilterConfiguration {
                id: Uuid::new_v4(),
                name: input.name.clone(),
                selected_fields: input.selected_fields.clone(),
                response_filter: input.response_filter.clone(),
                report_type: input.report_type,
                created_at: now,
                updated_at: now,
            };
            bundle.configurations.push(config.clone());
            Ok(Mutation::Changed(config))
        })
        .await
    }

    /// Idempotent: removing an unknown id succeeds without writing
    pub async fn delete(&self, identity: &Identity, id: Uuid) -> Result<(), ConfigStoreError> {
        self.mutate(identity, |bundle| {
            Ok(if bundle.remove(id) {
                Mutation::Changed(())
            } else {
                Mutation::Unchanged(())
            })
        })
        .await
    }

    fn key_for(&self, identity: &Identity) -> Result<UserKey, ConfigStoreError> {
        self.cipher.derive_key(identity.user_id).map_err(|e| {
            error!("Key derivation failed for user {}: {}", identity.user_id, e);
            ConfigStoreError::EncryptFailed("key derivation failed".to_string())
        })
    }

    /// Read and open the user's bundle. Unreadable content degrades to an
    /// empty bundle plus a warning; only persistence errors fail.
    async fn load(&self, key: &UserKey) -> Result<LoadedBundle, ConfigStoreError> {
        let user_id = key.user_id();
        let stored = bounded(
            self.options.persistence_timeout,
            self.persistence.get_encrypted_config(user_id),
        )
        .await?;

        let mut warnings = Vec::new();
        let plaintext = match self.cipher.decrypt(key, stored.blob.as_deref()) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!("Stored configurations for user {} could not be decrypted: {}", user_id, e);
                warnings.push(LoadWarning::DecryptFailed);
                None
            }
        };

        let bundle = match plaintext {
            None => ConfigurationBundle::default(),
            Some(plaintext) => {
                let outcome = codec::parse(&plaintext);
                if let Some(e) = outcome.error {
                    warn!("Stored configurations for user {} are malformed: {}", user_id, e);
                    warnings.push(LoadWarning::InvalidPayload);
                }
                if outcome.dropped > 0 {
                    warn!("Dropped {} invalid configuration(s) for user {}", outcome.dropped, user_id);
                    warnings.push(LoadWarning::EntriesDropped { count: outcome.dropped });
                }
                outcome.bundle
            }
        };

        Ok(LoadedBundle {
            bundle,
            version: stored.version,
            warnings,
        })
    }

    /// Read-modify-write under the user's lock, retrying on version conflicts.
    async fn mutate<T, F>(&self, identity: &Identity, mut apply: F) -> Result<T, ConfigStoreError>
    where
        F: FnMut(&mut ConfigurationBundle) -> Result<Mutation<T>, ConfigStoreError>,
    {
        let user_id = identity.user_id;
        // Holders only make bounded persistence calls, so the wait is bounded too.
        let _guard = self.locks.acquire(user_id).await;
        let key = self.key_for(identity)?;

        for attempt in 1..=self.options.max_write_attempts {
            let LoadedBundle {
                mut bundle,
                version,
                warnings,
            } = self.load(&key).await?;

            let value = match apply(&mut bundle)? {
                Mutation::Unchanged(value) => return Ok(value),
                Mutation::Changed(value) => value,
            };

            if !warnings.is_empty() {
                warn!("Rewriting configurations for user {} over unreadable content: {:?}", user_id, warnings);
            }

            let plaintext = codec::serialize(&bundle).map_err(|e| {
                error!("Failed to serialize configurations for user {}: {}", user_id, e);
                ConfigStoreError::EncryptFailed("serialization failed".to_string())
            })?;
            let blob = self.cipher.encrypt(&key, &plaintext).map_err(|e| {
                error!("Failed to encrypt configurations for user {}: {}", user_id, e);
                ConfigStoreError::EncryptFailed("encryption failed".to_string())
            })?;

            let outcome = bounded(
                self.options.persistence_timeout,
                self.persistence.set_encrypted_config(user_id, &blob, version),
            )
            .await?;

            match outcome {
                WriteOutcome::Committed { version } => {
                    debug!("Committed configurations for user {} at version {}", user_id, version);
                    return Ok(value);
                }
                WriteOutcome::Conflict => {
                    warn!(
                        "Configuration write conflict for user {} (attempt {}/{})",
                        user_id, attempt, self.options.max_write_attempts
                    );
                }
            }
        }

        Err(ConfigStoreError::PersistenceFailed(
            "configurations changed concurrently; retry".to_string(),
        ))
    }
}
