use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::model::{name_key, ConfigurationBundle, FilterConfiguration};
use crate::types::ReportType;

/// Report type assumed for entries written before types existed
pub const LEGACY_REPORT_TYPE: ReportType = ReportType::Birthday;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Payload does not match the bundle envelope")]
    InvalidEnvelope,

    #[error("Failed to serialize bundle: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result of reading a decrypted payload. Never fails outright.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub bundle: ConfigurationBundle,
    /// Entries discarded as invalid or duplicate
    pub dropped: usize,
    pub error: Option<CodecError>,
}

/// Stored entry before validation; every field optional so one bad entry
/// cannot fail the whole bundle.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredConfiguration {
    id: Option<Uuid>,
    name: Option<String>,
    #[serde(default)]
    selected_fields: Vec<String>,
    response_filter: Option<String>,
    #[serde(rename = "type")]
    report_type: Option<ReportType>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl StoredConfiguration {
    fn validate(self) -> Option<FilterConfiguration> {
        let name = self.name.filter(|n| !n.trim().is_empty())?;
        if self.selected_fields.is_empty() {
            return None;
        }
        let created_at = self.created_at?;

        Some(FilterConfiguration {
            id: self.id?,
            name,
            selected_fields: self.selected_fields,
            response_filter: self.response_filter.filter(|f| !f.is_empty()),
            report_type: self.report_type?,
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        })
    }
}

/// Decode a decrypted payload into a bundle, migrating legacy entries and
/// dropping the ones that fail validation.
pub fn parse(plaintext: &str) -> ParseOutcome {
    let value: Value = match serde_json::from_str(plaintext) {
        Ok(value) => value,
        Err(e) => {
            return ParseOutcome {
                error: Some(CodecError::InvalidJson(e.to_string())),
                ..Default::default()
            }
        }
    };

    let Some(entries) = value.get("configurations").and_then(Value::as_array) else {
        return ParseOutcome {
            error: Some(CodecError::InvalidEnvelope),
            ..Default::default()
        };
    };

    let mut bundle = ConfigurationBundle::default();
    let mut seen_names = HashSet::new();
    let mut seen_ids = HashSet::new();
    let mut dropped = 0;

    for entry in entries {
        let Some(mut object) = entry.as_object().cloned() else {
            dropped += 1;
            continue;
        };
        migrate(&mut object);

        let config = serde_json::from_value::<StoredConfiguration>(Value::Object(object))
            .ok()
            .and_then(StoredConfiguration::validate);

        match config {
            Some(config) if seen_ids.insert(config.id) && seen_names.insert(name_key(&config.name)) => {
                bundle.configurations.push(config);
            }
            _ => dropped += 1,
        }
    }

    ParseOutcome {
        bundle,
        dropped,
        error: None,
    }
}

pub fn serialize(bundle: &ConfigurationBundle) -> Result<String, CodecError> {
    Ok(serde_json::to_string(bundle)?)
}

fn migrate(entry: &mut Map<String, Value>) {
    if entry.get("type").map_or(true, Value::is_null) {
        entry.insert("type".to_string(), Value::String(LEGACY_REPORT_TYPE.as_str().to_string()));
    }
}
