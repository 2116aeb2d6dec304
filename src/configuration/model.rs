use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ReportType;

pub const MAX_CONFIGURATIONS: usize = 10;
pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 50;
pub const MAX_SELECTED_FIELDS: usize = 100;
pub const FIELD_MAX_LEN: usize = 100;
pub const RESPONSE_FILTER_MAX_LEN: usize = 200;

/// A named saved-filter preset. Never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfiguration {
    pub id: Uuid,
    pub name: String,
    pub selected_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_filter: Option<String>,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Plaintext payload sealed as one blob per user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationBundle {
    pub configurations: Vec<FilterConfiguration>,
}

impl ConfigurationBundle {
    pub fn is_full(&self) -> bool {
        self.configurations.len() >= MAX_CONFIGURATIONS
    }

    /// Case-insensitive lookup on the sanitized name
    pub fn find_by_name(&self, name: &str) -> Option<&FilterConfiguration> {
        let key = name_key(name);
        self.configurations.iter().find(|c| name_key(&c.name) == key)
    }

    /// Remove by id; returns whether anything was removed
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.configurations.len();
        self.configurations.retain(|c| c.id != id);
        self.configurations.len() != before
    }

    pub fn of_type(&self, report_type: ReportType) -> impl Iterator<Item = &FilterConfiguration> {
        self.configurations.iter().filter(move |c| c.report_type == report_type)
    }
}

/// Strip control characters, collapse whitespace runs to one space, trim.
/// Whitespace controls (tab, newline) count as whitespace, not as noise.
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Comparison key used for name uniqueness
pub fn name_key(name: &str) -> String {
    sanitize_name(name).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str, report_type: ReportType) -> FilterConfiguration {
        let now = Utc::now();
        FilterConfiguration {
            id: Uuid::new_v4(),
            name: name.to_string(),
            selected_fields: vec!["phone".into()],
            response_filter: None,
            report_type,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_name("  Report \t  A \n"), "Report A");
        assert_eq!(sanitize_name("Rep\u{0007}ort\u{0000} B"), "Report B");
        assert_eq!(sanitize_name("Report\u{007f}\u{0085}A"), "Report A");
        assert_eq!(sanitize_name("\u{001b}"), "");
    }

    #[test]
    fn name_lookup_ignores_case_and_spacing() {
        let bundle = ConfigurationBundle {
            configurations: vec![config("Report A", ReportType::Birthday)],
        };
        assert!(bundle.find_by_name("report a ").is_some());
        assert!(bundle.find_by_name(" REPORT   A").is_some());
        assert!(bundle.find_by_name("Report B").is_none());
        assert!(bundle.find_by_name("Rep\u{0007}ort A").is_some());
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let kept = config("Kept", ReportType::Survey);
        let gone = config("Gone", ReportType::Survey);
        let gone_id = gone.id;
        let mut bundle = ConfigurationBundle {
            configurations: vec![kept.clone(), gone],
        };

        assert!(bundle.remove(gone_id));
        assert!(!bundle.remove(gone_id));
        assert_eq!(bundle.configurations, vec![kept]);
    }

    #[test]
    fn serializes_with_camel_case_and_type_key() {
        let value = serde_json::to_value(config("Weekly", ReportType::Cashback)).unwrap();
        assert_eq!(value["type"], "cashback");
        assert!(value.get("selectedFields").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("responseFilter").is_none());
    }
}
