use serde::Serialize;
use uuid::Uuid;

/// Normalized token a raw access level must reduce to for super-admin treatment
const SUPER_ADMIN_TOKEN: &str = "superadmin";

/// Access level decoded once from the raw session string.
///
/// Internal logic only ever matches on this enum; the raw string is not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    SuperAdmin,
    Standard,
}

impl AccessLevel {
    /// Decode a raw access string: lowercase, drop whitespace and underscores,
    /// then compare literally against the super-admin token. Anything else,
    /// including empty or hostile input, decodes to `Standard`.
    pub fn decode(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return AccessLevel::Standard;
        };

        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        if normalized == SUPER_ADMIN_TOKEN {
            AccessLevel::SuperAdmin
        } else {
            AccessLevel::Standard
        }
    }
}

/// Authenticated caller, built once per request from verified session claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub access: AccessLevel,
    pub company: String,
    pub store: Option<String>,
}

impl Identity {
    /// Build an identity from raw session values. Company and store are trimmed;
    /// a blank store becomes `None`.
    pub fn from_session(
        user_id: Uuid,
        access: Option<&str>,
        company: &str,
        store: Option<&str>,
    ) -> Self {
        let store = store
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            user_id,
            access: AccessLevel::decode(access),
            company: company.trim().to_string(),
            store,
        }
    }
}
