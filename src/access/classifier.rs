use serde::Serialize;

use super::identity::{AccessLevel, Identity};

/// What slice of tenant data a caller may see. Recomputed per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessClass {
    /// Every store of the caller's own company
    SuperAdmin,
    /// Exactly one store of the caller's company
    StoreUser,
    NoAccess,
}

/// Classify a caller. Pure and total; a missing identity is `NoAccess`.
pub fn classify(identity: Option<&Identity>) -> AccessClass {
    let Some(identity) = identity else {
        return AccessClass::NoAccess;
    };

    match identity.access {
        AccessLevel::SuperAdmin => AccessClass::SuperAdmin,
        AccessLevel::Standard => match identity.store.as_deref() {
            Some(store) if !store.trim().is_empty() => AccessClass::StoreUser,
            _ => AccessClass::NoAccess,
        },
    }
}
