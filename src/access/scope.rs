use serde::Serialize;
use serde_json::Value;

use super::classifier::{classify, AccessClass};
use super::identity::Identity;

/// Row filter every tenant-data query must carry.
///
/// There is no public constructor: the only way to obtain one is [`scope_for`],
/// so the company is always the caller's own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScopePredicate {
    kind: ScopeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
enum ScopeKind {
    /// All stores of one company
    Company { company: String },
    /// One store of one company
    Store { company: String, store: String },
    /// Matches nothing
    Deny,
}

impl ScopePredicate {
    fn deny() -> Self {
        Self { kind: ScopeKind::Deny }
    }

    pub fn company(&self) -> Option<&str> {
        match &self.kind {
            ScopeKind::Company { company } | ScopeKind::Store { company, .. } => Some(company),
            ScopeKind::Deny => None,
        }
    }

    /// `None` for company-wide scopes and for the deny sentinel.
    pub fn store(&self) -> Option<&str> {
        match &self.kind {
            ScopeKind::Store { store, .. } => Some(store),
            _ => None,
        }
    }

    pub fn is_deny(&self) -> bool {
        matches!(self.kind, ScopeKind::Deny)
    }

    /// Whether a JSON row with `company` / `store` string fields falls inside this scope.
    pub fn matches(&self, row: &Value) -> bool {
        let field = |name: &str| row.get(name).and_then(Value::as_str);
        match &self.kind {
            ScopeKind::Deny => false,
            ScopeKind::Company { company } => field("company") == Some(company.as_str()),
            ScopeKind::Store { company, store } => {
                field("company") == Some(company.as_str()) && field("store") == Some(store.as_str())
            }
        }
    }
}

/// Compute the scope for one request. Never cached; call once per request.
pub fn scope_for(identity: Option<&Identity>) -> ScopePredicate {
    let Some(identity) = identity else {
        return ScopePredicate::deny();
    };

    if identity.company.trim().is_empty() {
        tracing::warn!("Identity {} has no company; denying tenant data", identity.user_id);
        return ScopePredicate::deny();
    }

    let company = identity.company.clone();
    let kind = match classify(Some(identity)) {
        AccessClass::SuperAdmin => ScopeKind::Company { company },
        AccessClass::StoreUser => match identity.store.clone() {
            Some(store) => ScopeKind::Store { company, store },
            None => ScopeKind::Deny,
        },
        AccessClass::NoAccess => ScopeKind::Deny,
    };

    tracing::debug!("Resolved scope for user {}: {:?}", identity.user_id, kind);
    ScopePredicate { kind }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn identity(access: &str, company: &str, store: Option<&str>) -> Identity {
        Identity::from_session(Uuid::new_v4(), Some(access), company, store)
    }

    #[test]
    fn super_admin_sees_whole_company_only() {
        let scope = scope_for(Some(&identity("Super Admin", "Acme", Some("Loja1"))));
        assert_eq!(scope.company(), Some("Acme"));
        assert_eq!(scope.store(), None);
        assert!(scope.matches(&json!({"company": "Acme", "store": "Loja2"})));
        assert!(!scope.matches(&json!({"company": "Other", "store": "Loja1"})));
    }

    #[test]
    fn store_user_sees_one_store() {
        let scope = scope_for(Some(&identity("user", "Acme", Some("S1"))));
        assert_eq!(scope.company(), Some("Acme"));
        assert_eq!(scope.store(), Some("S1"));
        assert!(scope.matches(&json!({"company": "Acme", "store": "S1"})));
        assert!(!scope.matches(&json!({"company": "Acme", "store": "S2"})));
        assert!(!scope.matches(&json!({"company": "Other", "store": "S1"})));
    }

    #[test]
    fn no_access_is_deny_sentinel() {
        let scope = scope_for(Some(&identity("user", "Acme", Some(""))));
        assert!(scope.is_deny());
        assert_eq!(scope.company(), None);
        assert!(!scope.matches(&json!({"company": "Acme", "store": ""})));
        assert!(scope_for(None).is_deny());
    }

    #[test]
    fn empty_company_never_means_everything() {
        let scope = scope_for(Some(&identity("superadmin", "  ", None)));
        assert!(scope.is_deny());
        assert!(!scope.matches(&json!({"company": "", "store": null})));
        assert!(!scope.matches(&json!({})));
    }

    #[test]
    fn rows_missing_tenant_fields_never_match() {
        let scope = scope_for(Some(&identity("superadmin", "Acme", None)));
        assert!(!scope.matches(&json!({"store": "S1"})));
        assert!(!scope.matches(&json!({"company": 42})));
    }

    #[test]
    fn different_companies_get_disjoint_scopes() {
        let a = scope_for(Some(&identity("superadmin", "C1", None)));
        let b = scope_for(Some(&identity("superadmin", "C2", None)));
        assert_ne!(a.company(), b.company());

        let rows = [
            json!({"company": "C1", "store": "S1"}),
            json!({"company": "C2", "store": "S1"}),
            json!({"company": "C1", "store": "S2"}),
        ];
        for row in rows.iter().filter(|r| a.matches(r)) {
            assert!(!b.matches(row));
        }
    }
}
