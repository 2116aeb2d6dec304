use super::port::RowQuery;
use crate::access::ScopePredicate;
use crate::types::EntityKind;

/// Parameterized SQL ready for binding; every parameter is text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<String>,
}

/// Builds the one SELECT shape used for tenant rows. Table names come from
/// `EntityKind`, values only ever travel as bound parameters.
pub struct ScopedSelect {
    entity: EntityKind,
    conditions: Vec<String>,
    params: Vec<String>,
    limit: i64,
}

impl ScopedSelect {
    pub fn new(entity: EntityKind, scope: &ScopePredicate) -> Self {
        let mut select = Self {
            entity,
            conditions: vec![],
            params: vec![],
            limit: 0,
        };

        // A deny scope is a constant-false predicate, never an empty WHERE.
        match scope.company() {
            None => select.conditions.push("FALSE".to_string()),
            Some(company) => {
                select.eq("company", company);
                if let Some(store) = scope.store() {
                    select.eq("store", store);
                }
            }
        }
        select
    }

    pub fn narrow(mut self, query: &RowQuery) -> Self {
        if let Some(report_type) = query.report_type {
            self.eq("type", report_type.as_str());
        }
        self.limit = query.limit.max(0);
        self
    }

    pub fn to_sql(&self) -> SqlResult {
        let query = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"{}\" WHERE {} ORDER BY \"created_at\" DESC LIMIT {}) t",
            self.entity.table_name(),
            self.conditions.join(" AND "),
            self.limit
        );
        SqlResult {
            query,
            params: self.params.clone(),
        }
    }

    fn eq(&mut self, column: &str, value: &str) {
        let placeholder = self.param(value);
        self.conditions.push(format!("\"{}\" = {}", column, placeholder));
    }

    fn param(&mut self, value: &str) -> String {
        self.params.push(value.to_string());
        format!("${}", self.params.len())
    }
}
