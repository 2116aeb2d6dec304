/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Report families a saved filter (and a report row) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Birthday,
    Cashback,
    Survey,
    Promotions,
}

impl ReportType {
    pub const ALL: [ReportType; 4] = [
        ReportType::Birthday,
        ReportType::Cashback,
        ReportType::Survey,
        ReportType::Promotions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Birthday => "birthday",
            ReportType::Cashback => "cashback",
            ReportType::Survey => "survey",
            ReportType::Promotions => "promotions",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown report type '{}'", s))
    }
}

/// Tenant-owned row collections that are only ever read through a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Bots,
    Reports,
}

impl EntityKind {
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Bots => "bots",
            EntityKind::Reports => "reports",
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bots" => Ok(EntityKind::Bots),
            "reports" => Ok(EntityKind::Reports),
            other => Err(format!("unknown entity '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_type_parses_only_known_lowercase_values() {
        assert_eq!("cashback".parse::<ReportType>(), Ok(ReportType::Cashback));
        assert!("Cashback".parse::<ReportType>().is_err());
        assert!("unknown".parse::<ReportType>().is_err());
    }

    #[test]
    fn entity_kind_maps_to_fixed_tables() {
        assert_eq!("bots".parse::<EntityKind>().map(|e| e.table_name()), Ok("bots"));
        assert!("users".parse::<EntityKind>().is_err());
    }
}
