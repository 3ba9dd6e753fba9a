//! Database kind (Aurora cluster or standalone RDS instance)

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of database a stack keeps stopped.
///
/// The string form is what gets written to `Metadata.KTNH.DBType`, so it must
/// stay stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    /// Aurora DB cluster
    Cluster,
    /// Standalone RDS DB instance
    Instance,
}

impl DatabaseKind {
    /// Value stored in template metadata (`aurora` / `rds`)
    pub fn as_str(self) -> &'static str {
        match self {
            DatabaseKind::Cluster => "aurora",
            DatabaseKind::Instance => "rds",
        }
    }

    /// Resource type segment used in RDS ARNs and maintenance keys
    pub fn arn_resource_type(self) -> &'static str {
        match self {
            DatabaseKind::Cluster => "cluster",
            DatabaseKind::Instance => "db",
        }
    }

    /// Maintenance status key for an identifier of this kind, e.g. `cluster:my-db`
    pub fn maintenance_key(self, identifier: &str) -> String {
        format!("{}:{}", self.arn_resource_type(), identifier)
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized `DBType` value
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown DB type '{0}' (expected 'aurora' or 'rds')")]
pub struct UnknownDatabaseKind(pub String);

impl FromStr for DatabaseKind {
    type Err = UnknownDatabaseKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aurora" => Ok(DatabaseKind::Cluster),
            "rds" => Ok(DatabaseKind::Instance),
            other => Err(UnknownDatabaseKind(other.to_string())),
        }
    }
}
