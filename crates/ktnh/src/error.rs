//! Lifecycle errors surfaced to the CLI

use thiserror::Error;

/// Errors from stack lookup, freeze and defrost
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Freeze found a managed stack for the identifier
    #[error("stack '{stack_name}' for DB identifier '{db_identifier}' already exists")]
    AlreadyFrozen {
        stack_name: String,
        db_identifier: String,
    },

    /// Defrost found no managed stack for the identifier
    #[error("no stacks found for DB identifier '{db_identifier}'")]
    NotFrozen { db_identifier: String },

    /// More than one managed stack matches; never resolved automatically
    #[error("multiple stacks found for DB identifier '{db_identifier}': {}", stacks.join(", "))]
    AmbiguousStacks {
        db_identifier: String,
        stacks: Vec<String>,
    },

    /// Neither a DB cluster nor a DB instance has this identifier
    #[error("database '{db_identifier}' was not found as either Aurora cluster or RDS instance")]
    UnknownDatabase { db_identifier: String },

    /// RDS reported a database without an engine
    #[error("database '{db_identifier}' has no engine name")]
    EmptyEngine { db_identifier: String },
}
