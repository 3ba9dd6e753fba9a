//! ktnh-common - Shared naming, metadata and template types
//!
//! This crate holds everything about ktnh stacks that does not need to talk
//! to AWS, so it can be tested without the SDK.
//!
//! ## Modules
//!
//! - [`db_kind`]: Aurora cluster vs. RDS instance
//! - [`defaults`]: Default configuration values and fixed constants
//! - [`metadata`]: `Metadata.KTNH` parsing and verification
//! - [`naming`]: Stack names, name patterns and qualifiers
//! - [`template`]: CloudFormation template generation

pub mod db_kind;
pub mod defaults;
pub mod metadata;
pub mod naming;
pub mod template;

// Re-export commonly used types
pub use db_kind::{DatabaseKind, UnknownDatabaseKind};
pub use metadata::{ManagedMetadata, MetadataError, VerifyOption};
pub use naming::{Qualifier, StackNameOption};
