//! AWS client modules
//!
//! This module provides wrappers around AWS SDK clients for:
//! - CloudFormation: stack listing, creation, deletion and status
//! - RDS: engine probes, cluster membership and pending maintenance

pub mod cloudformation;
pub mod context;
pub mod error;
pub mod rds;

// Core clients
pub use cloudformation::{CloudFormationClient, StackOperations, StackPage};
pub use context::{AwsContext, FromAwsContext};
pub use rds::{ClusterMembersPage, MaintenancePage, RdsClient, RdsOperations};

// Error handling
pub use error::{AwsError, classify_aws_error, classify_sdk_error, find_aws_error};
