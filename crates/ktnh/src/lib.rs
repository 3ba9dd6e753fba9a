//! ktnh - keep Aurora clusters and RDS instances stopped
//!
//! RDS restarts a stopped database after seven days. Freezing a database
//! creates a CloudFormation stack whose automation stops it again whenever
//! that happens; defrosting deletes the stack.

pub mod aws;
pub mod classifier;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod maintenance;
pub mod output;
pub mod progress;
pub mod registry;
pub mod wait;
