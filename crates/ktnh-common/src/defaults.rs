//! Default configuration values and fixed constants
//!
//! These constants are shared by the CLI, the lifecycle engine and the
//! template generator so that stack names and metadata stay consistent.

/// Generator name recorded in `Metadata.KTNH.Generator` of every template
pub const GENERATOR_NAME: &str = "koreru-toki-no-hiho";

/// Generator version recorded in `Metadata.KTNH.Version`
pub const GENERATOR_VERSION: &str = "1";

/// Default prefix for CloudFormation stack names
pub const DEFAULT_STACK_PREFIX: &str = "ktnh";

/// Maximum length of the stack name prefix
pub const MAX_STACK_PREFIX_LEN: usize = 10;

/// Default timeout in seconds when waiting for a stack operation (15 minutes)
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 900;

/// Number of identifier characters kept in stack names
pub const IDENTIFIER_TRUNCATE_LENGTH: usize = 10;

/// Length of the random stack qualifier
pub const QUALIFIER_LENGTH: usize = 6;

/// Interval between "still waiting" progress reports, in seconds
pub const PROGRESS_INTERVAL_SECS: u64 = 10;

/// Lower bound of the stack status polling delay, in seconds
pub const WAIT_MIN_DELAY_SECS: u64 = 10;

/// Upper bound of the stack status polling delay, in seconds
pub const WAIT_MAX_DELAY_SECS: u64 = 15;
