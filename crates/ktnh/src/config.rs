//! Validated lifecycle configuration

use ktnh_common::defaults::MAX_STACK_PREFIX_LEN;
use std::time::Duration;
use thiserror::Error;

/// Invalid command line configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid stack prefix '{0}': must be 1-10 ASCII alphanumeric characters")]
    InvalidPrefix(String),

    #[error("wait timeout must be greater than 0 seconds (use --no-wait to skip waiting)")]
    ZeroWaitTimeout,
}

/// Settings shared by freeze, defrost and list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Stack name prefix
    pub prefix: String,
    /// How long to wait for stack operations; zero skips waiting
    pub wait_timeout: Duration,
}

impl LifecycleConfig {
    /// Validate raw flag values.
    ///
    /// `no_wait` wins over `wait_timeout_secs`, which is then not checked.
    pub fn new(prefix: &str, no_wait: bool, wait_timeout_secs: u64) -> Result<Self, ConfigError> {
        validate_prefix(prefix)?;

        let wait_timeout = if no_wait {
            Duration::ZERO
        } else if wait_timeout_secs == 0 {
            return Err(ConfigError::ZeroWaitTimeout);
        } else {
            Duration::from_secs(wait_timeout_secs)
        };

        Ok(Self {
            prefix: prefix.to_string(),
            wait_timeout,
        })
    }
}

fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    let valid = !prefix.is_empty()
        && prefix.len() <= MAX_STACK_PREFIX_LEN
        && prefix.chars().all(|c| c.is_ascii_alphanumeric());

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidPrefix(prefix.to_string()))
    }
}
