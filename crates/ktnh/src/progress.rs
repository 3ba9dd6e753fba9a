//! Progress reporting for stack operations
//!
//! Lifecycle code reports what it is doing through [`ProgressReporter`]
//! instead of deciding how it is shown. [`LogReporter`] turns the events into
//! `tracing` records, which is what the CLI uses.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Stack operation being waited on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOperation {
    Creation,
    Deletion,
}

impl fmt::Display for StackOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackOperation::Creation => f.write_str("creation"),
            StackOperation::Deletion => f.write_str("deletion"),
        }
    }
}

/// Trait for reporting lifecycle progress
pub trait ProgressReporter: Send + Sync {
    /// A create or delete request was accepted
    fn report_requested(&self, stack_name: &str, operation: StackOperation);

    /// Waiting was skipped because the timeout is zero
    fn report_wait_skipped(&self, stack_name: &str, operation: StackOperation);

    /// Waiting started with the given timeout
    fn report_wait_started(&self, stack_name: &str, operation: StackOperation, timeout: Duration);

    /// Periodic notice while a wait is still in progress
    fn report_still_waiting(&self, stack_name: &str, operation: StackOperation, elapsed: Duration);

    /// The stack reached its terminal success status
    fn report_completed(&self, stack_name: &str, operation: StackOperation);
}

/// Progress reporter that logs through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl LogReporter {
    /// Create a new log reporter
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for LogReporter {
    fn report_requested(&self, stack_name: &str, operation: StackOperation) {
        info!(stack_name = %stack_name, operation = %operation, "Stack operation requested");
    }

    fn report_wait_skipped(&self, stack_name: &str, operation: StackOperation) {
        info!(stack_name = %stack_name, operation = %operation, "Skipped wait for stack operation");
    }

    fn report_wait_started(&self, stack_name: &str, operation: StackOperation, timeout: Duration) {
        info!(
            stack_name = %stack_name,
            operation = %operation,
            timeout_secs = timeout.as_secs(),
            "Waiting for stack operation to complete"
        );
    }

    fn report_still_waiting(&self, stack_name: &str, operation: StackOperation, elapsed: Duration) {
        info!(
            stack_name = %stack_name,
            operation = %operation,
            elapsed_secs = elapsed.as_secs(),
            "Waiting for stack operation to complete"
        );
    }

    fn report_completed(&self, stack_name: &str, operation: StackOperation) {
        info!(stack_name = %stack_name, operation = %operation, "Stack operation completed");
    }
}

/// Emit [`ProgressReporter::report_still_waiting`] every `interval` until
/// `cancel` fires.
pub fn spawn_progress_ticker(
    reporter: Arc<dyn ProgressReporter>,
    stack_name: String,
    operation: StackOperation,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = Instant::now();
        let mut ticker = tokio::time::interval_at(start + interval, interval);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {
                    reporter.report_still_waiting(&stack_name, operation, start.elapsed());
                }
            }
        }
    })
}
