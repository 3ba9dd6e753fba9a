//! Defrost: delete the stack so the database is no longer kept stopped

use super::LifecycleController;
use crate::aws::cloudformation::StackOperations;
use crate::aws::rds::RdsOperations;
use crate::error::LifecycleError;
use crate::progress::StackOperation;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

impl<S: StackOperations, R: RdsOperations> LifecycleController<S, R> {
    /// Delete the managed stack for `db_identifier` and return its name.
    ///
    /// The database itself is left as it is; deleting the stack only stops
    /// the automation that keeps it stopped.
    pub async fn defrost(&self, db_identifier: &str, timeout: Duration) -> Result<String> {
        let Some(stack_name) = self
            .find_matching_stack(db_identifier)
            .await
            .context("error while finding matching stack")?
        else {
            return Err(LifecycleError::NotFrozen {
                db_identifier: db_identifier.to_string(),
            }
            .into());
        };

        info!(stack_name = %stack_name, "Deleting CloudFormation stack");

        self.registry
            .delete_stack(&stack_name)
            .await
            .context("failed to delete CloudFormation stack")?;

        if timeout.is_zero() {
            self.registry
                .reporter()
                .report_wait_skipped(&stack_name, StackOperation::Deletion);
            return Ok(stack_name);
        }

        self.registry
            .wait_for_delete(&stack_name, timeout)
            .await
            .context("failed while waiting for stack deletion")?;

        Ok(stack_name)
    }
}
