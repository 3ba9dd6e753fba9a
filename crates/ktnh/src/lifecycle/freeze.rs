//! Freeze: create the stack that keeps a database stopped

use super::LifecycleController;
use crate::aws::cloudformation::StackOperations;
use crate::aws::rds::RdsOperations;
use crate::error::LifecycleError;
use crate::progress::StackOperation;
use anyhow::{Context, Result};
use ktnh_common::naming::{self, Qualifier, StackNameOption};
use std::time::Duration;
use tracing::info;

impl<S: StackOperations, R: RdsOperations> LifecycleController<S, R> {
    /// Create `<prefix>-<shortIdentifier>-<qualifier>` from `template_body`.
    ///
    /// Fails if a managed stack already exists for `db_identifier`. A zero
    /// `timeout` returns right after the create request is accepted.
    ///
    /// The existence check and the create are not atomic: two concurrent
    /// freezes of one database can both succeed, which later surfaces as
    /// [`LifecycleError::AmbiguousStacks`].
    pub async fn freeze(
        &self,
        db_identifier: &str,
        template_body: &str,
        qualifier: &Qualifier,
        timeout: Duration,
    ) -> Result<String> {
        let existing = self
            .find_matching_stack(db_identifier)
            .await
            .context("error while checking for existing stacks")?;

        if let Some(stack_name) = existing {
            return Err(LifecycleError::AlreadyFrozen {
                stack_name,
                db_identifier: db_identifier.to_string(),
            }
            .into());
        }

        let short = naming::shorten_identifier(db_identifier);
        let stack_name = self.stack_name(&StackNameOption {
            db_identifier_short: Some(&short),
            qualifier: Some(qualifier.as_str()),
        });

        info!(stack_name = %stack_name, "Creating CloudFormation stack");

        self.registry
            .create_stack(&stack_name, template_body)
            .await
            .context("failed to create CloudFormation stack")?;

        if timeout.is_zero() {
            self.registry
                .reporter()
                .report_wait_skipped(&stack_name, StackOperation::Creation);
            return Ok(stack_name);
        }

        self.registry
            .wait_for_create(&stack_name, timeout)
            .await
            .context("failed while waiting for stack creation")?;

        Ok(stack_name)
    }
}
