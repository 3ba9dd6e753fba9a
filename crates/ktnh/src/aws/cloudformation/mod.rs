//! CloudFormation stack operations

mod operations;

pub use operations::{StackOperations, StackPage};

#[cfg(test)]
pub use operations::MockStackOperations;

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::classify_sdk_error;
use anyhow::{Context, Result};
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::types::{Capability, StackStatus};
use tracing::debug;

/// Stack statuses requested from ListStacks: everything except `DELETE_COMPLETE`
pub fn listed_stack_statuses() -> Vec<StackStatus> {
    StackStatus::values()
        .iter()
        .map(|s| StackStatus::from(*s))
        .filter(|s| *s != StackStatus::DeleteComplete)
        .collect()
}

/// CloudFormation client for managing ktnh stacks
pub struct CloudFormationClient {
    pub(crate) client: Client,
}

impl FromAwsContext for CloudFormationClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.cloudformation_client(),
        }
    }
}

impl CloudFormationClient {
    /// Fetch one page of ListStacks filtered by `statuses`
    pub async fn list_stacks_page(
        &self,
        statuses: &[StackStatus],
        next_token: Option<String>,
    ) -> Result<StackPage> {
        let response = self
            .client
            .list_stacks()
            .set_stack_status_filter(Some(statuses.to_vec()))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .context("Failed to execute ListStacks API")?;

        let stack_names: Vec<String> = response
            .stack_summaries()
            .iter()
            .filter_map(|summary| summary.stack_name())
            .map(str::to_string)
            .collect();

        debug!(count = stack_names.len(), "Listed page of stacks");

        Ok(StackPage {
            stack_names,
            next_token: response.next_token().map(str::to_string),
        })
    }

    /// Create a stack from a template body (with `CAPABILITY_NAMED_IAM`)
    pub async fn create_stack(&self, stack_name: &str, template_body: &str) -> Result<()> {
        let response = self
            .client
            .create_stack()
            .stack_name(stack_name)
            .template_body(template_body)
            .capabilities(Capability::CapabilityNamedIam)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .with_context(|| format!("Failed to create stack '{stack_name}'"))?;

        debug!(
            stack_name = %stack_name,
            stack_id = ?response.stack_id(),
            "CreateStack accepted"
        );

        Ok(())
    }

    /// Request deletion of a stack
    pub async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        self.client
            .delete_stack()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .with_context(|| format!("Failed to delete stack '{stack_name}'"))?;

        debug!(stack_name = %stack_name, "DeleteStack accepted");

        Ok(())
    }

    /// Fetch the original template body of a stack
    pub async fn get_template_body(&self, stack_name: &str) -> Result<String> {
        let response = self
            .client
            .get_template()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .with_context(|| format!("Failed to get template for stack '{stack_name}'"))?;

        Ok(response.template_body().unwrap_or_default().to_string())
    }

    /// Current status of a stack; `None` once the stack no longer exists
    pub async fn stack_status(&self, stack_name: &str) -> Result<Option<StackStatus>> {
        let response = match self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let classified = classify_sdk_error(&e);
                if classified.is_not_found() {
                    debug!(stack_name = %stack_name, "Stack does not exist");
                    return Ok(None);
                }
                return Err(classified)
                    .with_context(|| format!("Failed to describe stack '{stack_name}'"));
            }
        };

        Ok(response
            .stacks()
            .first()
            .and_then(|stack| stack.stack_status())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_excludes_only_delete_complete() {
        let statuses = listed_stack_statuses();
        assert!(!statuses.contains(&StackStatus::DeleteComplete));
        assert!(statuses.contains(&StackStatus::CreateComplete));
        assert!(statuses.contains(&StackStatus::DeleteInProgress));
        assert!(statuses.contains(&StackStatus::DeleteFailed));
        assert_eq!(statuses.len(), StackStatus::values().len() - 1);
    }
}
