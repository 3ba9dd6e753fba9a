//! CloudFormation operations trait for testing

use super::CloudFormationClient;
use anyhow::Result;
use aws_sdk_cloudformation::types::StackStatus;

/// One page of ListStacks results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackPage {
    pub stack_names: Vec<String>,
    pub next_token: Option<String>,
}

/// Trait for CloudFormation operations that can be mocked in tests.
///
/// Pagination is exposed page by page so the registry owns the loop.
///
/// Note: `next_token` is `Option<String>` instead of `Option<&str>` to work
/// around mockall lifetime limitations.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait StackOperations: Send + Sync {
    /// Fetch one page of stacks whose status is in `statuses`
    async fn list_stacks_page(
        &self,
        statuses: &[StackStatus],
        next_token: Option<String>,
    ) -> Result<StackPage>;

    /// Create a stack from a template body
    async fn create_stack(&self, stack_name: &str, template_body: &str) -> Result<()>;

    /// Request deletion of a stack
    async fn delete_stack(&self, stack_name: &str) -> Result<()>;

    /// Fetch the template body of a stack
    async fn get_template_body(&self, stack_name: &str) -> Result<String>;

    /// Current stack status, `None` when the stack does not exist
    async fn stack_status(&self, stack_name: &str) -> Result<Option<StackStatus>>;
}

impl StackOperations for CloudFormationClient {
    async fn list_stacks_page(
        &self,
        statuses: &[StackStatus],
        next_token: Option<String>,
    ) -> Result<StackPage> {
        CloudFormationClient::list_stacks_page(self, statuses, next_token).await
    }

    async fn create_stack(&self, stack_name: &str, template_body: &str) -> Result<()> {
        CloudFormationClient::create_stack(self, stack_name, template_body).await
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        CloudFormationClient::delete_stack(self, stack_name).await
    }

    async fn get_template_body(&self, stack_name: &str) -> Result<String> {
        CloudFormationClient::get_template_body(self, stack_name).await
    }

    async fn stack_status(&self, stack_name: &str) -> Result<Option<StackStatus>> {
        CloudFormationClient::stack_status(self, stack_name).await
    }
}
