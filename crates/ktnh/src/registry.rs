//! Stack registry: list, create, delete and wait on ktnh stacks
//!
//! The registry knows nothing about which stacks belong to which database.
//! Callers decide that through a [`StackEvaluator`] passed to
//! [`StackRegistry::list_stacks`].

use crate::aws::cloudformation::{StackOperations, listed_stack_statuses};
use crate::progress::{LogReporter, ProgressReporter, StackOperation, spawn_progress_ticker};
use crate::wait::{WaitConfig, wait_for_resource};
use anyhow::{Context, Result, bail};
use aws_sdk_cloudformation::types::StackStatus;
use ktnh_common::defaults::PROGRESS_INTERVAL_SECS;
use ktnh_common::metadata::{ManagedMetadata, parse_template_metadata};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use ktnh_common::metadata::verify_metadata;

/// Decides whether a listed stack is part of the result
#[allow(async_fn_in_trait)] // Internal use only
pub trait StackEvaluator {
    async fn matches(&mut self, stack_name: &str) -> bool;
}

/// Evaluator that keeps every stack
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl StackEvaluator for AcceptAll {
    async fn matches(&mut self, _stack_name: &str) -> bool {
        true
    }
}

/// CloudFormation stack registry
pub struct StackRegistry<S> {
    stacks: S,
    reporter: Arc<dyn ProgressReporter>,
    progress_interval: Duration,
}

impl<S: StackOperations> StackRegistry<S> {
    /// Create a registry that reports progress through `tracing`
    pub fn new(stacks: S) -> Self {
        Self::with_reporter(stacks, Arc::new(LogReporter::new()))
    }

    /// Create a registry with a custom progress reporter
    pub fn with_reporter(stacks: S, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            stacks,
            reporter,
            progress_interval: Duration::from_secs(PROGRESS_INTERVAL_SECS),
        }
    }

    pub(crate) fn reporter(&self) -> &Arc<dyn ProgressReporter> {
        &self.reporter
    }

    /// List stack names accepted by `evaluator`, in listing order.
    ///
    /// A failing page aborts the whole listing; no partial result is returned.
    pub async fn list_stacks<E: StackEvaluator>(&self, evaluator: &mut E) -> Result<Vec<String>> {
        debug!("Listing CloudFormation stacks");

        let statuses = listed_stack_statuses();
        let mut matched = Vec::new();
        let mut next_token = None;

        loop {
            let page = self
                .stacks
                .list_stacks_page(&statuses, next_token.take())
                .await
                .context("Failed to list CloudFormation stacks")?;

            for stack_name in page.stack_names {
                debug!(stack_name = %stack_name, "Evaluating stack");

                if evaluator.matches(&stack_name).await {
                    debug!(stack_name = %stack_name, "Stack matched");
                    matched.push(stack_name);
                }
            }

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        debug!(count = matched.len(), "Listed CloudFormation stacks");

        Ok(matched)
    }

    /// Create a stack. Not idempotent: an existing name fails upstream.
    pub async fn create_stack(&self, stack_name: &str, template_body: &str) -> Result<()> {
        self.stacks.create_stack(stack_name, template_body).await?;
        self.reporter
            .report_requested(stack_name, StackOperation::Creation);
        Ok(())
    }

    /// Request deletion of a stack
    pub async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        self.stacks.delete_stack(stack_name).await?;
        self.reporter
            .report_requested(stack_name, StackOperation::Deletion);
        Ok(())
    }

    /// Read `Metadata.KTNH` from a stack's template
    pub async fn get_metadata(&self, stack_name: &str) -> Result<ManagedMetadata> {
        let body = self.stacks.get_template_body(stack_name).await?;

        parse_template_metadata(&body)
            .with_context(|| format!("Failed to parse metadata of stack '{stack_name}'"))
    }

    /// Wait until the stack is `CREATE_COMPLETE`
    pub async fn wait_for_create(&self, stack_name: &str, timeout: Duration) -> Result<()> {
        self.wait_for(stack_name, StackOperation::Creation, timeout)
            .await
    }

    /// Wait until the stack is `DELETE_COMPLETE` or gone
    pub async fn wait_for_delete(&self, stack_name: &str, timeout: Duration) -> Result<()> {
        self.wait_for(stack_name, StackOperation::Deletion, timeout)
            .await
    }

    async fn wait_for(
        &self,
        stack_name: &str,
        operation: StackOperation,
        timeout: Duration,
    ) -> Result<()> {
        self.reporter
            .report_wait_started(stack_name, operation, timeout);

        let cancel = CancellationToken::new();
        let _stop_ticker = cancel.clone().drop_guard();
        spawn_progress_ticker(
            self.reporter.clone(),
            stack_name.to_string(),
            operation,
            self.progress_interval,
            cancel,
        );

        let stacks = &self.stacks;
        let resource_name = format!("stack '{stack_name}' {operation}");

        wait_for_resource(
            WaitConfig::stack_operation(timeout),
            None,
            move || async move {
                let status = stacks.stack_status(stack_name).await?;
                debug!(stack_name = %stack_name, status = ?status, "Polled stack status");
                evaluate_status(operation, status)
            },
            &resource_name,
        )
        .await
        .with_context(|| {
            format!("error while waiting for stack '{stack_name}' {operation} to complete")
        })?;

        self.reporter.report_completed(stack_name, operation);

        Ok(())
    }
}

/// Map a polled status to done (`true`), keep polling (`false`) or failure
fn evaluate_status(operation: StackOperation, status: Option<StackStatus>) -> Result<bool> {
    match (operation, status) {
        (StackOperation::Creation, Some(StackStatus::CreateComplete)) => Ok(true),
        (
            StackOperation::Creation,
            Some(StackStatus::CreateInProgress | StackStatus::ReviewInProgress),
        ) => Ok(false),
        (StackOperation::Creation, Some(other)) => {
            bail!("stack entered status {}", other.as_str())
        }
        (StackOperation::Creation, None) => bail!("stack no longer exists"),

        (StackOperation::Deletion, None | Some(StackStatus::DeleteComplete)) => Ok(true),
        (StackOperation::Deletion, Some(StackStatus::DeleteFailed)) => {
            bail!("stack entered status {}", StackStatus::DeleteFailed.as_str())
        }
        (StackOperation::Deletion, Some(_)) => Ok(false),
    }
}
