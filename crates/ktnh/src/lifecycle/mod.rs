//! Freeze, defrost and list managed databases
//!
//! A stack is attributed to a database only when both hold:
//!
//! 1. its name matches `^<prefix>-<shortIdentifier>-.+$`
//! 2. its template carries `Metadata.KTNH` naming this tool, the identifier
//!    and the database kind
//!
//! Short identifiers collide easily (`db-1-1234567890` and `db-1-12345zzzzz`
//! share `db-1-12345`), so the name alone is never trusted. At most one stack
//! may match; more than one is reported and left for the operator to resolve.

mod defrost;
mod freeze;
mod list;

pub use list::{ManagedDatabase, ManagedDatabaseList, MaintenanceStatus};

use crate::aws::cloudformation::StackOperations;
use crate::aws::rds::RdsOperations;
use crate::classifier::IdentifierClassifier;
use crate::error::LifecycleError;
use crate::maintenance::MaintenanceAggregator;
use crate::progress::{LogReporter, ProgressReporter};
use crate::registry::{StackEvaluator, StackRegistry, verify_metadata};
use anyhow::{Context, Result};
use ktnh_common::metadata::{ManagedMetadata, VerifyOption};
use ktnh_common::naming::{self, Qualifier, StackNameOption};
use ktnh_common::template::generate_template_body;
use ktnh_common::DatabaseKind;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Criteria a listed stack must meet
#[derive(Debug, Clone)]
pub struct MatchContext {
    pub pattern: Regex,
    pub verify: VerifyOption,
}

/// A stack that passed evaluation, with the metadata it was accepted on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedStack {
    pub stack_name: String,
    pub metadata: ManagedMetadata,
}

/// Evaluator matching the stack name pattern and then the template metadata.
///
/// Stacks whose template cannot be read or whose metadata is malformed are
/// logged and skipped so one bad stack does not break the scan.
pub struct MetadataEvaluator<'a, S> {
    registry: &'a StackRegistry<S>,
    context: MatchContext,
    matched: Vec<MatchedStack>,
}

impl<'a, S: StackOperations> MetadataEvaluator<'a, S> {
    pub fn new(registry: &'a StackRegistry<S>, context: MatchContext) -> Self {
        Self {
            registry,
            context,
            matched: Vec::new(),
        }
    }

    /// Stacks accepted so far, in evaluation order
    pub fn into_matched(self) -> Vec<MatchedStack> {
        self.matched
    }
}

impl<S: StackOperations> StackEvaluator for MetadataEvaluator<'_, S> {
    async fn matches(&mut self, stack_name: &str) -> bool {
        if !self.context.pattern.is_match(stack_name) {
            debug!(stack_name = %stack_name, "Stack name does not match pattern");
            return false;
        }

        let metadata = match self.registry.get_metadata(stack_name).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(
                    stack_name = %stack_name,
                    error = %format!("{e:#}"),
                    "Failed to retrieve metadata for stack during evaluation"
                );
                return false;
            }
        };

        match verify_metadata(&metadata, &self.context.verify) {
            Ok(true) => {
                self.matched.push(MatchedStack {
                    stack_name: stack_name.to_string(),
                    metadata,
                });
                true
            }
            Ok(false) => {
                debug!(stack_name = %stack_name, "Stack metadata does not match criteria");
                false
            }
            Err(e) => {
                warn!(
                    stack_name = %stack_name,
                    error = %e,
                    "Failed to verify metadata for stack during evaluation"
                );
                false
            }
        }
    }
}

/// Template body ready for [`LifecycleController::freeze`]
#[derive(Debug, Clone)]
pub struct GeneratedTemplate {
    pub body: String,
    pub qualifier: Qualifier,
    pub kind: DatabaseKind,
}

/// Drives the freeze/defrost/list lifecycle over CloudFormation and RDS
pub struct LifecycleController<S, R> {
    registry: StackRegistry<S>,
    classifier: IdentifierClassifier<R>,
    maintenance: MaintenanceAggregator<R>,
    prefix: String,
}

impl<S: StackOperations, R: RdsOperations> LifecycleController<S, R> {
    /// Create a controller that reports progress through `tracing`
    pub fn new(stacks: S, rds: R, prefix: impl Into<String>) -> Self {
        Self::with_reporter(stacks, rds, prefix, Arc::new(LogReporter::new()))
    }

    /// Create a controller with a custom progress reporter
    pub fn with_reporter(
        stacks: S,
        rds: R,
        prefix: impl Into<String>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        let rds = Arc::new(rds);
        Self {
            registry: StackRegistry::with_reporter(stacks, reporter),
            classifier: IdentifierClassifier::new(rds.clone()),
            maintenance: MaintenanceAggregator::new(rds),
            prefix: prefix.into(),
        }
    }

    /// Stack name prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn registry(&self) -> &StackRegistry<S> {
        &self.registry
    }

    /// Build the stack name (or name pattern) for `option` under this prefix
    pub fn stack_name(&self, option: &StackNameOption<'_>) -> String {
        naming::generate_stack_name(&self.prefix, option)
    }

    fn compile_pattern(&self, option: &StackNameOption<'_>) -> Result<Regex> {
        let pattern = naming::stack_name_pattern(&self.prefix, option);
        debug!(pattern = %pattern, "Generated stack name pattern for matching");

        Regex::new(&pattern).with_context(|| format!("failed to compile regex pattern '{pattern}'"))
    }

    /// Scan stacks with `context`, returning every accepted stack
    pub async fn scan(&self, context: MatchContext) -> Result<Vec<MatchedStack>> {
        let mut evaluator = MetadataEvaluator::new(&self.registry, context);

        self.registry
            .list_stacks(&mut evaluator)
            .await
            .context("failed to list CloudFormation stacks")?;

        Ok(evaluator.into_matched())
    }

    /// The single stack managing `db_identifier`, if any.
    ///
    /// Two or more matches are an [`LifecycleError::AmbiguousStacks`] error.
    pub async fn find_matching_stack(&self, db_identifier: &str) -> Result<Option<String>> {
        debug!(db_identifier = %db_identifier, "Finding matching stack");

        let kind = self
            .classifier
            .determine_kind(db_identifier)
            .await
            .context("failed to determine DB type")?;

        let short = naming::shorten_identifier(db_identifier);
        let pattern = self.compile_pattern(&StackNameOption {
            db_identifier_short: Some(&short),
            qualifier: None,
        })?;

        let matched = self
            .scan(MatchContext {
                pattern,
                verify: VerifyOption {
                    db_identifier: Some(db_identifier.to_string()),
                    db_kind: Some(kind),
                },
            })
            .await?;

        debug!(count = matched.len(), "Found stacks matching criteria");

        let mut names: Vec<String> = matched.into_iter().map(|m| m.stack_name).collect();
        match names.len() {
            0 => Ok(None),
            1 => {
                let stack_name = names.remove(0);
                debug!(stack_name = %stack_name, "Found single matching stack");
                Ok(Some(stack_name))
            }
            _ => Err(LifecycleError::AmbiguousStacks {
                db_identifier: db_identifier.to_string(),
                stacks: names,
            }
            .into()),
        }
    }

    /// Classify `db_identifier` and render a template with a fresh qualifier
    pub async fn template(&self, db_identifier: &str) -> Result<GeneratedTemplate> {
        let kind = self
            .classifier
            .determine_kind(db_identifier)
            .await
            .context("failed to determine DB type")?;

        let qualifier = Qualifier::generate();
        let short = naming::shorten_identifier(db_identifier);
        let body = generate_template_body(db_identifier, &short, kind, &qualifier);

        Ok(GeneratedTemplate {
            body,
            qualifier,
            kind,
        })
    }
}
