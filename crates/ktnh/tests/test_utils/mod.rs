//! Shared test utilities for integration tests
//!
//! An in-memory CloudFormation and RDS account, plus region detection for the
//! tests that talk to real AWS.

#![allow(dead_code)]

use anyhow::{Result, bail};
use aws_sdk_cloudformation::types::StackStatus;
use ktnh::aws::{ClusterMembersPage, MaintenancePage, RdsOperations, StackOperations, StackPage};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Stacks per ListStacks page, small enough to exercise pagination
const PAGE_SIZE: usize = 2;

/// Get the AWS region for tests.
///
/// Checks AWS_REGION, then AWS_DEFAULT_REGION, then falls back to ap-northeast-1.
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| "ap-northeast-1".to_string())
}

#[derive(Debug, Default)]
struct State {
    /// Stacks in creation order
    stacks: Vec<(String, String)>,
    /// Cluster id -> (engine, member instance ids)
    clusters: BTreeMap<String, (String, Vec<String>)>,
    /// Instance id -> engine
    instances: BTreeMap<String, String>,
    /// Resource ARNs with pending maintenance
    pending: Vec<String>,
}

/// In-memory account. Stack operations complete immediately.
#[derive(Debug, Clone, Default)]
pub struct FakeAccount {
    state: Arc<Mutex<State>>,
}

impl FakeAccount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster(self, id: &str, engine: &str, members: &[&str]) -> Self {
        self.state.lock().unwrap().clusters.insert(
            id.to_string(),
            (
                engine.to_string(),
                members.iter().map(|m| m.to_string()).collect(),
            ),
        );
        self
    }

    pub fn with_instance(self, id: &str, engine: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .instances
            .insert(id.to_string(), engine.to_string());
        self
    }

    /// Mark `resource_type:id` (`cluster` or `db`) as having pending maintenance
    pub fn with_pending(self, resource_type: &str, id: &str) -> Self {
        self.state.lock().unwrap().pending.push(format!(
            "arn:aws:rds:ap-northeast-1:123456789012:{resource_type}:{id}"
        ));
        self
    }

    /// Add a stack directly, bypassing CreateStack
    pub fn with_stack(self, name: &str, body: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .stacks
            .push((name.to_string(), body.to_string()));
        self
    }

    pub fn stack_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .stacks
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl StackOperations for FakeAccount {
    async fn list_stacks_page(
        &self,
        _statuses: &[StackStatus],
        next_token: Option<String>,
    ) -> Result<StackPage> {
        let state = self.state.lock().unwrap();
        let start: usize = match next_token {
            Some(token) => token.parse()?,
            None => 0,
        };
        let end = (start + PAGE_SIZE).min(state.stacks.len());

        Ok(StackPage {
            stack_names: state.stacks[start.min(end)..end]
                .iter()
                .map(|(name, _)| name.clone())
                .collect(),
            next_token: (end < state.stacks.len()).then(|| end.to_string()),
        })
    }

    async fn create_stack(&self, stack_name: &str, template_body: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.stacks.iter().any(|(name, _)| name == stack_name) {
            bail!("Stack [{stack_name}] already exists");
        }
        state
            .stacks
            .push((stack_name.to_string(), template_body.to_string()));
        Ok(())
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .stacks
            .retain(|(name, _)| name != stack_name);
        Ok(())
    }

    async fn get_template_body(&self, stack_name: &str) -> Result<String> {
        let state = self.state.lock().unwrap();
        match state.stacks.iter().find(|(name, _)| name == stack_name) {
            Some((_, body)) => Ok(body.clone()),
            None => bail!("Stack with id {stack_name} does not exist"),
        }
    }

    async fn stack_status(&self, stack_name: &str) -> Result<Option<StackStatus>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .stacks
            .iter()
            .any(|(name, _)| name == stack_name)
            .then_some(StackStatus::CreateComplete))
    }
}

impl RdsOperations for FakeAccount {
    async fn describe_cluster_engine(&self, db_identifier: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .clusters
            .get(db_identifier)
            .map(|(engine, _)| engine.clone()))
    }

    async fn describe_instance_engine(&self, db_identifier: &str) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().instances.get(db_identifier).cloned())
    }

    async fn describe_cluster_members_page(
        &self,
        cluster_ids: &[String],
        _marker: Option<String>,
    ) -> Result<ClusterMembersPage> {
        let state = self.state.lock().unwrap();
        Ok(ClusterMembersPage {
            clusters: cluster_ids
                .iter()
                .filter_map(|id| {
                    state
                        .clusters
                        .get(id)
                        .map(|(_, members)| (id.clone(), members.clone()))
                })
                .collect(),
            marker: None,
        })
    }

    async fn describe_pending_maintenance_page(
        &self,
        cluster_ids: &[String],
        instance_ids: &[String],
        _marker: Option<String>,
    ) -> Result<MaintenancePage> {
        let state = self.state.lock().unwrap();
        let requested = |arn: &str| {
            let mut segments = arn.rsplit(':');
            let id = segments.next().unwrap_or_default();
            match segments.next() {
                Some("cluster") => cluster_ids.iter().any(|c| c == id),
                Some("db") => instance_ids.iter().any(|i| i == id),
                _ => false,
            }
        };

        Ok(MaintenancePage {
            resource_identifiers: state
                .pending
                .iter()
                .filter(|arn| requested(arn))
                .cloned()
                .collect(),
            marker: None,
        })
    }
}
