//! RDS operations trait for testing

use super::RdsClient;
use anyhow::Result;

/// One page of cluster membership: `(cluster id, member instance ids)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterMembersPage {
    pub clusters: Vec<(String, Vec<String>)>,
    pub marker: Option<String>,
}

/// One page of pending maintenance actions, as resource ARNs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenancePage {
    pub resource_identifiers: Vec<String>,
    pub marker: Option<String>,
}

/// Trait for RDS operations that can be mocked in tests.
///
/// Note: markers use `Option<String>` instead of `Option<&str>` to work
/// around mockall lifetime limitations.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait RdsOperations: Send + Sync {
    /// Engine of a DB cluster, `None` when the cluster does not exist
    async fn describe_cluster_engine(&self, db_identifier: &str) -> Result<Option<String>>;

    /// Engine of a DB instance, `None` when the instance does not exist
    async fn describe_instance_engine(&self, db_identifier: &str) -> Result<Option<String>>;

    /// One page of cluster membership for `cluster_ids`
    async fn describe_cluster_members_page(
        &self,
        cluster_ids: &[String],
        marker: Option<String>,
    ) -> Result<ClusterMembersPage>;

    /// One page of pending maintenance actions for the given clusters and instances
    async fn describe_pending_maintenance_page(
        &self,
        cluster_ids: &[String],
        instance_ids: &[String],
        marker: Option<String>,
    ) -> Result<MaintenancePage>;
}

impl RdsOperations for RdsClient {
    async fn describe_cluster_engine(&self, db_identifier: &str) -> Result<Option<String>> {
        RdsClient::describe_cluster_engine(self, db_identifier).await
    }

    async fn describe_instance_engine(&self, db_identifier: &str) -> Result<Option<String>> {
        RdsClient::describe_instance_engine(self, db_identifier).await
    }

    async fn describe_cluster_members_page(
        &self,
        cluster_ids: &[String],
        marker: Option<String>,
    ) -> Result<ClusterMembersPage> {
        RdsClient::describe_cluster_members_page(self, cluster_ids, marker).await
    }

    async fn describe_pending_maintenance_page(
        &self,
        cluster_ids: &[String],
        instance_ids: &[String],
        marker: Option<String>,
    ) -> Result<MaintenancePage> {
        RdsClient::describe_pending_maintenance_page(self, cluster_ids, instance_ids, marker)
            .await
    }
}
