//! RDS lookups: engine probes, cluster membership and pending maintenance

mod operations;

pub use operations::{ClusterMembersPage, MaintenancePage, RdsOperations};

#[cfg(test)]
pub use operations::MockRdsOperations;

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::classify_sdk_error;
use anyhow::{Context, Result};
use aws_sdk_rds::Client;
use aws_sdk_rds::types::Filter;
use tracing::debug;

/// RDS client used for classification and maintenance lookups
pub struct RdsClient {
    pub(crate) client: Client,
}

impl FromAwsContext for RdsClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.rds_client(),
        }
    }
}

/// Build a DescribeX filter
fn filter(name: &str, values: &[String]) -> Result<Filter> {
    Ok(Filter::builder()
        .name(name)
        .set_values(Some(values.to_vec()))
        .build())
}

impl RdsClient {
    /// Engine of the DB cluster `db_identifier`, `None` if no such cluster
    pub async fn describe_cluster_engine(&self, db_identifier: &str) -> Result<Option<String>> {
        let response = match self
            .client
            .describe_db_clusters()
            .db_cluster_identifier(db_identifier)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let classified = classify_sdk_error(&e);
                if classified.is_not_found() {
                    debug!(db_identifier = %db_identifier, "DB cluster not found");
                    return Ok(None);
                }
                return Err(classified).context("Failed to execute DescribeDBClusters API");
            }
        };

        Ok(response
            .db_clusters()
            .first()
            .map(|cluster| cluster.engine().unwrap_or_default().to_string()))
    }

    /// Engine of the DB instance `db_identifier`, `None` if no such instance
    pub async fn describe_instance_engine(&self, db_identifier: &str) -> Result<Option<String>> {
        let response = match self
            .client
            .describe_db_instances()
            .db_instance_identifier(db_identifier)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let classified = classify_sdk_error(&e);
                if classified.is_not_found() {
                    debug!(db_identifier = %db_identifier, "DB instance not found");
                    return Ok(None);
                }
                return Err(classified).context("Failed to execute DescribeDBInstances API");
            }
        };

        Ok(response
            .db_instances()
            .first()
            .map(|instance| instance.engine().unwrap_or_default().to_string()))
    }

    /// One page of DescribeDBClusters filtered by `db-cluster-id`
    pub async fn describe_cluster_members_page(
        &self,
        cluster_ids: &[String],
        marker: Option<String>,
    ) -> Result<ClusterMembersPage> {
        let response = self
            .client
            .describe_db_clusters()
            .filters(filter("db-cluster-id", cluster_ids)?)
            .set_marker(marker)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .context("Failed to execute DescribeDBClusters API")?;

        let clusters = response
            .db_clusters()
            .iter()
            .map(|cluster| {
                let members = cluster
                    .db_cluster_members()
                    .iter()
                    .map(|member| member.db_instance_identifier().unwrap_or_default().to_string())
                    .collect();
                (
                    cluster.db_cluster_identifier().unwrap_or_default().to_string(),
                    members,
                )
            })
            .collect();

        Ok(ClusterMembersPage {
            clusters,
            marker: response.marker().map(str::to_string),
        })
    }

    /// One page of DescribePendingMaintenanceActions.
    ///
    /// Empty id lists are left out of the filter set.
    pub async fn describe_pending_maintenance_page(
        &self,
        cluster_ids: &[String],
        instance_ids: &[String],
        marker: Option<String>,
    ) -> Result<MaintenancePage> {
        let mut filters = Vec::new();
        if !cluster_ids.is_empty() {
            filters.push(filter("db-cluster-id", cluster_ids)?);
        }
        if !instance_ids.is_empty() {
            filters.push(filter("db-instance-id", instance_ids)?);
        }

        let response = self
            .client
            .describe_pending_maintenance_actions()
            .set_filters(Some(filters))
            .set_marker(marker)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .context("Failed to execute DescribePendingMaintenanceActions API")?;

        let resource_identifiers = response
            .pending_maintenance_actions()
            .iter()
            .filter_map(|action| action.resource_identifier())
            .map(str::to_string)
            .collect();

        Ok(MaintenancePage {
            resource_identifiers,
            marker: response.marker().map(str::to_string),
        })
    }
}
