//! Pending maintenance aggregation
//!
//! RDS reports pending actions per resource. Cluster members are folded into
//! their parent cluster so a cluster's row reflects maintenance on any of its
//! instances, and members never show up under their own `db:` key.

use crate::aws::rds::RdsOperations;
use anyhow::{Context, Result};
use ktnh_common::DatabaseKind;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Maintenance flags keyed `cluster:<id>` / `db:<id>`
pub type MaintenanceMap = BTreeMap<String, bool>;

/// Split a resource ARN into `(resource type, identifier)` from its last two
/// colon-separated segments, e.g. `arn:aws:rds:...:cluster:my-cluster`.
pub fn parse_resource_locator(arn: &str) -> Option<(&str, &str)> {
    let mut segments = arn.rsplit(':');
    let identifier = segments.next()?;
    let resource_type = segments.next()?;
    Some((resource_type, identifier))
}

/// Computes pending maintenance for clusters and standalone instances
pub struct MaintenanceAggregator<R> {
    rds: Arc<R>,
}

impl<R: RdsOperations> MaintenanceAggregator<R> {
    pub fn new(rds: Arc<R>) -> Self {
        Self { rds }
    }

    /// Pending maintenance for `clusters` and `instances`.
    ///
    /// `cluster_members` maps cluster ids to member instance ids; members are
    /// queried too and reported under their parent cluster.
    pub async fn compute(
        &self,
        clusters: &[String],
        instances: &[String],
        cluster_members: &BTreeMap<String, Vec<String>>,
    ) -> Result<MaintenanceMap> {
        let mut result = MaintenanceMap::new();

        if clusters.is_empty() && instances.is_empty() {
            return Ok(result);
        }

        debug!("Starting to check for pending maintenance actions");

        let mut member_ids: Vec<String> = Vec::new();
        let mut parent_of: HashMap<&str, &str> = HashMap::new();
        for (cluster_id, members) in cluster_members {
            for member_id in members {
                member_ids.push(member_id.clone());
                parent_of.insert(member_id, cluster_id);
            }
        }
        member_ids.sort();

        let instance_filter: Vec<String> = instances.iter().cloned().chain(member_ids).collect();

        let mut marker = None;
        loop {
            let page = self
                .rds
                .describe_pending_maintenance_page(clusters, &instance_filter, marker.take())
                .await
                .context("Failed to check pending maintenance actions")?;

            for arn in &page.resource_identifiers {
                let Some((resource_type, identifier)) = parse_resource_locator(arn) else {
                    warn!(resource = %arn, "Ignoring pending action with unparseable resource");
                    continue;
                };

                let key = if resource_type == DatabaseKind::Cluster.arn_resource_type() {
                    DatabaseKind::Cluster.maintenance_key(identifier)
                } else if let Some(parent) = parent_of.get(identifier) {
                    DatabaseKind::Cluster.maintenance_key(parent)
                } else {
                    DatabaseKind::Instance.maintenance_key(identifier)
                };

                debug!(resource = %arn, key = %key, "Pending maintenance action");
                result.insert(key, true);
            }

            match page.marker {
                Some(next) if !next.is_empty() => marker = Some(next),
                _ => break,
            }
        }

        debug!(count = result.len(), "Checking pending maintenance actions successful");

        Ok(result)
    }
}
