//! Database classification: Aurora cluster or standalone RDS instance

use crate::aws::rds::RdsOperations;
use crate::error::LifecycleError;
use anyhow::{Context, Result};
use ktnh_common::DatabaseKind;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Engine names starting with this are Aurora (`aurora`, `aurora-mysql`, `aurora-postgresql`)
pub const AURORA_ENGINE_PREFIX: &str = "aurora";

/// Whether `engine` is an Aurora engine; an empty engine is an error.
fn is_aurora_engine(db_identifier: &str, engine: &str) -> Result<bool, LifecycleError> {
    if engine.is_empty() {
        return Err(LifecycleError::EmptyEngine {
            db_identifier: db_identifier.to_string(),
        });
    }

    let aurora = engine.starts_with(AURORA_ENGINE_PREFIX);
    debug!(engine = %engine, aurora, "Checked engine");

    Ok(aurora)
}

/// Classifies DB identifiers and resolves cluster membership
pub struct IdentifierClassifier<R> {
    rds: Arc<R>,
}

impl<R: RdsOperations> IdentifierClassifier<R> {
    pub fn new(rds: Arc<R>) -> Self {
        Self { rds }
    }

    /// Determine whether `db_identifier` names an Aurora cluster or an RDS instance.
    ///
    /// The cluster probe runs first. A missing cluster, or a cluster whose
    /// engine is not Aurora, falls through to the instance probe. Any other
    /// API error is returned as is.
    pub async fn determine_kind(&self, db_identifier: &str) -> Result<DatabaseKind> {
        debug!(db_identifier = %db_identifier, "Determining DB type");

        let cluster_engine = self
            .rds
            .describe_cluster_engine(db_identifier)
            .await
            .context("failed to check if Aurora cluster")?;

        if let Some(engine) = cluster_engine {
            if is_aurora_engine(db_identifier, &engine)? {
                debug!("Identified as Aurora cluster");
                return Ok(DatabaseKind::Cluster);
            }
            debug!(engine = %engine, "DB cluster is not Aurora, checking instances");
        }

        let instance_engine = self
            .rds
            .describe_instance_engine(db_identifier)
            .await
            .context("failed to check if RDS instance")?;

        match instance_engine {
            Some(engine) if is_aurora_engine(db_identifier, &engine)? => {
                debug!("Identified as Aurora (instance probe)");
                Ok(DatabaseKind::Cluster)
            }
            Some(_) => {
                debug!("Identified as RDS instance");
                Ok(DatabaseKind::Instance)
            }
            None => Err(LifecycleError::UnknownDatabase {
                db_identifier: db_identifier.to_string(),
            }
            .into()),
        }
    }

    /// Member instance ids of each cluster in `cluster_ids`.
    ///
    /// Member order is kept as RDS returns it. No API call for empty input.
    pub async fn resolve_cluster_members(
        &self,
        cluster_ids: &[String],
    ) -> Result<BTreeMap<String, Vec<String>>> {
        let mut members = BTreeMap::new();

        if cluster_ids.is_empty() {
            return Ok(members);
        }

        debug!(clusters = ?cluster_ids, "Retrieving DB instances that belong to DB clusters");

        let mut marker = None;
        loop {
            let page = self
                .rds
                .describe_cluster_members_page(cluster_ids, marker.take())
                .await?;

            for (cluster_id, instance_ids) in page.clusters {
                debug!(
                    cluster = %cluster_id,
                    instance_count = instance_ids.len(),
                    "Retrieved DB instances for cluster"
                );
                members.insert(cluster_id, instance_ids);
            }

            match page.marker {
                Some(next) if !next.is_empty() => marker = Some(next),
                _ => break,
            }
        }

        Ok(members)
    }
}
