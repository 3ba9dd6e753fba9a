//! List: every database ktnh currently manages, with maintenance status

use super::{LifecycleController, MatchContext};
use crate::aws::cloudformation::StackOperations;
use crate::aws::rds::RdsOperations;
use crate::maintenance::MaintenanceMap;
use anyhow::Result;
use ktnh_common::DatabaseKind;
use ktnh_common::metadata::VerifyOption;
use ktnh_common::naming::StackNameOption;
use std::fmt;
use tracing::{debug, warn};

/// Column headers of the list output
pub const LIST_HEADERS: [&str; 4] = ["id", "type", "stack", "maintenance"];

/// Pending maintenance state of a managed database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceStatus {
    Pending,
    None,
    /// Maintenance could not be determined
    Unknown,
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaintenanceStatus::Pending => f.write_str("pending"),
            MaintenanceStatus::None => f.write_str("none"),
            MaintenanceStatus::Unknown => f.write_str("(unknown)"),
        }
    }
}

/// One managed database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedDatabase {
    pub db_identifier: String,
    pub kind: DatabaseKind,
    pub stack_name: String,
    pub maintenance: MaintenanceStatus,
}

impl ManagedDatabase {
    fn row(&self) -> Vec<String> {
        vec![
            self.db_identifier.clone(),
            self.kind.to_string(),
            self.stack_name.clone(),
            self.maintenance.to_string(),
        ]
    }
}

/// Managed databases in stack listing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedDatabaseList {
    pub databases: Vec<ManagedDatabase>,
}

impl ManagedDatabaseList {
    pub fn headers(&self) -> Vec<String> {
        LIST_HEADERS.iter().map(|h| h.to_string()).collect()
    }

    /// One row per database, columns as in [`LIST_HEADERS`]
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.databases.iter().map(ManagedDatabase::row).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }
}

impl<S: StackOperations, R: RdsOperations> LifecycleController<S, R> {
    /// List managed databases.
    ///
    /// Stacks are matched on the prefix and the generator only. A failure to
    /// determine maintenance is logged and every row shows
    /// [`MaintenanceStatus::Unknown`]; only a failure to list stacks is
    /// returned as an error.
    pub async fn list(&self) -> Result<ManagedDatabaseList> {
        let pattern = self.compile_pattern(&StackNameOption::default())?;

        let matched = self
            .scan(MatchContext {
                pattern,
                verify: VerifyOption::default(),
            })
            .await?;

        let mut entries = Vec::with_capacity(matched.len());
        for stack in matched {
            match stack.metadata.db_type.parse::<DatabaseKind>() {
                Ok(kind) => entries.push((stack.metadata.db_identifier, kind, stack.stack_name)),
                Err(e) => warn!(
                    stack_name = %stack.stack_name,
                    error = %e,
                    "Skipping stack with unrecognized DB type"
                ),
            }
        }

        debug!(count = entries.len(), "Collected managed databases");

        let maintenance = match self.maintenance_for(&entries).await {
            Ok(map) => Some(map),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to add maintenance status");
                None
            }
        };

        let databases = entries
            .into_iter()
            .map(|(db_identifier, kind, stack_name)| {
                let status = match &maintenance {
                    None => MaintenanceStatus::Unknown,
                    Some(map) => match map.get(&kind.maintenance_key(&db_identifier)) {
                        Some(true) => MaintenanceStatus::Pending,
                        _ => MaintenanceStatus::None,
                    },
                };
                ManagedDatabase {
                    db_identifier,
                    kind,
                    stack_name,
                    maintenance: status,
                }
            })
            .collect();

        Ok(ManagedDatabaseList { databases })
    }

    async fn maintenance_for(
        &self,
        entries: &[(String, DatabaseKind, String)],
    ) -> Result<MaintenanceMap> {
        let mut clusters = Vec::new();
        let mut instances = Vec::new();
        for (db_identifier, kind, _) in entries {
            match kind {
                DatabaseKind::Cluster => clusters.push(db_identifier.clone()),
                DatabaseKind::Instance => instances.push(db_identifier.clone()),
            }
        }

        let members = self.classifier.resolve_cluster_members(&clusters).await?;

        self.maintenance
            .compute(&clusters, &instances, &members)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{stacks_mock, template_with};
    use super::*;
    use crate::aws::rds::{ClusterMembersPage, MaintenancePage, MockRdsOperations};
    use ktnh_common::metadata::ManagedMetadata;

    fn managed(db: &str, kind: DatabaseKind) -> String {
        template_with(&ManagedMetadata::new(db, kind))
    }

    #[tokio::test]
    async fn lists_with_maintenance() {
        let stacks = stacks_mock(vec![
            ("ktnh-standalone-aaaaaa", managed("standalone-1", DatabaseKind::Instance)),
            ("ktnh-parent-clu-bbbbbb", managed("parent-cluster-3", DatabaseKind::Cluster)),
            ("ktnh-quiet-db-cccccc", managed("quiet-db", DatabaseKind::Instance)),
            ("other-stack", managed("ignored", DatabaseKind::Instance)),
        ]);

        let mut rds = MockRdsOperations::new();
        rds.expect_describe_cluster_members_page()
            .withf(|ids, _| ids == ["parent-cluster-3".to_string()])
            .returning(|_, _| {
                Ok(ClusterMembersPage {
                    clusters: vec![(
                        "parent-cluster-3".into(),
                        vec!["member-instance-3a".into(), "member-instance-3b".into()],
                    )],
                    marker: None,
                })
            });
        rds.expect_describe_pending_maintenance_page()
            .returning(|_, _, _| {
                Ok(MaintenancePage {
                    resource_identifiers: vec![
                        "arn:aws:rds:ap-northeast-1:123456789012:db:member-instance-3b".into(),
                        "arn:aws:rds:ap-northeast-1:123456789012:db:standalone-1".into(),
                    ],
                    marker: None,
                })
            });

        let controller = LifecycleController::new(stacks, rds, "ktnh");
        let list = controller.list().await.unwrap();

        assert_eq!(
            list.rows(),
            vec![
                vec!["standalone-1", "rds", "ktnh-standalone-aaaaaa", "pending"],
                vec!["parent-cluster-3", "aurora", "ktnh-parent-clu-bbbbbb", "pending"],
                vec!["quiet-db", "rds", "ktnh-quiet-db-cccccc", "none"],
            ]
        );
    }

    #[tokio::test]
    async fn foreign_generator_is_excluded() {
        let mut foreign = ManagedMetadata::new("theirs", DatabaseKind::Instance);
        foreign.generator = "someone-else".to_string();

        let stacks = stacks_mock(vec![
            ("ktnh-theirs-aaaaaa", template_with(&foreign)),
            ("ktnh-mine-bbbbbb", managed("mine", DatabaseKind::Instance)),
        ]);

        let mut rds = MockRdsOperations::new();
        rds.expect_describe_cluster_members_page().never();
        rds.expect_describe_pending_maintenance_page()
            .withf(|clusters, instances, _| clusters.is_empty() && instances == ["mine".to_string()])
            .returning(|_, _, _| {
                Ok(MaintenancePage {
                    resource_identifiers: vec![],
                    marker: None,
                })
            });

        let list = LifecycleController::new(stacks, rds, "ktnh").list().await.unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list.databases[0].db_identifier, "mine");
        assert_eq!(list.databases[0].maintenance, MaintenanceStatus::None);
    }

    #[tokio::test]
    async fn maintenance_failure_marks_all_unknown() {
        let stacks = stacks_mock(vec![
            ("ktnh-a-aaaaaa", managed("a", DatabaseKind::Instance)),
            ("ktnh-b-bbbbbb", managed("b", DatabaseKind::Cluster)),
        ]);

        let mut rds = MockRdsOperations::new();
        rds.expect_describe_cluster_members_page()
            .returning(|_, _| Err(anyhow::anyhow!("AccessDenied")));
        rds.expect_describe_pending_maintenance_page().never();

        let list = LifecycleController::new(stacks, rds, "ktnh").list().await.unwrap();

        assert_eq!(list.len(), 2);
        assert!(
            list.databases
                .iter()
                .all(|db| db.maintenance == MaintenanceStatus::Unknown)
        );
        assert_eq!(list.rows()[0][3], "(unknown)");
    }

    #[tokio::test]
    async fn unknown_db_type_is_skipped() {
        let mut odd = ManagedMetadata::new("odd", DatabaseKind::Instance);
        odd.db_type = "docdb".to_string();

        let stacks = stacks_mock(vec![("ktnh-odd-aaaaaa", template_with(&odd))]);

        let mut rds = MockRdsOperations::new();
        rds.expect_describe_pending_maintenance_page().never();

        let list = LifecycleController::new(stacks, rds, "ktnh").list().await.unwrap();

        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn listing_failure_is_an_error() {
        let mut stacks = crate::aws::cloudformation::MockStackOperations::new();
        stacks
            .expect_list_stacks_page()
            .returning(|_, _| Err(anyhow::anyhow!("ExpiredToken")));

        let err = LifecycleController::new(stacks, MockRdsOperations::new(), "ktnh")
            .list()
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("ExpiredToken"));
    }

    #[test]
    fn headers_and_status_strings() {
        assert_eq!(
            ManagedDatabaseList::default().headers(),
            vec!["id", "type", "stack", "maintenance"]
        );
        assert_eq!(MaintenanceStatus::Pending.to_string(), "pending");
        assert_eq!(MaintenanceStatus::None.to_string(), "none");
        assert_eq!(MaintenanceStatus::Unknown.to_string(), "(unknown)");
    }
}
