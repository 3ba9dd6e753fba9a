//! Freeze, list and defrost against an in-memory account
//!
//! Run with:
//! ```
//! cargo test --test lifecycle_roundtrip
//! ```

mod test_utils;

use ktnh::error::LifecycleError;
use ktnh::lifecycle::{LifecycleController, MaintenanceStatus};
use ktnh_common::DatabaseKind;
use ktnh_common::metadata::ManagedMetadata;
use ktnh_common::naming::Qualifier;
use ktnh_common::template::generate_template_body;
use std::time::Duration;
use test_utils::FakeAccount;

const WAIT: Duration = Duration::from_secs(60);

fn controller(account: &FakeAccount) -> LifecycleController<FakeAccount, FakeAccount> {
    LifecycleController::new(account.clone(), account.clone(), "ktnh")
}

#[tokio::test]
async fn freeze_then_defrost_instance() {
    let account = FakeAccount::new().with_instance("orders-db-primary", "postgres");
    let controller = controller(&account);

    assert_eq!(controller.find_matching_stack("orders-db-primary").await.unwrap(), None);

    let generated = controller.template("orders-db-primary").await.unwrap();
    assert_eq!(generated.kind, DatabaseKind::Instance);

    let stack_name = controller
        .freeze("orders-db-primary", &generated.body, &generated.qualifier, WAIT)
        .await
        .unwrap();
    assert_eq!(stack_name, format!("ktnh-orders-db-p-{}", *generated.qualifier));

    assert_eq!(
        controller.find_matching_stack("orders-db-primary").await.unwrap(),
        Some(stack_name.clone())
    );

    let defrosted = controller.defrost("orders-db-primary", WAIT).await.unwrap();
    assert_eq!(defrosted, stack_name);

    assert_eq!(controller.find_matching_stack("orders-db-primary").await.unwrap(), None);
    assert!(account.stack_names().is_empty());
}

#[tokio::test]
async fn second_freeze_is_refused() {
    let account = FakeAccount::new().with_cluster("analytics", "aurora-mysql", &["analytics-1"]);
    let controller = controller(&account);

    let first = controller.template("analytics").await.unwrap();
    controller
        .freeze("analytics", &first.body, &first.qualifier, Duration::ZERO)
        .await
        .unwrap();

    let second = controller.template("analytics").await.unwrap();
    let err = controller
        .freeze("analytics", &second.body, &second.qualifier, Duration::ZERO)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::AlreadyFrozen { db_identifier, .. }) if db_identifier == "analytics"
    ));
    assert_eq!(account.stack_names().len(), 1);
}

#[tokio::test]
async fn defrost_without_freeze_fails() {
    let account = FakeAccount::new().with_instance("idle", "mysql");

    let err = controller(&account).defrost("idle", WAIT).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::NotFrozen { .. })
    ));
}

#[tokio::test]
async fn list_spans_pages_and_folds_member_maintenance() {
    let account = FakeAccount::new()
        .with_cluster("parent-cluster-3", "aurora-postgresql", &["member-instance-3a", "member-instance-3b"])
        .with_instance("standalone-1", "mysql")
        .with_instance("standalone-2", "mariadb")
        .with_pending("db", "member-instance-3b")
        .with_pending("db", "not-managed")
        .with_stack("unrelated-stack", "Resources: {}\n");
    let controller = controller(&account);

    for db in ["parent-cluster-3", "standalone-1", "standalone-2"] {
        let generated = controller.template(db).await.unwrap();
        controller
            .freeze(db, &generated.body, &generated.qualifier, Duration::ZERO)
            .await
            .unwrap();
    }

    let list = controller.list().await.unwrap();
    let summary: Vec<(String, DatabaseKind, MaintenanceStatus)> = list
        .databases
        .iter()
        .map(|db| (db.db_identifier.clone(), db.kind, db.maintenance))
        .collect();

    assert_eq!(
        summary,
        vec![
            ("parent-cluster-3".to_string(), DatabaseKind::Cluster, MaintenanceStatus::Pending),
            ("standalone-1".to_string(), DatabaseKind::Instance, MaintenanceStatus::None),
            ("standalone-2".to_string(), DatabaseKind::Instance, MaintenanceStatus::None),
        ]
    );
}

#[tokio::test]
async fn colliding_short_identifiers_are_kept_apart() {
    let account = FakeAccount::new()
        .with_instance("db-1-1234567890", "mysql")
        .with_instance("db-1-12345zzzzz", "mysql");
    let controller = controller(&account);

    // Stack for the second database, under the same short identifier
    let other = generate_template_body(
        "db-1-12345zzzzz",
        "db-1-12345",
        DatabaseKind::Instance,
        "abcdef",
    );
    controller
        .freeze("db-1-12345zzzzz", &other, &Qualifier::from("abcdef"), Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(controller.find_matching_stack("db-1-1234567890").await.unwrap(), None);

    let metadata = controller
        .registry()
        .get_metadata("ktnh-db-1-12345-abcdef")
        .await
        .unwrap();
    assert_eq!(metadata, ManagedMetadata::new("db-1-12345zzzzz", DatabaseKind::Instance));
}
