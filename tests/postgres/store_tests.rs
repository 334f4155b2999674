//! Revision compare-and-swap on `PostgresTaskStore`.

use super::helpers::{TestDatabase, draft, test_runtime};
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;
use tracker::task::{
    adapters::postgres::PostgresTaskStore,
    domain::{TaskName, TaskPatch, TaskStatus, VersionToken},
    ports::{TaskStore, TaskStoreError},
};

#[rstest]
fn insert_then_get_returns_first_revision(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "store_insert");
    let store = PostgresTaskStore::new(db.pool());
    let rt = test_runtime();

    let new_task = draft("Write report");
    let inserted = rt.block_on(store.insert(&new_task)).expect("insert");
    let fetched = rt.block_on(store.get(new_task.key())).expect("get");

    assert_eq!(inserted.version(), &VersionToken::from_revision(1));
    assert_eq!(fetched, inserted);
    assert_eq!(fetched.name(), new_task.name());
    assert_eq!(fetched.due_date(), new_task.due_date());
    assert_eq!(fetched.status(), TaskStatus::ToDo);
}

#[rstest]
fn duplicate_insert_is_already_exists(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "store_duplicate");
    let store = PostgresTaskStore::new(db.pool());
    let rt = test_runtime();

    let new_task = draft("Write report");
    let original = rt.block_on(store.insert(&new_task)).expect("first insert");
    let renamed = new_task.clone().apply(
        &TaskPatch::new().with_name(TaskName::new("Other").expect("name")),
    );
    let result = rt.block_on(store.insert(&renamed));

    assert!(
        matches!(result, Err(TaskStoreError::AlreadyExists(ref key)) if key == new_task.key()),
        "expected AlreadyExists, got {result:?}"
    );
    let stored = rt.block_on(store.get(new_task.key())).expect("get");
    assert_eq!(stored, original);
}

#[rstest]
fn update_with_current_version_advances_revision(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "store_update");
    let store = PostgresTaskStore::new(db.pool());
    let rt = test_runtime();

    let created = rt.block_on(store.insert(&draft("Write report"))).expect("insert");
    let changed = created
        .clone()
        .into_draft()
        .apply(&TaskPatch::new().with_status(TaskStatus::Done));
    let updated = rt
        .block_on(store.update_if_version_matches(&changed, created.version()))
        .expect("update");

    assert_eq!(updated.version(), &VersionToken::from_revision(2));
    assert_ne!(updated.version(), created.version());
    assert_eq!(updated.status(), TaskStatus::Done);
    assert_eq!(
        rt.block_on(store.get(created.key())).expect("get"),
        updated
    );
}

#[rstest]
fn stale_version_update_conflicts_and_leaves_record(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "store_stale_update");
    let store = PostgresTaskStore::new(db.pool());
    let rt = test_runtime();

    let created = rt.block_on(store.insert(&draft("Write report"))).expect("insert");
    let first = created
        .clone()
        .into_draft()
        .apply(&TaskPatch::new().with_status(TaskStatus::InProgress));
    let winner = rt
        .block_on(store.update_if_version_matches(&first, created.version()))
        .expect("first update");

    let second = created
        .clone()
        .into_draft()
        .apply(&TaskPatch::new().with_status(TaskStatus::Done));
    let result = rt.block_on(store.update_if_version_matches(&second, created.version()));

    assert!(
        matches!(
            result,
            Err(TaskStoreError::ConcurrencyConflict { ref key, ref expected })
                if key == created.key() && expected == created.version()
        ),
        "expected ConcurrencyConflict, got {result:?}"
    );
    let stored = rt.block_on(store.get(created.key())).expect("get");
    assert_eq!(stored, winner);
    assert_eq!(stored.status(), TaskStatus::InProgress);
}

#[rstest]
#[case::revision_token(r#"W/"1""#)]
#[case::foreign_token("0x8DC1F2A")]
fn update_of_missing_row_is_not_found(
    shared_test_cluster: &'static TestCluster,
    #[case] token: &str,
) {
    let db = TestDatabase::create(shared_test_cluster, "store_update_missing");
    let store = PostgresTaskStore::new(db.pool());
    let rt = test_runtime();

    let absent = draft("Never stored");
    let result = rt.block_on(store.update_if_version_matches(&absent, &VersionToken::new(token)));

    assert!(
        matches!(result, Err(TaskStoreError::NotFound(ref key)) if key == absent.key()),
        "expected NotFound, got {result:?}"
    );
    assert!(matches!(
        rt.block_on(store.get(absent.key())),
        Err(TaskStoreError::NotFound(_))
    ));
}

#[rstest]
fn delete_of_missing_row_is_not_found(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "store_delete_missing");
    let store = PostgresTaskStore::new(db.pool());
    let rt = test_runtime();

    let absent = draft("Never stored");
    let result = rt.block_on(store.delete(absent.key(), &VersionToken::from_revision(1)));

    assert!(
        matches!(result, Err(TaskStoreError::NotFound(ref key)) if key == absent.key()),
        "expected NotFound, got {result:?}"
    );
}

#[rstest]
#[case::older_revision(r#"W/"1""#)]
#[case::foreign_token("0x8DC1F2A")]
fn stale_version_delete_conflicts_and_keeps_row(
    shared_test_cluster: &'static TestCluster,
    #[case] stale: &str,
) {
    let db = TestDatabase::create(shared_test_cluster, "store_stale_delete");
    let store = PostgresTaskStore::new(db.pool());
    let rt = test_runtime();

    let created = rt.block_on(store.insert(&draft("Write report"))).expect("insert");
    let changed = created
        .clone()
        .into_draft()
        .apply(&TaskPatch::new().with_status(TaskStatus::Done));
    let current = rt
        .block_on(store.update_if_version_matches(&changed, created.version()))
        .expect("update");

    let result = rt.block_on(store.delete(created.key(), &VersionToken::new(stale)));

    assert!(
        matches!(result, Err(TaskStoreError::ConcurrencyConflict { .. })),
        "expected ConcurrencyConflict, got {result:?}"
    );
    assert_eq!(rt.block_on(store.get(created.key())).expect("get"), current);
}

#[rstest]
fn delete_with_current_version_removes_row(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "store_delete");
    let store = PostgresTaskStore::new(db.pool());
    let rt = test_runtime();

    let created = rt.block_on(store.insert(&draft("Write report"))).expect("insert");
    rt.block_on(store.delete(created.key(), created.version()))
        .expect("delete");

    assert!(matches!(
        rt.block_on(store.get(created.key())),
        Err(TaskStoreError::NotFound(_))
    ));
    assert!(matches!(
        rt.block_on(store.delete(created.key(), created.version())),
        Err(TaskStoreError::NotFound(_))
    ));
}
