//! End-to-end reconciliation passes against the in-memory admin store

use pretty_assertions::assert_eq;
use proxysql_cfgmgr_common::{CfgMgr, CfgMgrError, FailurePolicy, RunMode};
use proxysql_cfgmgr_test::{
    catalog_yaml, topologies, FakeAdminStore, ResourceSpec, StatementVerifier, StoredRow,
    TableVerifier,
};
use proxysql_replhgmgrd::{
    Catalog, HostgroupKey, ReplicationHostgroup, ReplicationHostgroupMgr, Repository,
};

fn catalog(entries: &[ResourceSpec]) -> Vec<ReplicationHostgroup> {
    Catalog::from_yaml(&catalog_yaml(entries))
        .expect("fixture catalog parses")
        .replication_hostgroups
}

/// Desired pair absent from the store is created once and exists afterwards
#[tokio::test]
async fn test_create_missing_pair() {
    let mgr = ReplicationHostgroupMgr::new(FakeAdminStore::new());
    let desired = catalog(&[ResourceSpec::present(10, 11).with_comment("primary")]);

    let report = mgr.reconcile_pass(&desired).await.unwrap();

    let writes = StatementVerifier::writes_of(mgr.session());
    writes.assert_count(1).unwrap();
    writes.assert_executed("VALUES (10, 11, 'primary')").unwrap();
    let outcome = report.outcome("10-11").unwrap();
    assert!(outcome.result.as_ref().unwrap().exists());
    TableVerifier::new(mgr.session())
        .assert_comment(10, 11, "primary")
        .unwrap();
}

/// Pair declared absent is deleted by key and no longer discoverable
#[tokio::test]
async fn test_destroy_declared_absent() {
    let store = FakeAdminStore::with_rows([StoredRow::new(10, 11, "primary")]);
    let mgr = ReplicationHostgroupMgr::new(store);
    let desired = catalog(&[ResourceSpec::absent(10, 11)]);

    mgr.reconcile_pass(&desired).await.unwrap();

    let writes = StatementVerifier::writes_of(mgr.session());
    writes.assert_count(1).unwrap();
    writes
        .assert_executed("WHERE `writer_hostgroup` = 10 AND `reader_hostgroup` = 11")
        .unwrap();
    let repo = mgr.discover().await.unwrap();
    assert!(repo.get(HostgroupKey::new(10, 11)).is_none());
}

/// A second pass over an unchanged catalog issues no writes at all
#[tokio::test]
async fn test_second_pass_is_idempotent() {
    let mgr = ReplicationHostgroupMgr::new(FakeAdminStore::new());
    let mut entries = topologies::three_clusters();
    entries.push(ResourceSpec::absent(40, 41));
    entries.push(ResourceSpec::present(50, 51).committed());
    let desired = catalog(&entries);

    let first = mgr.reconcile_pass(&desired).await.unwrap();
    assert_eq!(first.mutation_count(), 4);

    mgr.session().clear_log();
    let second = mgr.reconcile_pass(&desired).await.unwrap();

    assert_eq!(second.mutation_count(), 0);
    StatementVerifier::writes_of(mgr.session())
        .assert_count(0)
        .unwrap();
}

/// Create followed by destroy leaves nothing behind
#[tokio::test]
async fn test_create_destroy_round_trip() {
    let mgr = ReplicationHostgroupMgr::new(FakeAdminStore::new());
    let mut cache = Repository::default();
    let key = HostgroupKey::new(10, 11);

    assert!(mgr.create(&mut cache, key, Some("x")).await.unwrap().exists());
    assert!(!mgr.destroy(&mut cache, key).await.unwrap().exists());

    assert!(mgr.discover().await.unwrap().get(key).is_none());
    TableVerifier::new(mgr.session())
        .assert_row_absent(10, 11)
        .unwrap();
}

/// Pairs the catalog does not mention survive every pass
#[tokio::test]
async fn test_undeclared_pairs_are_never_purged() {
    let store = FakeAdminStore::with_rows([
        StoredRow::new(10, 11, "managed"),
        StoredRow::new(90, 91, "hand-made"),
    ]);
    let mgr = ReplicationHostgroupMgr::new(store);
    let desired = catalog(&[ResourceSpec::absent(10, 11).committed()]);

    mgr.reconcile_pass(&desired).await.unwrap();

    let table = TableVerifier::new(mgr.session());
    table.assert_row_absent(10, 11).unwrap();
    table.assert_comment(90, 91, "hand-made").unwrap();
    StatementVerifier::writes_of(mgr.session())
        .assert_not_executed("= 90")
        .unwrap();
}

/// Omitted comment is stored as the empty string
#[tokio::test]
async fn test_default_comment_is_empty() {
    let mgr = ReplicationHostgroupMgr::new(FakeAdminStore::new());
    let desired = catalog(&[ResourceSpec::present(10, 11)]);

    mgr.reconcile_pass(&desired).await.unwrap();

    let repo = mgr.discover().await.unwrap();
    assert_eq!(repo.get(HostgroupKey::new(10, 11)).unwrap().comment, "");
}

/// Activation precedes persistence and both follow every mutation
#[tokio::test]
async fn test_commit_runs_once_after_mutations() {
    let mgr = ReplicationHostgroupMgr::new(FakeAdminStore::new());
    let desired = catalog(&[
        ResourceSpec::present(10, 11).committed(),
        ResourceSpec::present(20, 21).committed(),
        ResourceSpec::present(30, 31).with_load_to_runtime(),
    ]);

    let report = mgr.reconcile_pass(&desired).await.unwrap();

    assert!(report.commit.activated);
    assert!(report.commit.persisted);
    let writes = StatementVerifier::writes_of(mgr.session());
    writes.assert_count(5).unwrap();
    writes.assert_order("INSERT", "LOAD MYSQL SERVERS TO RUNTIME").unwrap();
    writes
        .assert_order("LOAD MYSQL SERVERS TO RUNTIME", "SAVE MYSQL SERVERS TO DISK")
        .unwrap();
    assert_eq!(
        mgr.session().disk_rows().map(|rows| rows.len()),
        Some(3)
    );
}

/// Commit flags only count for resources that actually changed
#[tokio::test]
async fn test_commit_not_requested_without_changes() {
    let store = FakeAdminStore::with_rows([StoredRow::new(10, 11, "primary")]);
    let mgr = ReplicationHostgroupMgr::new(store);
    let desired = catalog(&topologies::single_cluster());

    let report = mgr.reconcile_pass(&desired).await.unwrap();

    assert!(!report.commit.activated);
    assert!(mgr.session().runtime_rows().is_none());
}

/// Comment drift is fixed in place
#[tokio::test]
async fn test_comment_update() {
    let store = FakeAdminStore::with_rows([StoredRow::new(10, 11, "old")]);
    let mgr = ReplicationHostgroupMgr::new(store);
    let desired = catalog(&[ResourceSpec::present(10, 11).with_comment("it's new")]);

    mgr.reconcile_pass(&desired).await.unwrap();

    StatementVerifier::writes_of(mgr.session())
        .assert_executed("SET `comment` = 'it\\'s new'")
        .unwrap();
    TableVerifier::new(mgr.session())
        .assert_comment(10, 11, "it's new")
        .unwrap();
}

/// Comments with tabs and newlines survive the batch-mode round trip
#[tokio::test]
async fn test_comment_with_control_characters() {
    let mgr = ReplicationHostgroupMgr::new(FakeAdminStore::new());
    let desired = catalog(&[ResourceSpec::present(10, 11).with_comment("dc1\tprimary\nrack 4")]);

    mgr.reconcile_pass(&desired).await.unwrap();
    mgr.session().clear_log();
    let second = mgr.reconcile_pass(&desired).await.unwrap();

    assert_eq!(second.mutation_count(), 0);
}

/// Changing half of the key of an existing resource is refused up front
#[tokio::test]
async fn test_key_change_rejected() {
    let store = FakeAdminStore::with_rows([StoredRow::new(10, 11, "primary")]);
    let mgr = ReplicationHostgroupMgr::new(store);
    let desired = catalog(&[ResourceSpec::present(10, 12).with_name("10-11")]);

    let err = mgr.reconcile_pass(&desired).await.unwrap_err();

    match err.root() {
        CfgMgrError::UnsupportedMutation { field, .. } => assert_eq!(field, "reader_hostgroup"),
        other => panic!("Expected UnsupportedMutation, got {:?}", other),
    }
    StatementVerifier::writes_of(mgr.session())
        .assert_count(0)
        .unwrap();
    TableVerifier::new(mgr.session())
        .assert_comment(10, 11, "primary")
        .unwrap();
}

/// Store constraint violations surface as command failures for that resource
#[tokio::test]
async fn test_store_constraint_failure_continue() {
    let store = FakeAdminStore::with_rows([StoredRow::new(10, 11, "")]);
    let mgr = ReplicationHostgroupMgr::new(store).with_failure_policy(FailurePolicy::Continue);
    let desired = catalog(&[
        ResourceSpec::present(12, 11).with_load_to_runtime(),
        ResourceSpec::present(20, 21),
    ]);

    let report = mgr.reconcile_pass(&desired).await.unwrap();

    let failed: Vec<&str> = report.failures().map(|o| o.name.as_str()).collect();
    assert_eq!(failed, vec!["12-11"]);
    let err = report.outcome("12-11").unwrap().result.as_ref().unwrap_err();
    assert!(err.to_string().contains("failed to create"));
    assert!(matches!(err.root(), CfgMgrError::CommandFailed { .. }));
    TableVerifier::new(mgr.session())
        .assert_row_exists(20, 21)
        .unwrap();
    assert!(!report.commit.activated);
}

/// A failed activation under Continue still reports every resource outcome
#[tokio::test]
async fn test_activation_failure_continue_keeps_outcomes() {
    let store = FakeAdminStore::with_rows([StoredRow::new(10, 11, "")]).fail_on("LOAD");
    let mgr = ReplicationHostgroupMgr::new(store).with_failure_policy(FailurePolicy::Continue);
    let desired = catalog(&[
        ResourceSpec::present(12, 11).committed(),
        ResourceSpec::present(20, 21).committed(),
    ]);

    let report = mgr.reconcile_pass(&desired).await.unwrap();

    assert!(report.has_failures());
    let failed: Vec<&str> = report.failures().map(|o| o.name.as_str()).collect();
    assert_eq!(failed, vec!["12-11"]);
    let err = report.outcome("12-11").unwrap().result.as_ref().unwrap_err();
    assert!(err.to_string().contains("'12-11' failed to create"));
    assert!(report.outcome("20-21").unwrap().result.as_ref().unwrap().exists());

    let commit_err = report.commit_error.as_ref().unwrap();
    assert!(commit_err.to_string().contains("failed to activate"));
    assert!(!report.commit.activated);
    assert!(!report.commit.persisted);
    StatementVerifier::writes_of(mgr.session())
        .assert_not_executed("SAVE")
        .unwrap();
    assert!(mgr.session().runtime_rows().is_none());
}

/// Earlier successful statements are not rolled back when a later one fails
#[tokio::test]
async fn test_abort_keeps_prior_statements() {
    let store = FakeAdminStore::with_rows([StoredRow::new(20, 21, "old")]).fail_on("UPDATE");
    let mgr = ReplicationHostgroupMgr::new(store);
    let desired = catalog(&[
        ResourceSpec::present(10, 11).committed(),
        ResourceSpec::present(20, 21).with_comment("new").committed(),
        ResourceSpec::present(30, 31).committed(),
    ]);

    let err = mgr.reconcile_pass(&desired).await.unwrap_err();

    assert!(err.to_string().contains("'20-21' failed to update"));
    let table = TableVerifier::new(mgr.session());
    table.assert_row_exists(10, 11).unwrap();
    table.assert_row_absent(30, 31).unwrap();
    StatementVerifier::writes_of(mgr.session())
        .assert_not_executed("LOAD")
        .unwrap();
}

/// Malformed discovery output aborts before anything is written
#[tokio::test]
async fn test_malformed_discovery_aborts_pass() {
    let store = FakeAdminStore::new().with_raw_discovery("10\t11\tok\n20\t21\n");
    let mgr = ReplicationHostgroupMgr::new(store).with_failure_policy(FailurePolicy::Continue);
    let desired = catalog(&[ResourceSpec::present(30, 31)]);

    let err = mgr.reconcile_pass(&desired).await.unwrap_err();

    assert!(matches!(err.root(), CfgMgrError::Parse { line: 2, .. }));
    StatementVerifier::writes_of(mgr.session())
        .assert_count(0)
        .unwrap();
}

/// Noop mode plans without writing
#[tokio::test]
async fn test_noop_pass() {
    let store = FakeAdminStore::with_rows([StoredRow::new(10, 11, "primary")]);
    let mgr = ReplicationHostgroupMgr::new(store).with_run_mode(RunMode::Noop);
    let desired = catalog(&[
        ResourceSpec::absent(10, 11).committed(),
        ResourceSpec::present(20, 21).committed(),
    ]);

    let report = mgr.reconcile_pass(&desired).await.unwrap();

    assert_eq!(report.mutation_count(), 0);
    StatementVerifier::writes_of(mgr.session())
        .assert_count(0)
        .unwrap();
    TableVerifier::new(mgr.session())
        .assert_row_exists(10, 11)
        .unwrap();
}

/// The trait entry point runs the same pass
#[tokio::test]
async fn test_cfgmgr_reconcile() {
    let mut mgr = ReplicationHostgroupMgr::new(FakeAdminStore::new());
    let desired = catalog(&topologies::single_cluster());

    let report = mgr.reconcile(&desired).await.unwrap();

    assert_eq!(report.mutation_count(), 1);
    assert_eq!(
        mgr.session().disk_rows(),
        Some(vec![StoredRow::new(10, 11, "primary")])
    );
}
