use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use mmg_queues::deploy::{ConfigDiscovery, Deployer};
use mmg_queues::prelude::*;

#[mmg_queues::receiver]
struct OrderCreatedHandler;

#[mmg_queues::receiver]
struct JobRunner;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn write_source(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

fn manager_for(root: &Path, cfg: AppConfig) -> QueueManager {
    QueueManager::new(Application::new("shop", root).unwrap(), cfg)
}

#[test]
fn single_source_registers_queue_and_binding() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_source(
        dir.path(),
        "META-INF/message-queues.json",
        r#"{"message-queues": [{"type": "OrderCreatedHandler", "destination": "orders/created"}]}"#,
    );
    let mgr = manager_for(dir.path(), AppConfig::default());
    let report = mgr.initialize().unwrap();
    assert!(report.is_clean());
    assert_eq!(report.registered(), 1);

    let queues = mgr.get_queues();
    assert_eq!(queues["orders/created"].receiver_type(), "OrderCreatedHandler");

    let orders = mgr.naming().lookup(mgr.naming().root(), "orders").expect("orders node");
    assert_eq!(mgr.naming().bindings_at(orders), vec!["orders/created".to_string()]);

    let sender = mgr.naming().binding("orders/created").unwrap().resolve(None).unwrap();
    assert_eq!(sender.queue().name(), "orders/created");
    assert_eq!(sender.connection().app, "shop");
}

#[test]
fn invalid_source_is_isolated() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    // 缺少根元素 message-queues
    write_source(
        dir.path(),
        "META-INF/message-queues.json",
        r#"{"queues": [{"type": "OrderCreatedHandler", "destination": "orders/created"}]}"#,
    );
    write_source(
        dir.path(),
        "WEB-INF/message-queues.json",
        r#"{"message-queues": [{"type": "JobRunner", "destination": "jobs/run"}]}"#,
    );
    let mgr = manager_for(dir.path(), AppConfig::default());
    let report = mgr.initialize().unwrap();

    assert!(mgr.has_queue("jobs/run"));
    assert!(!mgr.has_queue("orders/created"));
    assert_eq!(mgr.get_queues().len(), 1);
    assert!(mgr.naming().find("orders").is_none());

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0], DeploymentError::InvalidConfiguration { .. }));
    assert!(failures[0].path().ends_with("META-INF/message-queues.json"));
}

#[test]
fn every_definition_of_every_valid_source_is_registered() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_source(
        dir.path(),
        "META-INF/message-queues.json",
        r#"{"message-queues": [
            {"type": "OrderCreatedHandler", "destination": "orders/created"},
            {"type": "OrderCreatedHandler", "destination": "orders/cancelled"},
            {"type": "JobRunner", "destination": "jobs"}
        ]}"#,
    );
    write_source(
        dir.path(),
        "WEB-INF/message-queues.json",
        r#"{"message-queues": [{"type": "JobRunner", "destination": "jobs/run/nightly"}]}"#,
    );
    let mgr = manager_for(dir.path(), AppConfig::default());
    let report = mgr.initialize().unwrap();
    assert_eq!(report.sources.len(), 2);
    assert_eq!(report.registered(), 4);
    for name in ["orders/created", "orders/cancelled", "jobs", "jobs/run/nightly"] {
        assert!(mgr.has_queue(name), "{name} missing");
        assert!(mgr.naming().binding(name).is_some(), "{name} unbound");
    }
    // root + orders + jobs + jobs/run
    assert_eq!(mgr.naming().len(), 4);
}

#[test]
fn missing_root_and_empty_sources_are_no_ops() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mgr = manager_for(&dir.path().join("does-not-exist"), AppConfig::default());
    let report = mgr.initialize().unwrap();
    assert!(report.sources.is_empty());

    write_source(dir.path(), "META-INF/message-queues.json", r#"{"message-queues": []}"#);
    let mgr = manager_for(dir.path(), AppConfig::default());
    let report = mgr.initialize().unwrap();
    assert_eq!(report.sources.len(), 1);
    assert!(report.is_clean());
    assert!(mgr.get_queues().is_empty());
}

#[test]
fn bad_destination_rejects_whole_source() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_source(
        dir.path(),
        "META-INF/message-queues.json",
        r#"{"message-queues": [
            {"type": "JobRunner", "destination": "jobs/ok"},
            {"type": "JobRunner", "destination": "jobs//broken"}
        ]}"#,
    );
    let mgr = manager_for(dir.path(), AppConfig::default());
    let report = mgr.initialize().unwrap();
    assert!(matches!(
        report.failures().next(),
        Some(DeploymentError::InvalidDefinition { .. })
    ));
    assert!(!mgr.has_queue("jobs/ok"));
    assert_eq!(mgr.naming().len(), 1);
}

#[test]
fn malformed_json_fails_validation() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path(), "META-INF/message-queues.json", "{ not json");
    write_source(
        dir.path(),
        "WEB-INF/message-queues.json",
        r#"{"message-queues": [{"type": "", "destination": "x/y"}]}"#,
    );
    let mgr = manager_for(dir.path(), AppConfig::default());
    let report = mgr.initialize().unwrap();
    assert_eq!(report.failures().count(), 2);
    assert!(report
        .failures()
        .all(|e| matches!(e, DeploymentError::InvalidConfiguration { .. })));
    assert!(mgr.get_queues().is_empty());
}

#[test]
fn duplicates_overwrite_by_default() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_source(
        dir.path(),
        "META-INF/message-queues.json",
        r#"{"message-queues": [{"type": "OrderCreatedHandler", "destination": "work"}]}"#,
    );
    write_source(
        dir.path(),
        "WEB-INF/message-queues.json",
        r#"{"message-queues": [{"type": "JobRunner", "destination": "work"}]}"#,
    );
    let mgr = manager_for(dir.path(), AppConfig::default());
    mgr.initialize().unwrap();
    // META-INF 先于 WEB-INF 处理，后写覆盖
    assert_eq!(mgr.get_queues()["work"].receiver_type(), "JobRunner");
    assert_eq!(mgr.get_queues().len(), 1);
}

#[test]
fn keep_first_policy_ignores_later_duplicates() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_source(
        dir.path(),
        "META-INF/message-queues.json",
        r#"{"message-queues": [{"type": "OrderCreatedHandler", "destination": "work"}]}"#,
    );
    write_source(
        dir.path(),
        "WEB-INF/message-queues.json",
        r#"{"message-queues": [{"type": "JobRunner", "destination": "work"}]}"#,
    );
    let cfg = AppConfig {
        duplicate_policy: DuplicatePolicy::KeepFirst,
        ..Default::default()
    };
    let mgr = manager_for(dir.path(), cfg);
    let report = mgr.initialize().unwrap();
    assert_eq!(mgr.get_queues()["work"].receiver_type(), "OrderCreatedHandler");
    assert_eq!(report.registered(), 1);
    assert!(report.is_clean());
}

#[test]
fn strict_receivers_reject_unknown_types() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_source(
        dir.path(),
        "META-INF/message-queues.json",
        r#"{"message-queues": [
            {"type": "JobRunner", "destination": "jobs/run"},
            {"type": "NoSuchHandler", "destination": "jobs/other"}
        ]}"#,
    );
    let lenient = manager_for(dir.path(), AppConfig::default());
    lenient.initialize().unwrap();
    assert!(lenient.has_queue("jobs/other"));

    let cfg = AppConfig {
        strict_receivers: true,
        ..Default::default()
    };
    let strict = manager_for(dir.path(), cfg);
    let report = strict.initialize().unwrap();
    match report.failures().next() {
        Some(DeploymentError::UnknownReceiver { receiver, .. }) => {
            assert_eq!(receiver, "NoSuchHandler")
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!strict.has_queue("jobs/run"));
}

#[test]
fn custom_patterns_use_wildcards() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_source(
        dir.path(),
        "queues/orders.queues.json",
        r#"{"message-queues": [{"type": "OrderCreatedHandler", "destination": "orders/created"}]}"#,
    );
    write_source(
        dir.path(),
        "queues/jobs.queues.json",
        r#"{"message-queues": [{"type": "JobRunner", "destination": "jobs/run"}]}"#,
    );
    write_source(dir.path(), "queues/readme.txt", "not a descriptor");
    let cfg = AppConfig {
        descriptor_patterns: vec!["queues/*.queues.json".to_string()],
        ..Default::default()
    };
    let mgr = manager_for(dir.path(), cfg);
    let report = mgr.initialize().unwrap();
    assert_eq!(report.sources.len(), 2);
    assert!(mgr.has_queue("orders/created") && mgr.has_queue("jobs/run"));
}

#[test]
fn wildcard_matches_non_ascii_file_names() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_source(
        dir.path(),
        "queues/qé.json",
        r#"{"message-queues": [{"type": "JobRunner", "destination": "jobs/accented"}]}"#,
    );
    let cfg = AppConfig {
        descriptor_patterns: vec!["queues/q?.json".to_string()],
        ..Default::default()
    };
    let mgr = manager_for(dir.path(), cfg);
    let report = mgr.initialize().unwrap();
    assert_eq!(report.sources.len(), 1);
    assert!(mgr.has_queue("jobs/accented"));
}

#[test]
fn reinitialize_keeps_tree_shape() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_source(
        dir.path(),
        "META-INF/message-queues.json",
        r#"{"message-queues": [{"type": "JobRunner", "destination": "a/b/x"}, {"type": "JobRunner", "destination": "a/b/y"}]}"#,
    );
    let mgr = manager_for(dir.path(), AppConfig::default());
    mgr.initialize().unwrap();
    let nodes = mgr.naming().len();
    mgr.initialize().unwrap();
    assert_eq!(mgr.naming().len(), nodes);
    assert_eq!(mgr.get_queues().len(), 2);
}

struct BrokenDiscovery;

impl ConfigDiscovery for BrokenDiscovery {
    fn glob_dir(&self, _root: &Path, _patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
        anyhow::bail!("permission denied")
    }
}

#[test]
fn discovery_failure_surfaces_as_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig::default();
    let mgr = manager_for(dir.path(), cfg.clone())
        .with_deployer(Deployer::new(&cfg).with_discovery(Arc::new(BrokenDiscovery)));
    assert!(matches!(mgr.initialize(), Err(QueueError::Discovery { .. })));
}
