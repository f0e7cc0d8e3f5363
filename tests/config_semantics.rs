use mmg_queues::config::{APP_DEFAULT_QUEUE, DEFAULT_DESCRIPTOR_PATTERNS};
use mmg_queues::prelude::*;

#[test]
fn defaults_match_constants() {
    let cfg = AppConfig::default();
    assert_eq!(cfg.queue_capacity, APP_DEFAULT_QUEUE);
    assert_eq!(cfg.descriptor_patterns, DEFAULT_DESCRIPTOR_PATTERNS.to_vec());
    assert_eq!(cfg.duplicate_policy, DuplicatePolicy::Overwrite);
    assert!(!cfg.strict_receivers);
}

#[test]
fn partial_json_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queues.json");
    std::fs::write(
        &path,
        r#"{"duplicate_policy": "keep-first", "strict_receivers": true}"#,
    )
    .unwrap();
    let cfg = AppConfig::from_json_file(&path).unwrap();
    assert_eq!(cfg.duplicate_policy, DuplicatePolicy::KeepFirst);
    assert!(cfg.strict_receivers);
    assert_eq!(cfg.queue_capacity, APP_DEFAULT_QUEUE);
}

#[test]
fn unreadable_or_malformed_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        AppConfig::from_json_file(dir.path().join("missing.json")),
        Err(QueueError::Io(_))
    ));
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"queue_capacity": "lots"}"#).unwrap();
    assert!(matches!(
        AppConfig::from_json_file(&path),
        Err(QueueError::Serialization(_))
    ));
}

#[test]
fn application_requires_a_name() {
    assert!(matches!(
        Application::new("", "/srv/app"),
        Err(QueueError::InvalidApplication(_))
    ));
    let app = Application::new("shop", "/srv/app").unwrap();
    assert_eq!(app.name(), "shop");
    assert_eq!(app.root(), std::path::Path::new("/srv/app"));
}
