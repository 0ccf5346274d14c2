//! Tests for configuration validation

use prometheus_condo::config::{CoordinatorConfig, ExecutorConfig, WorkerPoolConfig};
use std::time::Duration;

#[test]
fn test_coordinator_config_defaults() {
    let cfg = CoordinatorConfig::default();
    assert_eq!(cfg.wait_timeout(), None);
    assert_eq!(cfg.executor, ExecutorConfig::Shared);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_coordinator_config_invalid_timeout() {
    let invalid = CoordinatorConfig {
        wait_timeout_ms: Some(0),
        executor: ExecutorConfig::Inline,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_coordinator_config_invalid_pool() {
    let invalid = CoordinatorConfig {
        wait_timeout_ms: None,
        executor: ExecutorConfig::ThreadPool(WorkerPoolConfig::new().with_worker_count(0)),
    };
    let err = invalid.validate().unwrap_err();
    assert!(err.contains("worker_count"));
}

#[test]
fn test_coordinator_config_from_json() {
    let cfg = CoordinatorConfig::from_json_str(
        r#"{
            "wait_timeout_ms": 1500,
            "executor": { "kind": "thread_pool", "worker_count": 2 }
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.wait_timeout(), Some(Duration::from_millis(1500)));
    match cfg.executor {
        ExecutorConfig::ThreadPool(pool) => {
            assert_eq!(pool.worker_count, 2);
            assert_eq!(pool.max_queue_depth, WorkerPoolConfig::default().max_queue_depth);
        }
        other => panic!("unexpected executor: {other:?}"),
    }
}

#[test]
fn test_coordinator_config_from_json_defaults() {
    let cfg = CoordinatorConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, CoordinatorConfig::default());

    let cfg = CoordinatorConfig::from_json_str(r#"{"executor":{"kind":"inline"}}"#).unwrap();
    assert_eq!(cfg.executor, ExecutorConfig::Inline);
}

#[test]
fn test_coordinator_config_from_json_rejects_invalid() {
    assert!(CoordinatorConfig::from_json_str("not json").is_err());
    assert!(CoordinatorConfig::from_json_str(r#"{"executor":{"kind":"fork"}}"#).is_err());
    assert!(CoordinatorConfig::from_json_str(r#"{"wait_timeout_ms":0}"#).is_err());
}

#[test]
fn test_coordinator_config_serde_roundtrip() {
    let cfg = CoordinatorConfig {
        wait_timeout_ms: Some(42),
        executor: ExecutorConfig::ThreadPool(
            WorkerPoolConfig::new()
                .with_worker_count(3)
                .with_thread_name_prefix("db-writer"),
        ),
    };
    let json = serde_json::to_string(&cfg).unwrap();
    assert!(json.contains(r#""kind":"thread_pool""#));
    assert_eq!(CoordinatorConfig::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn test_worker_pool_config_validation() {
    assert!(WorkerPoolConfig::default().validate().is_ok());
    assert!(WorkerPoolConfig::new().with_max_queue_depth(0).validate().is_err());
    assert!(WorkerPoolConfig::new().with_thread_name_prefix("").validate().is_err());
    assert!(WorkerPoolConfig::new()
        .with_thread_stack_size(64 * 1024)
        .validate()
        .is_ok());
}
