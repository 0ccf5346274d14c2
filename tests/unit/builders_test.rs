//! Tests for builder modules

use prometheus_condo::builders::{build_coordinator, CoordinatorBuilder};
use prometheus_condo::config::{CoordinatorConfig, ExecutorConfig, WorkerPoolConfig};
use prometheus_condo::core::{
    Coordinator, CoordinatorError, Executor, InlineExecutor, Predicate,
};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_builder_defaults() {
    let coordinator: Coordinator<u32> = CoordinatorBuilder::new().build();
    assert_eq!(coordinator.wait_timeout(), None);
    assert_eq!(coordinator.stats().active_masks, 0);
}

#[test]
fn test_builder_with_shared_executor() {
    let executor: Arc<dyn Executor> = Arc::new(InlineExecutor);
    let first: Coordinator<u32> = Coordinator::builder()
        .shared_executor(Arc::clone(&executor))
        .wait_timeout(Duration::from_millis(100))
        .build();
    let second: Coordinator<u32> = Coordinator::builder().shared_executor(executor).build();

    let done = first.schedule(1, || Ok("inline"));
    assert_eq!(done.wait().unwrap(), "inline");
    assert_eq!(first.wait_timeout(), Some(Duration::from_millis(100)));

    second.schedule(2, || Ok(()));
    assert_eq!(second.stats().processed, 1);
}

#[test]
fn test_build_coordinator_inline() {
    let cfg = CoordinatorConfig {
        wait_timeout_ms: Some(50),
        executor: ExecutorConfig::Inline,
    };
    let coordinator: Coordinator<u32> = build_coordinator(&cfg).unwrap();
    assert_eq!(coordinator.wait_timeout(), Some(Duration::from_millis(50)));

    coordinator.schedule(7, || Ok(()));
    assert_eq!(coordinator.stats().processed, 1);

    let err = coordinator
        .wait_once(&Predicate::new(|m: &u32| *m == 8))
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::TimedOut(_)));
}

#[test]
fn test_build_coordinator_thread_pool() {
    let cfg = CoordinatorConfig {
        wait_timeout_ms: Some(5_000),
        executor: ExecutorConfig::ThreadPool(WorkerPoolConfig::new().with_worker_count(2)),
    };
    let coordinator: Coordinator<u32> = build_coordinator(&cfg).unwrap();
    let done = coordinator.schedule(1, || Ok(5));
    coordinator
        .wait_once(&Predicate::new(|m: &u32| *m == 1))
        .unwrap();
    assert_eq!(done.wait().unwrap(), 5);
}

#[test]
fn test_build_coordinator_rejects_invalid_config() {
    let cfg = CoordinatorConfig {
        wait_timeout_ms: None,
        executor: ExecutorConfig::ThreadPool(WorkerPoolConfig::new().with_worker_count(0)),
    };
    let result: Result<Coordinator<u32>, _> = build_coordinator(&cfg);
    assert!(matches!(result, Err(CoordinatorError::InvalidConfig(_))));
}

#[test]
fn test_build_coordinator_tokio_outside_runtime() {
    let cfg = CoordinatorConfig {
        wait_timeout_ms: None,
        executor: ExecutorConfig::Tokio,
    };
    let result: Result<Coordinator<u32>, _> = build_coordinator(&cfg);
    assert!(matches!(result, Err(CoordinatorError::InvalidConfig(_))));
}
