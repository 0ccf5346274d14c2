//! Tests for runtime adapters

use prometheus_condo::builders::build_coordinator;
use prometheus_condo::config::{CoordinatorConfig, ExecutorConfig};
use prometheus_condo::core::{Coordinator, Predicate};
use prometheus_condo::runtime::TokioExecutor;
use std::time::Duration;

#[test]
fn test_tokio_executor_rejects_zero_workers() {
    assert!(TokioExecutor::with_worker_threads(0).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_build_coordinator_tokio_inside_runtime() {
    let cfg = CoordinatorConfig {
        wait_timeout_ms: Some(5_000),
        executor: ExecutorConfig::Tokio,
    };
    let coordinator: Coordinator<&'static str> = build_coordinator(&cfg).unwrap();
    let mask = coordinator.mask(Predicate::new(|m: &&str| *m == "flush"));

    let done = coordinator.schedule_async("flush", || async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(12_u32)
    });
    assert!(!done.is_done());

    coordinator.unmask(mask).unwrap();
    assert_eq!(done.await.unwrap(), 12);
}
