//! Tests for error types

use prometheus_condo::core::{
    ActionError, CoordinatorError, Coordinator, ExecutorError, InlineExecutor, Predicate, Task,
};
use std::time::Duration;

#[test]
fn test_unregistered_mask_error() {
    let coordinator: Coordinator<u8> = Coordinator::new(InlineExecutor);
    let id = coordinator.mask(Predicate::always());
    coordinator.unmask(id).unwrap();
    let err = coordinator.unmask(id).unwrap_err();
    assert_eq!(format!("{}", err), format!("mask not registered: {id}"));
}

#[test]
fn test_interrupted_error() {
    let err = CoordinatorError::Interrupted;
    assert_eq!(format!("{}", err), "interrupted while waiting");
}

#[test]
fn test_timed_out_error() {
    let err = CoordinatorError::TimedOut(Duration::from_millis(250));
    assert_eq!(format!("{}", err), "timed out after 250ms while waiting");
}

#[test]
fn test_invalid_config_error() {
    let err = CoordinatorError::InvalidConfig("worker_count must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: worker_count must be greater than 0"
    );
}

#[test]
fn test_action_failed_from_anyhow() {
    let err: ActionError = anyhow::anyhow!("disk full").into();
    assert_eq!(format!("{}", err), "action failed: disk full");
}

#[test]
fn test_action_panicked_and_abandoned() {
    assert_eq!(
        format!("{}", ActionError::Panicked("boom".to_string())),
        "action panicked: boom"
    );
    assert_eq!(
        format!("{}", ActionError::Abandoned),
        "action abandoned before completion"
    );
}

#[test]
fn test_executor_error_returns_task() {
    let err = ExecutorError::QueueFull(Task::new(async {}));
    assert_eq!(format!("{}", err), "executor queue is full");
    err.into_task().run();

    let err = ExecutorError::Shutdown(Task::new(async {}));
    assert_eq!(format!("{}", err), "executor has been shut down");
}
