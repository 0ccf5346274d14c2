//! Tests for utility functions

use prometheus_condo::util::{init_test_tracing, init_tracing};

#[test]
fn test_tracing_init_is_idempotent() {
    init_test_tracing();
    init_test_tracing();
    init_tracing();
    tracing::info!("subscriber installed");
}
