//! # Prometheus Condo
//!
//! Deterministic control over background side effects, for tests.
//!
//! Production code schedules tagged actions (database writes, cache refreshes, outbound
//! calls issued from a worker pool) through a [`Coordinator`](core::Coordinator)
//! instead of invoking them directly. Test code then decides when those actions may
//! run and waits for exactly the ones it cares about, turning racy interleavings into
//! fixed sequences without changing production code paths.
//!
//! ## Core Operations
//!
//! - **Mask**: hold back every action whose metadata matches a predicate
//! - **Unmask**: lift a mask; actions no longer covered by any mask start in order
//! - **Pump**: release one held action without lifting the mask
//! - **Wait any**: block until some matching action has finished (non-consuming)
//! - **Wait once**: block until a matching action has finished, and claim it
//!
//! Failed actions still count as finished, so waiters always make progress; the failure
//! itself is relayed to the action's [`Completion`](core::Completion).
//!
//! ## Example
//!
//! ```rust
//! use prometheus_condo::core::{Coordinator, Predicate};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), prometheus_condo::core::CoordinatorError> {
//! let coordinator: Arc<Coordinator<String>> = Arc::new(
//!     Coordinator::builder()
//!         .wait_timeout(Duration::from_secs(5))
//!         .build(),
//! );
//!
//! let write_1 = Predicate::new(|m: &String| m == "write:1");
//! let mask = coordinator.mask(write_1.clone());
//!
//! // production code, typically on another thread
//! let written = coordinator.schedule("write:1".to_string(), || Ok(()));
//!
//! // the write is held back until the test lets it through
//! assert!(!written.is_done());
//! coordinator.pump(&write_1)?.wait_once(&write_1)?.unmask(mask)?;
//! assert!(written.is_done());
//! # Ok(())
//! # }
//! ```
//!
//! ## Executors
//!
//! Released actions run on an [`Executor`](core::Executor):
//!
//! - [`ThreadPoolExecutor`](core::ThreadPoolExecutor): dedicated OS threads (the
//!   shared default is sized to the number of CPUs)
//! - [`InlineExecutor`](core::InlineExecutor): the releasing thread, fully synchronous
//! - `TokioExecutor`: a tokio runtime (feature `tokio-runtime`)

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Coordination engine, completion handles and executors.
pub mod core;
/// Configuration models for coordinators and executors.
pub mod config;
/// Builders to construct coordinators from code or configuration.
pub mod builders;
/// Runtime adapters.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Shared utilities.
pub mod util;
