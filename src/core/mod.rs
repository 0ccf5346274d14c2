//! Coordination engine: masks, deferred actions, processed logs and the executors
//! that run released work.

pub mod completion;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod predicate;
pub mod worker_pool;

mod deferred;
mod mask;
mod monitor;
mod processed;

pub use completion::Completion;
pub use coordinator::{Coordinator, CoordinatorStats};
pub use error::{ActionError, ActionResult, CoordinatorError, CoordinatorResult, ExecutorError};
pub use executor::{Executor, InlineExecutor, Task};
pub use predicate::{MaskId, Predicate};
pub use worker_pool::{default_executor, PoolStats, ThreadPoolExecutor};
