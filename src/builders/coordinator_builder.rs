//! Coordinator construction.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::{CoordinatorConfig, ExecutorConfig};
use crate::core::{
    default_executor, Coordinator, CoordinatorError, Executor, InlineExecutor, ThreadPoolExecutor,
};

/// Step-by-step coordinator construction.
///
/// ```
/// use std::time::Duration;
/// use prometheus_condo::core::{Coordinator, InlineExecutor};
///
/// let coordinator: Coordinator<String> = Coordinator::builder()
///     .executor(InlineExecutor)
///     .wait_timeout(Duration::from_secs(1))
///     .build();
/// assert_eq!(coordinator.wait_timeout(), Some(Duration::from_secs(1)));
/// ```
pub struct CoordinatorBuilder<M> {
    executor: Option<Arc<dyn Executor>>,
    wait_timeout: Option<Duration>,
    _metadata: PhantomData<fn() -> M>,
}

impl<M> CoordinatorBuilder<M>
where
    M: Send + Sync + 'static,
{
    /// A builder using the shared default executor and no wait timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            executor: None,
            wait_timeout: None,
            _metadata: PhantomData,
        }
    }

    /// Run released actions on `executor`.
    #[must_use]
    pub fn executor<E: Executor>(mut self, executor: E) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Run released actions on an already shared executor.
    #[must_use]
    pub fn shared_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Bound every blocking call by `timeout`.
    #[must_use]
    pub const fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    /// Finish construction.
    #[must_use]
    pub fn build(self) -> Coordinator<M> {
        let executor = self.executor.unwrap_or_else(default_executor);
        Coordinator::from_parts(executor, self.wait_timeout)
    }
}

impl<M> Default for CoordinatorBuilder<M>
where
    M: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Build a coordinator from configuration.
///
/// # Errors
///
/// [`CoordinatorError::InvalidConfig`] if the configuration does not validate or names
/// an executor that is unavailable; [`CoordinatorError::WorkerSpawn`] if a dedicated
/// pool cannot start its threads.
pub fn build_coordinator<M>(cfg: &CoordinatorConfig) -> Result<Coordinator<M>, CoordinatorError>
where
    M: Send + Sync + 'static,
{
    cfg.validate()
        .map_err(|e| CoordinatorError::InvalidConfig(format!("config invalid: {e}")))?;

    let executor: Arc<dyn Executor> = match &cfg.executor {
        ExecutorConfig::Shared => default_executor(),
        ExecutorConfig::Inline => Arc::new(InlineExecutor),
        ExecutorConfig::ThreadPool(pool) => Arc::new(ThreadPoolExecutor::new(pool.clone())?),
        ExecutorConfig::Tokio => tokio_executor()?,
    };
    debug!(executor = ?cfg.executor, wait_timeout_ms = ?cfg.wait_timeout_ms, "building coordinator");

    let mut builder = CoordinatorBuilder::new().shared_executor(executor);
    if let Some(timeout) = cfg.wait_timeout() {
        builder = builder.wait_timeout(timeout);
    }
    Ok(builder.build())
}

#[cfg(feature = "tokio-runtime")]
fn tokio_executor() -> Result<Arc<dyn Executor>, CoordinatorError> {
    Ok(Arc::new(crate::runtime::TokioExecutor::current()?))
}

#[cfg(not(feature = "tokio-runtime"))]
fn tokio_executor() -> Result<Arc<dyn Executor>, CoordinatorError> {
    Err(CoordinatorError::InvalidConfig(
        "tokio executor requires the `tokio-runtime` feature".into(),
    ))
}
