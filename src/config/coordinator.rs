//! Coordinator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::worker_pool::WorkerPoolConfig;

/// Which executor runs released actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ExecutorConfig {
    /// The process-wide shared thread pool.
    #[default]
    Shared,
    /// Run actions on the thread that releases them.
    Inline,
    /// A dedicated thread pool owned by the coordinator.
    ThreadPool(WorkerPoolConfig),
    /// The tokio runtime the coordinator is built in.
    Tokio,
}

/// Root coordinator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Upper bound for blocking calls in milliseconds; `None` waits indefinitely.
    pub wait_timeout_ms: Option<u64>,
    /// Executor selection.
    pub executor: ExecutorConfig,
}

impl CoordinatorConfig {
    /// Configured wait timeout.
    #[must_use]
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.wait_timeout_ms == Some(0) {
            return Err("wait_timeout_ms must be greater than 0".into());
        }
        if let ExecutorConfig::ThreadPool(pool) = &self.executor {
            pool.validate().map_err(|e| format!("thread pool invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate it.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from `CONDO_*` environment variables, reading a `.env` file
    /// first if one exists.
    ///
    /// Recognised variables: `CONDO_WAIT_TIMEOUT_MS`, `CONDO_EXECUTOR`
    /// (`shared`, `inline`, `thread_pool`, `tokio`), `CONDO_WORKER_COUNT` and
    /// `CONDO_MAX_QUEUE_DEPTH`. The last two size a dedicated pool and are rejected
    /// with any other executor.
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed variable or validation failure.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str| -> Result<Option<u64>, String> {
            lookup(key)
                .map(|raw| raw.trim().parse::<u64>().map_err(|e| format!("{key}: {e}")))
                .transpose()
        };

        let executor_name = lookup("CONDO_EXECUTOR");
        let executor_name = executor_name.as_deref().map(str::trim);
        if executor_name != Some("thread_pool") {
            for key in ["CONDO_WORKER_COUNT", "CONDO_MAX_QUEUE_DEPTH"] {
                if lookup(key).is_some() {
                    return Err(format!("{key} requires CONDO_EXECUTOR=thread_pool"));
                }
            }
        }

        let executor = match executor_name {
            None | Some("shared") => ExecutorConfig::Shared,
            Some("inline") => ExecutorConfig::Inline,
            Some("tokio") => ExecutorConfig::Tokio,
            Some("thread_pool") => {
                let mut pool = WorkerPoolConfig::default();
                if let Some(count) = number("CONDO_WORKER_COUNT")? {
                    pool.worker_count = usize::try_from(count).map_err(|e| e.to_string())?;
                }
                if let Some(depth) = number("CONDO_MAX_QUEUE_DEPTH")? {
                    pool.max_queue_depth = usize::try_from(depth).map_err(|e| e.to_string())?;
                }
                ExecutorConfig::ThreadPool(pool)
            }
            Some(other) => return Err(format!("CONDO_EXECUTOR: unknown executor `{other}`")),
        };

        let cfg = Self {
            wait_timeout_ms: number("CONDO_WAIT_TIMEOUT_MS")?,
            executor,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
