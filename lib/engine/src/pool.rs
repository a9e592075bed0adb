use crate::error::AdapterError;
use fedql_model::ExecutionConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Bounds the number of concurrent backend calls of an engine.
///
/// A permit is only held while a single backend call is in flight. Units waiting for their child
/// forests do not hold a permit, so nested fan-out cannot exhaust the pool.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// The maximum number of concurrent backend calls.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Runs `task` once a permit is available.
    pub async fn run<F: Future>(&self, task: F) -> Result<F::Output, AdapterError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AdapterError::PoolClosed)?;
        Ok(task.await)
    }
}

/// What every backend call of a request shares.
#[derive(Debug, Clone)]
pub struct ExecutionEnv {
    pub pool: WorkerPool,
    /// Deadline of a single backend call.
    pub timeout: Option<Duration>,
    /// Maximum number of identifiers per backend call.
    pub batch_size: usize,
}

impl ExecutionEnv {
    pub fn new(config: &ExecutionConfig) -> Self {
        Self {
            pool: WorkerPool::new(config.workers),
            timeout: config.timeout(),
            batch_size: config.batch_size,
        }
    }

    /// Runs one backend call on the pool, enforcing the deadline.
    pub async fn call<T>(
        &self,
        task: impl Future<Output = Result<T, AdapterError>>,
    ) -> Result<T, AdapterError> {
        match self.timeout {
            Some(timeout) => self
                .pool
                .run(tokio::time::timeout(timeout, task))
                .await?
                .map_err(|_| AdapterError::Timeout(timeout))?,
            None => self.pool.run(task).await?,
        }
    }
}
