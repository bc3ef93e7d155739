use futures::{executor::ThreadPool, task::SpawnExt};
use once_cell::sync::OnceCell;
use tracing::{error, trace};

use super::{abortable_task, Duration, Scheduler, Task, TaskHandle};
use crate::{error::SchedulerError, subscription::SubscriptionLike};

static DEFAULT_POOL: OnceCell<ThreadPool> = OnceCell::new();

/// Settings for a dedicated worker pool.
#[derive(Clone, Debug, Default)]
pub struct ThreadPoolConfig {
  pool_size: Option<usize>,
  name_prefix: Option<String>,
}

impl ThreadPoolConfig {
  /// Number of worker threads; defaults to the number of CPUs.
  pub fn pool_size(mut self, size: usize) -> Self {
    self.pool_size = Some(size);
    self
  }

  /// Prefix for worker thread names.
  pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.name_prefix = Some(prefix.into());
    self
  }

  pub fn build(self) -> Result<ThreadPoolScheduler, SchedulerError> {
    let mut builder = ThreadPool::builder();
    if let Some(size) = self.pool_size {
      builder.pool_size(size);
    }
    if let Some(prefix) = self.name_prefix {
      builder.name_prefix(prefix);
    }
    Ok(ThreadPoolScheduler { pool: builder.create()? })
  }
}

/// Runs tasks on a `futures` thread pool.
///
/// Delays and sleeps suspend the task without holding a worker thread.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
}

impl ThreadPoolScheduler {
  /// A scheduler on the process-wide shared pool, built on first use.
  pub fn new() -> Result<Self, SchedulerError> {
    let pool = DEFAULT_POOL.get_or_try_init(ThreadPool::new)?;
    Ok(Self { pool: pool.clone() })
  }

  /// A scheduler on an existing pool.
  pub fn with_pool(pool: ThreadPool) -> Self { Self { pool } }

  /// Like [`Scheduler::schedule`], but reports a spawn failure instead of
  /// returning a closed handle.
  pub fn try_schedule<S: Send + 'static>(
    &self, task: Task<S>, delay: Option<Duration>,
  ) -> Result<TaskHandle, SchedulerError> {
    let handle = TaskHandle::new();
    self.pool.spawn(abortable_task(task, delay, &handle))?;
    trace!(?delay, "task spawned on thread pool");
    Ok(handle)
  }
}

impl Scheduler for ThreadPoolScheduler {
  fn schedule<S: Send + 'static>(&self, task: Task<S>, delay: Option<Duration>) -> TaskHandle {
    self.try_schedule(task, delay).unwrap_or_else(|err| {
      error!(label = err.as_label(), %err, "task dropped");
      let mut handle = TaskHandle::new();
      handle.unsubscribe();
      handle
    })
  }
}
