//! Errors raised by the crate itself.
//!
//! Stream errors are never represented here: those travel through
//! `Observer::error` with whatever type the stream chose.

use thiserror::Error;

/// Failure to hand work to an executor.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SchedulerError {
  /// The worker pool could not be built.
  #[error("failed to build worker pool: {0}")]
  PoolBuild(#[from] std::io::Error),

  /// The executor refused the task, typically because it is shutting down.
  #[error("executor refused task: {0}")]
  Spawn(#[from] futures::task::SpawnError),

  /// No tokio runtime is running on the calling thread.
  #[cfg(feature = "tokio-scheduler")]
  #[error("no tokio runtime on this thread: {0}")]
  NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

impl SchedulerError {
  /// Returns a short stable label (snake_case) for use in logs.
  ///
  /// ```
  /// use rxcore::error::SchedulerError;
  ///
  /// let err = SchedulerError::from(futures::task::SpawnError::shutdown());
  /// assert_eq!(err.as_label(), "scheduler_spawn");
  /// ```
  pub fn as_label(&self) -> &'static str {
    match self {
      SchedulerError::PoolBuild(_) => "scheduler_pool_build",
      SchedulerError::Spawn(_) => "scheduler_spawn",
      #[cfg(feature = "tokio-scheduler")]
      SchedulerError::NoRuntime(_) => "scheduler_no_runtime",
    }
  }
}
