use tokio::runtime::Handle;
use tracing::trace;

use super::{abortable_task, Duration, Scheduler, Task, TaskHandle};
use crate::error::SchedulerError;

/// Runs tasks on a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
  handle: Handle,
}

impl TokioScheduler {
  pub fn new(handle: Handle) -> Self { Self { handle } }

  /// A scheduler on the runtime the caller is running in.
  pub fn current() -> Result<Self, SchedulerError> { Ok(Self { handle: Handle::try_current()? }) }
}

impl Scheduler for TokioScheduler {
  fn schedule<S: Send + 'static>(&self, task: Task<S>, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    self.handle.spawn(abortable_task(task, delay, &handle));
    trace!(?delay, "task spawned on tokio runtime");
    handle
  }
}
