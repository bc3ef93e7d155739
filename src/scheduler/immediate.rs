use std::thread;

use super::{Duration, Scheduler, Task, TaskHandle, TaskState};

/// Runs every task inline on the calling thread.
///
/// Delays and sleeps block the caller. The returned handle is already
/// finished, since the task has run by the time `schedule` returns.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  fn schedule<S: Send + 'static>(&self, task: Task<S>, delay: Option<Duration>) -> TaskHandle {
    let mut task = task;
    if let Some(d) = delay {
      thread::sleep(d);
    }
    loop {
      match task.step() {
        TaskState::Finished => break,
        TaskState::Yield => {}
        TaskState::Sleeping(d) => thread::sleep(d),
      }
    }
    TaskHandle::finished()
  }
}
