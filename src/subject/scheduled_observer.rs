use std::{
  collections::VecDeque,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
  },
  thread,
};

use tracing::trace;

use crate::{
  notification::Notification,
  observer::BoxObserver,
  rc::lock,
  scheduler::{Scheduler, Task, TaskHandle, TaskState},
  subscription::SubscriptionLike,
};

/// One subscriber of a subject, with its own queue of pending
/// notifications.
///
/// Notifications are queued while the subject holds its lock, which fixes
/// their order, and delivered later by a drain task on the scheduler, one
/// per step, with no lock held. Only one drain task exists per subscriber at
/// a time, so a callback that publishes back into the subject only queues.
pub(crate) struct ScheduledObserver<Item, Err, Sch> {
  observer: Mutex<Option<BoxObserver<Item, Err>>>,
  queue: Mutex<DrainState<Item, Err>>,
  stopped: AtomicBool,
  scheduler: Sch,
}

struct DrainState<Item, Err> {
  pending: VecDeque<Notification<Item, Err>>,
  draining: bool,
  /// Handle of the current drain task, once `schedule` has returned it.
  task: Option<TaskHandle>,
  /// Bumped for every drain task started.
  epoch: u64,
}

impl<Item, Err, Sch> ScheduledObserver<Item, Err, Sch>
where
  Item: Send + 'static,
  Err: Send + 'static,
  Sch: Scheduler,
{
  pub(crate) fn new(observer: BoxObserver<Item, Err>, scheduler: Sch) -> Arc<Self> {
    Arc::new(Self {
      observer: Mutex::new(Some(observer)),
      queue: Mutex::new(DrainState {
        pending: VecDeque::new(),
        draining: false,
        task: None,
        epoch: 0,
      }),
      stopped: AtomicBool::new(false),
      scheduler,
    })
  }

  pub(crate) fn enqueue(&self, notification: Notification<Item, Err>) {
    if !self.is_stopped() {
      lock(&self.queue).pending.push_back(notification);
    }
  }

  /// Drops everything still queued and everything queued later.
  pub(crate) fn stop(&self) {
    self.stopped.store(true, Ordering::Release);
    lock(&self.queue).pending.clear();
  }

  #[inline]
  pub(crate) fn is_stopped(&self) -> bool { self.stopped.load(Ordering::Acquire) }

  /// Starts a drain task unless one is running or nothing is queued.
  ///
  /// A drain task the scheduler cancelled before it finished, such as one
  /// abandoned when a trampoline unwinds, counts as not running.
  pub(crate) fn ensure_active(self: &Arc<Self>) {
    let epoch = {
      let mut queue = lock(&self.queue);
      if queue.pending.is_empty() {
        return;
      }
      if queue.draining {
        if !queue.task.as_ref().map_or(false, TaskHandle::is_closed) {
          return;
        }
        trace!(pending = queue.pending.len(), "restarting cancelled drain");
      }
      queue.draining = true;
      queue.task = None;
      queue.epoch = queue.epoch.wrapping_add(1);
      queue.epoch
    };
    let handle = self.scheduler.schedule(Task::new(self.clone(), Self::drain_step), None);
    let mut queue = lock(&self.queue);
    if queue.draining && queue.epoch == epoch {
      queue.task = Some(handle);
    }
  }

  fn drain_step(this: &mut Arc<Self>) -> TaskState {
    let notification = {
      let mut queue = lock(&this.queue);
      let next = if this.is_stopped() { None } else { queue.pending.pop_front() };
      match next {
        Some(n) => n,
        None => {
          queue.pending.clear();
          queue.draining = false;
          return TaskState::Finished;
        }
      }
    };

    let _guard = UnwindGuard(&**this);
    let observer = lock(&this.observer).take();
    if let Some(mut observer) = observer {
      let terminal = notification.is_terminal();
      notification.accept(&mut *observer);
      if terminal {
        this.stopped.store(true, Ordering::Release);
      } else {
        *lock(&this.observer) = Some(observer);
      }
    }
    TaskState::Yield
  }
}

/// Stops the subscriber and resets the drain flag if a callback panics.
struct UnwindGuard<'a, Item, Err, Sch>(&'a ScheduledObserver<Item, Err, Sch>);

impl<Item, Err, Sch> Drop for UnwindGuard<'_, Item, Err, Sch> {
  fn drop(&mut self) {
    if thread::panicking() {
      self.0.stopped.store(true, Ordering::Release);
      let mut queue = lock(&self.0.queue);
      queue.pending.clear();
      queue.draining = false;
    }
  }
}
