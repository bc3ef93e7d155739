use std::{
  cell::{Cell, RefCell},
  cmp::Ordering,
  collections::BinaryHeap,
  thread,
};

use tracing::trace;

use super::{BoxTask, Duration, Instant, Scheduler, Task, TaskHandle, TaskState};
use crate::subscription::SubscriptionLike;

/// Queues work on the calling thread instead of running it recursively.
///
/// The first `schedule` on a thread becomes the runner: it executes its own
/// task and then everything queued meanwhile, in due-time order and FIFO for
/// equal due times, before returning. A `schedule` issued from inside a
/// running task only enqueues and returns at once, so arbitrarily deep
/// recursive scheduling runs in constant stack space.
///
/// Delays block the runner thread until the earliest task is due.
#[derive(Clone, Copy, Debug, Default)]
pub struct CurrentThreadScheduler;

impl CurrentThreadScheduler {
  /// True while this thread is draining its trampoline queue, i.e. while
  /// `schedule` would only enqueue.
  pub fn is_running() -> bool { TRAMPOLINE.with(Trampoline::is_running) }
}

thread_local! {
  static TRAMPOLINE: Trampoline = Trampoline::default();
}

#[derive(Default)]
struct Trampoline {
  running: Cell<bool>,
  next_seq: Cell<u64>,
  queue: RefCell<BinaryHeap<QueuedTask>>,
}

struct QueuedTask {
  due: Instant,
  seq: u64,
  task: BoxTask,
  handle: TaskHandle,
}

impl PartialEq for QueuedTask {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.seq == other.seq }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for QueuedTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earliest due first, then FIFO by sequence.
    other.due.cmp(&self.due).then_with(|| other.seq.cmp(&self.seq))
  }
}

impl Trampoline {
  fn is_running(&self) -> bool { self.running.get() }

  fn enqueue(&self, task: BoxTask, handle: TaskHandle, due: Instant) {
    let seq = self.next_seq.get();
    self.next_seq.set(seq.wrapping_add(1));
    self.queue.borrow_mut().push(QueuedTask { due, seq, task, handle });
  }

  fn drain(&self) {
    self.running.set(true);
    trace!("trampoline draining");
    let _guard = DrainGuard(self);
    loop {
      let next = self.queue.borrow_mut().pop();
      let Some(mut queued) = next else { break };
      if queued.handle.is_closed() {
        continue;
      }
      let now = Instant::now();
      if queued.due > now {
        thread::sleep(queued.due - now);
      }
      match (queued.task)() {
        TaskState::Finished => queued.handle.mark_finished(),
        TaskState::Yield => self.enqueue(queued.task, queued.handle, Instant::now()),
        TaskState::Sleeping(d) => self.enqueue(queued.task, queued.handle, Instant::now() + d),
      }
    }
  }
}

/// Leaves the trampoline idle and empty when draining stops, including by
/// unwinding out of a task.
struct DrainGuard<'a>(&'a Trampoline);

impl Drop for DrainGuard<'_> {
  fn drop(&mut self) {
    let abandoned = std::mem::take(&mut *self.0.queue.borrow_mut());
    self.0.running.set(false);
    trace!(abandoned = abandoned.len(), "trampoline drained");
    for mut queued in abandoned {
      queued.handle.unsubscribe();
    }
  }
}

impl Scheduler for CurrentThreadScheduler {
  fn schedule<S: Send + 'static>(&self, task: Task<S>, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let due = Instant::now() + delay.unwrap_or_default();
    TRAMPOLINE.with(|trampoline| {
      trampoline.enqueue(task.into_boxed(), handle.clone(), due);
      if trampoline.is_running() {
        trace!("trampoline busy, task queued");
      } else {
        trampoline.drain();
      }
    });
    handle
  }
}
