//! A virtual-time scheduler for deterministic tests.
//!
//! Nothing scheduled on a [`TestScheduler`] runs until the test moves the
//! clock with [`TestScheduler::advance_by`], [`TestScheduler::advance_to`]
//! or [`TestScheduler::flush`]. Due tasks then run synchronously on the
//! calling thread, earliest first and FIFO for equal due times, with the
//! clock set to each task's due time while it runs.
//!
//! ```rust
//! use rxcore::scheduler::{Duration, Scheduler, Task, TestScheduler};
//! use std::sync::{Arc, Mutex};
//!
//! let scheduler = TestScheduler::new();
//! let log = Arc::new(Mutex::new(vec![]));
//! let c_log = log.clone();
//! scheduler.schedule(Task::once(move || c_log.lock().unwrap().push("tick")), Some(Duration::from_secs(1)));
//!
//! scheduler.advance_by(Duration::from_millis(999));
//! assert!(log.lock().unwrap().is_empty());
//! scheduler.advance_by(Duration::from_millis(1));
//! assert_eq!(*log.lock().unwrap(), vec!["tick"]);
//! ```

use std::{cmp::Ordering, collections::BinaryHeap};

use super::{BoxTask, Duration, Instant, Scheduler, Task, TaskHandle, TaskState};
use crate::{
  rc::{MutArc, RcDeref, RcDerefMut},
  subscription::SubscriptionLike,
};

/// A scheduler whose clock only moves when told to.
///
/// Clones share the clock and the queue.
#[derive(Clone)]
pub struct TestScheduler(MutArc<VirtualClock>);

struct VirtualClock {
  origin: Instant,
  elapsed: Duration,
  next_seq: u64,
  queue: BinaryHeap<VirtualTask>,
}

struct VirtualTask {
  due: Duration,
  seq: u64,
  task: BoxTask,
  handle: TaskHandle,
}

impl PartialEq for VirtualTask {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.seq == other.seq }
}

impl Eq for VirtualTask {}

impl PartialOrd for VirtualTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for VirtualTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by sequence.
    other.due.cmp(&self.due).then_with(|| other.seq.cmp(&self.seq))
  }
}

impl VirtualClock {
  fn push(&mut self, due: Duration, task: BoxTask, handle: TaskHandle) {
    let seq = self.next_seq;
    self.next_seq += 1;
    self.queue.push(VirtualTask { due, seq, task, handle });
  }
}

impl Default for TestScheduler {
  fn default() -> Self { Self::new() }
}

impl TestScheduler {
  pub fn new() -> Self {
    Self(MutArc::own(VirtualClock {
      origin: Instant::now(),
      elapsed: Duration::ZERO,
      next_seq: 0,
      queue: BinaryHeap::new(),
    }))
  }

  /// Virtual time passed since the scheduler was created.
  pub fn elapsed(&self) -> Duration { self.0.rc_deref().elapsed }

  /// Number of queued tasks, cancelled ones included until they are reached.
  pub fn pending_count(&self) -> usize { self.0.rc_deref().queue.len() }

  pub fn is_empty(&self) -> bool { self.0.rc_deref().queue.is_empty() }

  /// Moves the clock forward by `duration`, running every task that falls due.
  pub fn advance_by(&self, duration: Duration) {
    let target = self.elapsed() + duration;
    self.run_until(Some(target));
    let mut clock = self.0.rc_deref_mut();
    clock.elapsed = clock.elapsed.max(target);
  }

  /// Moves the clock to `instant`; an instant in the past is a no-op.
  pub fn advance_to(&self, instant: Instant) {
    let target = instant.saturating_duration_since(self.0.rc_deref().origin);
    if target > self.elapsed() {
      self.advance_by(target - self.elapsed());
    }
  }

  /// Runs queued tasks, moving the clock as needed, until none remain.
  pub fn flush(&self) { self.run_until(None) }

  fn run_until(&self, limit: Option<Duration>) {
    loop {
      let next = {
        let mut clock = self.0.rc_deref_mut();
        let due = clock.queue.peek().is_some_and(|t| limit.map_or(true, |limit| t.due <= limit));
        if !due {
          return;
        }
        clock.queue.pop().map(|task| {
          clock.elapsed = clock.elapsed.max(task.due);
          task
        })
      };
      let Some(mut next) = next else { return };
      if next.handle.is_closed() {
        continue;
      }

      let state = (next.task)();
      let mut clock = self.0.rc_deref_mut();
      let now = clock.elapsed;
      match state {
        TaskState::Finished => next.handle.mark_finished(),
        TaskState::Yield => clock.push(now, next.task, next.handle),
        TaskState::Sleeping(d) => clock.push(now + d, next.task, next.handle),
      }
    }
  }
}

impl Scheduler for TestScheduler {
  fn now(&self) -> Instant {
    let clock = self.0.rc_deref();
    clock.origin + clock.elapsed
  }

  fn schedule<S: Send + 'static>(&self, task: Task<S>, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let mut clock = self.0.rc_deref_mut();
    let due = clock.elapsed + delay.unwrap_or_default();
    clock.push(due, task.into_boxed(), handle.clone());
    handle
  }
}
