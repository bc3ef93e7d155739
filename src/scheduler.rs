//! Schedulers decide where and when a unit of work runs.
//!
//! Work is described by a [`Task`]: a piece of state plus a plain function
//! pointer that advances it one step and reports a [`TaskState`]. Every
//! scheduler hands back a [`TaskHandle`] that cancels the work, reports
//! whether it is done, and can be awaited.
//!
//! | scheduler                  | runs work                                   |
//! |----------------------------|---------------------------------------------|
//! | [`ImmediateScheduler`]     | inline, blocking for delays                 |
//! | [`CurrentThreadScheduler`] | on the caller's thread, queued (trampoline) |
//! | [`ThreadPoolScheduler`]    | on a `futures` thread pool                  |
//! | `TokioScheduler`           | on a tokio runtime (`tokio-scheduler`)      |
//! | [`TestScheduler`]          | in virtual time, when advanced by the test  |

use std::{
  future::Future,
  pin::Pin,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
  },
  task::{Context, Poll, Waker},
};

pub use std::time::{Duration, Instant};

use crate::{rc::lock, subscription::SubscriptionLike};

mod immediate;
mod test_scheduler;
mod trampoline;
pub use immediate::ImmediateScheduler;
pub use test_scheduler::TestScheduler;
pub use trampoline::CurrentThreadScheduler;

#[cfg(feature = "futures-scheduler")]
mod thread_pool_scheduler;
#[cfg(feature = "futures-scheduler")]
pub use thread_pool_scheduler::{ThreadPoolConfig, ThreadPoolScheduler};

#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// What a task wants after running one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
  /// Done; the handle becomes finished.
  Finished,
  /// Run again as soon as the scheduler gives other work a turn.
  Yield,
  /// Run again after the given duration.
  Sleeping(Duration),
}

/// A schedulable unit of work.
///
/// The handler is a function pointer rather than a closure so that the task
/// type stays nameable; [`Task::from_fn`] and [`Task::once`] cover the
/// closure cases.
pub struct Task<S> {
  state: S,
  handler: fn(&mut S) -> TaskState,
}

impl<S> Task<S> {
  pub fn new(state: S, handler: fn(&mut S) -> TaskState) -> Self { Self { state, handler } }

  /// Runs one step of the task.
  #[inline]
  pub fn step(&mut self) -> TaskState { (self.handler)(&mut self.state) }
}

impl<F: FnMut() -> TaskState> Task<F> {
  /// A task that calls `f` on every step.
  pub fn from_fn(f: F) -> Self { Task::new(f, call_fn::<F>) }
}

impl<F: FnOnce()> Task<Option<F>> {
  /// A task that calls `f` once and finishes.
  pub fn once(f: F) -> Self { Task::new(Some(f), call_once::<F>) }
}

fn call_fn<F: FnMut() -> TaskState>(f: &mut F) -> TaskState { f() }

fn call_once<F: FnOnce()>(f: &mut Option<F>) -> TaskState {
  if let Some(f) = f.take() {
    f();
  }
  TaskState::Finished
}

/// A type-erased task, as stored in scheduler queues.
pub(crate) type BoxTask = Box<dyn FnMut() -> TaskState + Send>;

impl<S: Send + 'static> Task<S> {
  pub(crate) fn into_boxed(mut self) -> BoxTask { Box::new(move || self.step()) }
}

/// Orders tasks for execution.
///
/// Implementations are cheap handles; clones share the same underlying
/// executor and clock.
pub trait Scheduler: Clone + Send + Sync + 'static {
  /// The scheduler's notion of the current time.
  fn now(&self) -> Instant { Instant::now() }

  /// Runs `task` after `delay`, or as soon as possible when `delay` is
  /// `None`.
  fn schedule<S: Send + 'static>(&self, task: Task<S>, delay: Option<Duration>) -> TaskHandle;

  /// Runs `task` at `due`, measured on this scheduler's clock. A due time in
  /// the past runs as soon as possible.
  fn schedule_at<S: Send + 'static>(&self, task: Task<S>, due: Instant) -> TaskHandle {
    let delay = due.saturating_duration_since(self.now());
    self.schedule(task, (!delay.is_zero()).then_some(delay))
  }
}

struct HandleState {
  cancelled: AtomicBool,
  finished: AtomicBool,
  waker: Mutex<Option<Waker>>,
  #[cfg(any(feature = "futures-scheduler", feature = "tokio-scheduler"))]
  abort: Mutex<Option<futures::future::AbortHandle>>,
}

/// Handle to a scheduled task.
///
/// Unsubscribing cancels the task if it has not finished yet. Awaiting the
/// handle resolves once the task finishes or is cancelled.
#[derive(Clone)]
pub struct TaskHandle(Option<Arc<HandleState>>);

impl TaskHandle {
  /// A handle for work that already ran to completion.
  pub fn finished() -> Self { Self(None) }

  pub(crate) fn new() -> Self {
    Self(Some(Arc::new(HandleState {
      cancelled: AtomicBool::new(false),
      finished: AtomicBool::new(false),
      waker: Mutex::new(None),
      #[cfg(any(feature = "futures-scheduler", feature = "tokio-scheduler"))]
      abort: Mutex::new(None),
    })))
  }

  pub(crate) fn mark_finished(&self) {
    if let Some(state) = &self.0 {
      state.finished.store(true, Ordering::Release);
      wake(state);
    }
  }

  #[cfg(any(feature = "futures-scheduler", feature = "tokio-scheduler"))]
  pub(crate) fn set_abort(&self, abort: futures::future::AbortHandle) {
    if let Some(state) = &self.0 {
      *lock(&state.abort) = Some(abort);
      if state.cancelled.load(Ordering::Acquire) {
        abort_task(state);
      }
    }
  }

  /// True once the task ran to completion.
  pub fn is_finished(&self) -> bool {
    self.0.as_ref().map_or(true, |s| s.finished.load(Ordering::Acquire))
  }

  /// True once the task was cancelled through this handle.
  pub fn is_cancelled(&self) -> bool {
    self.0.as_ref().map_or(false, |s| s.cancelled.load(Ordering::Acquire))
  }
}

fn wake(state: &HandleState) {
  let waker = lock(&state.waker).take();
  if let Some(waker) = waker {
    waker.wake();
  }
}

#[cfg(any(feature = "futures-scheduler", feature = "tokio-scheduler"))]
fn abort_task(state: &HandleState) {
  let abort = lock(&state.abort).take();
  if let Some(abort) = abort {
    abort.abort();
  }
}

impl SubscriptionLike for TaskHandle {
  fn unsubscribe(&mut self) {
    if let Some(state) = &self.0 {
      if state.finished.load(Ordering::Acquire) || state.cancelled.swap(true, Ordering::AcqRel) {
        return;
      }
      #[cfg(any(feature = "futures-scheduler", feature = "tokio-scheduler"))]
      abort_task(state);
      wake(state);
    }
  }

  fn is_closed(&self) -> bool {
    self.0.as_ref().map_or(true, |s| {
      s.finished.load(Ordering::Acquire) || s.cancelled.load(Ordering::Acquire)
    })
  }
}

impl Future for TaskHandle {
  type Output = ();

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let Some(state) = &self.0 else { return Poll::Ready(()) };
    if self.is_closed() {
      return Poll::Ready(());
    }
    *lock(&state.waker) = Some(cx.waker().clone());
    // The task may have finished between the check and storing the waker.
    if self.is_closed() {
      Poll::Ready(())
    } else {
      Poll::Pending
    }
  }
}

/// Yields to the executor once before completing.
#[cfg(any(feature = "futures-scheduler", feature = "tokio-scheduler"))]
pub(crate) struct YieldNow(bool);

#[cfg(any(feature = "futures-scheduler", feature = "tokio-scheduler"))]
impl YieldNow {
  pub(crate) fn new() -> Self { Self(false) }
}

#[cfg(any(feature = "futures-scheduler", feature = "tokio-scheduler"))]
impl Future for YieldNow {
  type Output = ();

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
    if self.0 {
      Poll::Ready(())
    } else {
      self.0 = true;
      cx.waker().wake_by_ref();
      Poll::Pending
    }
  }
}

/// Drives `task` to completion inside an async executor, honoring `delay`,
/// yields and sleeps, and stopping early once `handle` is closed.
#[cfg(any(feature = "futures-scheduler", feature = "tokio-scheduler"))]
pub(crate) async fn run_task<S>(mut task: Task<S>, delay: Option<Duration>, handle: TaskHandle) {
  let mut delay = delay;
  loop {
    if let Some(d) = delay.take() {
      futures_time::task::sleep(d.into()).await;
    }
    if handle.is_closed() {
      return;
    }
    match task.step() {
      TaskState::Finished => break,
      TaskState::Yield => YieldNow::new().await,
      TaskState::Sleeping(d) => delay = Some(d),
    }
  }
  handle.mark_finished();
}

/// Wraps [`run_task`] so that cancelling `handle` aborts the future at its
/// next suspension point.
#[cfg(any(feature = "futures-scheduler", feature = "tokio-scheduler"))]
pub(crate) fn abortable_task<S: Send + 'static>(
  task: Task<S>, delay: Option<Duration>, handle: &TaskHandle,
) -> impl Future<Output = ()> + Send + 'static {
  use futures::{future::AbortHandle, FutureExt};

  let (abort, registration) = AbortHandle::new_pair();
  handle.set_abort(abort);
  futures::future::Abortable::new(run_task(task, delay, handle.clone()), registration).map(|_| ())
}
