use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use super::{
  replay_buffer::{ReplayBuffer, ReplayConfig},
  scheduled_observer::ScheduledObserver,
  subject_subscription::SubjectSubscription,
  subscribers::Subscribers,
};
use crate::{notification::Notification, observer::BoxObserver, rc::lock, scheduler::Scheduler};

/// When buffered values reach subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Release {
  /// Values are forwarded as they arrive and replayed from the buffer to
  /// late subscribers.
  Live,
  /// Only the latest value is kept, and it is released together with
  /// completion.
  OnComplete,
}

type Observers<Item, Err, Sch> = Arc<Vec<(usize, Arc<ScheduledObserver<Item, Err, Sch>>)>>;

/// The engine behind every subject: an observer list, a bounded history and
/// a terminal state, guarded by one lock.
///
/// Publishing takes the lock, records the notification, queues it on every
/// current subscriber and takes a snapshot of them; delivery is then kicked
/// off from the snapshot with the lock released.
pub(crate) struct SubjectCore<Item, Err, Sch> {
  state: Mutex<CoreState<Item, Err, Sch>>,
  release: Release,
  scheduler: Sch,
  kind: &'static str,
}

struct CoreState<Item, Err, Sch> {
  observers: Subscribers<Arc<ScheduledObserver<Item, Err, Sch>>>,
  buffer: ReplayBuffer<Item>,
  terminal: Option<Notification<Item, Err>>,
}

impl<Item, Err, Sch> SubjectCore<Item, Err, Sch>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  Sch: Scheduler,
{
  pub(crate) fn new(
    kind: &'static str, config: ReplayConfig, release: Release, scheduler: Sch,
  ) -> Self {
    Self {
      state: Mutex::new(CoreState {
        observers: Subscribers::default(),
        buffer: ReplayBuffer::new(config),
        terminal: None,
      }),
      release,
      scheduler,
      kind,
    }
  }

  /// Records `value` as already published, without anyone to deliver it to.
  pub(crate) fn seed(self, value: Item) -> Self {
    let now = self.scheduler.now();
    lock(&self.state).buffer.push(now, value);
    self
  }

  pub(crate) fn next(&self, value: Item) {
    let observers = {
      let mut state = lock(&self.state);
      if state.terminal.is_some() {
        return;
      }
      let now = self.scheduler.now();
      if self.release == Release::OnComplete {
        state.buffer.push(now, value);
        return;
      }
      if state.buffer.retains() {
        state.buffer.push(now, value.clone());
      }
      let observers = state.observers.snapshot();
      broadcast(&observers, Notification::Next(value));
      observers
    };
    activate(&observers);
  }

  pub(crate) fn error(&self, err: Err) { self.terminate(Notification::Error(err)) }

  pub(crate) fn complete(&self) { self.terminate(Notification::Completed) }

  fn terminate(&self, terminal: Notification<Item, Err>) {
    let observers = {
      let mut state = lock(&self.state);
      if state.terminal.is_some() {
        return;
      }
      let observers = state.observers.take_all();
      if self.release == Release::OnComplete && matches!(terminal, Notification::Completed) {
        if let Some(value) = state.buffer.last() {
          broadcast(&observers, Notification::Next(value.clone()));
        }
      }
      broadcast(&observers, terminal.clone());
      state.terminal = Some(terminal);
      observers
    };
    debug!(kind = self.kind, observers = observers.len(), "subject terminated");
    activate(&observers);
  }

  pub(crate) fn subscribe(
    self: &Arc<Self>, observer: BoxObserver<Item, Err>,
  ) -> SubjectSubscription<Item, Err, Sch> {
    let scheduled = ScheduledObserver::new(observer, self.scheduler.clone());
    let id = {
      let mut state = lock(&self.state);
      let now = self.scheduler.now();
      state.buffer.trim(now);
      match self.release {
        Release::Live => {
          for value in state.buffer.values() {
            scheduled.enqueue(Notification::Next(value.clone()));
          }
        }
        Release::OnComplete => {
          if matches!(state.terminal, Some(Notification::Completed)) {
            if let Some(value) = state.buffer.last() {
              scheduled.enqueue(Notification::Next(value.clone()));
            }
          }
        }
      }
      match &state.terminal {
        Some(terminal) => {
          scheduled.enqueue(terminal.clone());
          None
        }
        None => Some(state.observers.add(scheduled.clone())),
      }
    };
    trace!(kind = self.kind, terminated = id.is_none(), "observer subscribed");
    scheduled.ensure_active();
    SubjectSubscription::new(Arc::downgrade(self), scheduled, id)
  }

  pub(crate) fn remove(&self, id: usize) { lock(&self.state).observers.remove(id); }

  pub(crate) fn observer_count(&self) -> usize { lock(&self.state).observers.len() }

  pub(crate) fn is_terminated(&self) -> bool { lock(&self.state).terminal.is_some() }

  /// The most recent buffered value.
  pub(crate) fn latest(&self) -> Option<Item> { lock(&self.state).buffer.last().cloned() }

  /// The most recent value, once the subject completed.
  pub(crate) fn completed_value(&self) -> Option<Item> {
    let state = lock(&self.state);
    match state.terminal {
      Some(Notification::Completed) => state.buffer.last().cloned(),
      _ => None,
    }
  }
}

/// Queues `notification` on every observer, cloning for all but the last.
fn broadcast<Item, Err, Sch>(
  observers: &Observers<Item, Err, Sch>, notification: Notification<Item, Err>,
)
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  Sch: Scheduler,
{
  if let Some(((_, last), rest)) = observers.split_last() {
    for (_, observer) in rest {
      observer.enqueue(notification.clone());
    }
    last.enqueue(notification);
  }
}

fn activate<Item, Err, Sch>(observers: &Observers<Item, Err, Sch>)
where
  Item: Send + 'static,
  Err: Send + 'static,
  Sch: Scheduler,
{
  for (_, observer) in observers.iter() {
    observer.ensure_active();
  }
}
