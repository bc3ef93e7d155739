use std::sync::Arc;

use super::{
  replay_buffer::ReplayConfig,
  subject_core::{Release, SubjectCore},
};
use crate::scheduler::{CurrentThreadScheduler, Scheduler};

/// A subject that replays buffered values to every new subscriber.
///
/// How much is kept is set by a [`ReplayConfig`]: a count limit, a time
/// window measured with the subject's scheduler clock, or both. A subscriber
/// first receives the values still inside those limits, then live values.
/// After termination it receives the buffered values followed by the
/// terminal notification.
///
/// ```rust
/// use rxcore::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let mut subject = ReplaySubject::<i32, ()>::new(ReplayConfig::unbounded().with_buffer_size(2));
/// subject.next(1);
/// subject.next(2);
/// subject.next(3);
///
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// subject.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));
/// subject.next(4);
/// assert_eq!(*seen.lock().unwrap(), vec![2, 3, 4]);
/// ```
pub struct ReplaySubject<Item, Err, Sch = CurrentThreadScheduler> {
  core: Arc<SubjectCore<Item, Err, Sch>>,
}

impl<Item, Err> ReplaySubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  pub fn new(config: ReplayConfig) -> Self { Self::with_scheduler(config, CurrentThreadScheduler) }

  /// A subject replaying everything it has seen.
  pub fn unbounded() -> Self { Self::new(ReplayConfig::unbounded()) }
}

impl<Item, Err, Sch> ReplaySubject<Item, Err, Sch>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  Sch: Scheduler,
{
  pub fn with_scheduler(config: ReplayConfig, scheduler: Sch) -> Self {
    Self { core: Arc::new(SubjectCore::new("replay", config, Release::Live, scheduler)) }
  }
}

impl_subject!(ReplaySubject);

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    prelude::*,
    rc::{MutArc, RcDeref},
    subject::test_util::recorder,
  };
  use std::panic::{self, AssertUnwindSafe};

  #[test]
  fn late_subscriber_gets_last_values_then_live() {
    let log = MutArc::own(vec![]);
    let mut subject = ReplaySubject::<i32, ()>::new(ReplayConfig::unbounded().with_buffer_size(2));
    for v in 1..=3 {
      subject.next(v);
    }
    subject.clone().subscribe_with(recorder(&log));
    subject.next(4);
    assert_eq!(*log.rc_deref(), vec!["2", "3", "4"]);
  }

  #[test]
  fn unbounded_replays_everything_and_terminal() {
    let log = MutArc::own(vec![]);
    let mut subject = ReplaySubject::<i32, &'static str>::unbounded();
    for v in 1..=3 {
      subject.next(v);
    }
    subject.error("failed");
    subject.next(9);
    subject.clone().subscribe_with(recorder(&log));
    assert_eq!(*log.rc_deref(), vec!["1", "2", "3", "error \"failed\""]);
  }

  #[test]
  fn window_drops_stale_values() {
    let scheduler = TestScheduler::new();
    let config = ReplayConfig::unbounded().with_window(Duration::from_secs(1));
    let mut subject = ReplaySubject::<&str, (), _>::with_scheduler(config, scheduler.clone());
    subject.next("stale");
    scheduler.advance_by(Duration::from_millis(600));
    subject.next("fresh");
    scheduler.advance_by(Duration::from_millis(500));

    let log = MutArc::own(vec![]);
    subject.clone().subscribe_with(recorder(&log));
    assert!(log.rc_deref().is_empty());
    scheduler.flush();
    assert_eq!(*log.rc_deref(), vec!["\"fresh\""]);
  }

  #[test]
  fn delivery_waits_for_its_scheduler() {
    let scheduler = TestScheduler::new();
    let config = ReplayConfig::unbounded();
    let mut subject = ReplaySubject::<i32, (), _>::with_scheduler(config, scheduler.clone());
    let log = MutArc::own(vec![]);
    subject.clone().subscribe_with(recorder(&log));
    subject.next(1);
    subject.complete();
    assert!(log.rc_deref().is_empty());
    scheduler.flush();
    assert_eq!(*log.rc_deref(), vec!["1", "complete"]);
  }

  #[test]
  fn unsubscribe_drops_queued_values() {
    let scheduler = TestScheduler::new();
    let config = ReplayConfig::unbounded();
    let mut subject = ReplaySubject::<i32, (), _>::with_scheduler(config, scheduler.clone());
    subject.next(1);
    let log = MutArc::own(vec![]);
    let mut subscription = subject.clone().subscribe_with(recorder(&log));
    subscription.unsubscribe();
    scheduler.flush();
    assert!(log.rc_deref().is_empty());
    assert_eq!(subject.observer_count(), 0);
  }

  #[test]
  fn subscriber_survives_unwind_of_the_running_task() {
    let log = MutArc::own(vec![]);
    let mut subject = ReplaySubject::<i32, ()>::unbounded();
    let (mut c_subject, c_log) = (subject.clone(), log.clone());
    let result = panic::catch_unwind(AssertUnwindSafe(move || {
      CurrentThreadScheduler.schedule(
        Task::once(move || {
          c_subject.clone().subscribe_with(recorder(&c_log));
          c_subject.next(1);
          panic!("task failed");
        }),
        None,
      );
    }));
    assert!(result.is_err());

    subject.next(2);
    subject.next(3);
    assert_eq!(*log.rc_deref(), vec!["1", "2", "3"]);
    assert_eq!(subject.observer_count(), 1);
  }
}
