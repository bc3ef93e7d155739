use std::sync::Arc;

use super::{
  replay_buffer::ReplayConfig,
  subject_core::{Release, SubjectCore},
};
use crate::scheduler::{ImmediateScheduler, Scheduler};

/// A hot multicast subject without history.
///
/// Observers receive what is published after they subscribe. An observer
/// subscribing after termination receives the terminal notification right
/// away.
pub struct Subject<Item, Err, Sch = ImmediateScheduler> {
  core: Arc<SubjectCore<Item, Err, Sch>>,
}

impl<Item, Err> Subject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  pub fn new() -> Self { Self::with_scheduler(ImmediateScheduler) }
}

impl<Item, Err> Default for Subject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn default() -> Self { Self::new() }
}

impl<Item, Err, Sch> Subject<Item, Err, Sch>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  Sch: Scheduler,
{
  /// A subject delivering to its observers through `scheduler`.
  pub fn with_scheduler(scheduler: Sch) -> Self {
    let config = ReplayConfig::unbounded().with_buffer_size(0);
    Self { core: Arc::new(SubjectCore::new("subject", config, Release::Live, scheduler)) }
  }
}

impl_subject!(Subject);

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    prelude::*,
    rc::{MutArc, RcDeref, RcDerefMut},
    subject::test_util::recorder,
  };
  use std::{
    sync::{Arc, Mutex},
    thread,
  };

  #[test]
  fn emit_to_current_observers() {
    let log = MutArc::own(vec![]);
    let mut subject = Subject::<i32, ()>::new();
    subject.next(0);
    subject.clone().subscribe_with(recorder(&log));
    subject.next(1);
    subject.next(2);
    subject.complete();
    subject.next(3);
    assert_eq!(*log.rc_deref(), vec!["1", "2", "complete"]);
    assert!(subject.is_terminated());
    assert_eq!(subject.observer_count(), 0);
  }

  #[test]
  fn late_subscriber_receives_terminal() {
    let log = MutArc::own(vec![]);
    let mut subject = Subject::<i32, &'static str>::new();
    subject.next(1);
    subject.error("boom");
    let subscription = subject.clone().subscribe_with(recorder(&log));
    assert_eq!(*log.rc_deref(), vec!["error \"boom\""]);
    assert!(subscription.is_closed());
  }

  #[test]
  fn unsubscribe_detaches() {
    let log = MutArc::own(vec![]);
    let mut subject = Subject::<i32, ()>::new();
    let mut subscription = subject.clone().subscribe_with(recorder(&log));
    assert_eq!(subject.observer_count(), 1);
    subject.next(1);
    subscription.unsubscribe();
    assert_eq!(subject.observer_count(), 0);
    subject.next(2);
    assert_eq!(*log.rc_deref(), vec!["1"]);
  }

  #[test]
  fn unsubscribe_from_inside_callback() {
    let seen = MutArc::own(vec![]);
    let mut subject = Subject::<i32, ()>::new();
    type Handle = SubscriptionWrapper<SubjectSubscription<i32, (), ImmediateScheduler>>;
    let slot: MutArc<Option<Handle>> = MutArc::own(None);
    let (c_seen, c_slot) = (seen.clone(), slot.clone());
    let subscription = subject.clone().subscribe(move |v| {
      c_seen.rc_deref_mut().push(v);
      if let Some(s) = c_slot.rc_deref_mut().as_mut() {
        s.unsubscribe();
      }
    });
    *slot.rc_deref_mut() = Some(subscription);
    subject.next(1);
    subject.next(2);
    assert_eq!(*seen.rc_deref(), vec![1]);
    assert_eq!(subject.observer_count(), 0);
  }

  #[test]
  fn publish_from_inside_callback_keeps_order() {
    let first = MutArc::own(vec![]);
    let second = MutArc::own(vec![]);
    let subject = Subject::<i32, ()>::new();
    let (c_first, mut feedback) = (first.clone(), subject.clone());
    subject.clone().subscribe(move |v| {
      c_first.rc_deref_mut().push(v);
      if v < 3 {
        feedback.next(v + 1);
      }
    });
    let c_second = second.clone();
    subject.clone().subscribe(move |v| c_second.rc_deref_mut().push(v));

    subject.clone().next(1);
    assert_eq!(*first.rc_deref(), vec![1, 2, 3]);
    assert_eq!(*second.rc_deref(), vec![1, 2, 3]);
  }

  #[test]
  fn subscribe_from_inside_callback() {
    let late = MutArc::own(vec![]);
    let subject = Subject::<i32, ()>::new();
    let (source, c_late) = (subject.clone(), late.clone());
    let attached = Arc::new(Mutex::new(false));
    subject.clone().subscribe(move |_| {
      let mut attached = attached.lock().unwrap();
      if !*attached {
        *attached = true;
        let c_late = c_late.clone();
        source.clone().subscribe(move |v| c_late.rc_deref_mut().push(v));
      }
    });
    let mut subject = subject;
    subject.next(1);
    subject.next(2);
    assert_eq!(*late.rc_deref(), vec![2]);
  }

  #[test]
  fn concurrent_publishers_keep_per_thread_order() {
    let seen = Arc::new(Mutex::new(vec![]));
    let subject = Subject::<(usize, usize), ()>::new();
    let c_seen = seen.clone();
    subject.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));

    let handles: Vec<_> = (0..4)
      .map(|t| {
        let mut subject = subject.clone();
        thread::spawn(move || {
          for i in 0..500 {
            subject.next((t, i));
          }
        })
      })
      .collect();
    for h in handles {
      h.join().unwrap();
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2000);
    for t in 0..4 {
      let per_thread: Vec<_> = seen.iter().filter(|(s, _)| *s == t).map(|(_, i)| *i).collect();
      assert_eq!(per_thread, (0..500).collect::<Vec<_>>());
    }
  }

  #[test]
  fn racing_terminals_deliver_one() {
    for _ in 0..50 {
      let log = MutArc::own(vec![]);
      let subject = Subject::<(), &'static str>::new();
      subject.clone().subscribe_with(recorder(&log));
      let (mut a, mut b) = (subject.clone(), subject.clone());
      let t1 = thread::spawn(move || a.complete());
      let t2 = thread::spawn(move || b.error("late"));
      t1.join().unwrap();
      t2.join().unwrap();
      assert_eq!(log.rc_deref().len(), 1);
    }
  }
}
