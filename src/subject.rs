//! Subjects: values that are both an observer and an observable.
//!
//! | Type | Late subscribers receive |
//! |------|--------------------------|
//! | [`Subject`] | only later values, or the terminal if already terminated |
//! | [`ReplaySubject`] | the buffered values (bounded by [`ReplayConfig`]), then live ones |
//! | [`BehaviorSubject`] | the latest value (or the seed), then live ones |
//! | [`AsyncSubject`] | nothing until completion, then the last value and `complete` |
//!
//! All four share one engine. A subject handle is a cheap `Clone`; every
//! clone feeds and serves the same observers. Notifications published from
//! several threads reach each observer in one order, the order in which the
//! subject accepted them. Delivery to each observer goes through the
//! subject's scheduler, one notification at a time, so an observer that
//! publishes back into the subject or unsubscribes from inside a callback
//! never re-enters itself.

macro_rules! impl_subject {
  ($name:ident) => {
    impl<Item, Err, Sch> Clone for $name<Item, Err, Sch> {
      fn clone(&self) -> Self { Self { core: self.core.clone() } }
    }

    impl<Item, Err, Sch> $name<Item, Err, Sch>
    where
      Item: Clone + Send + 'static,
      Err: Clone + Send + 'static,
      Sch: $crate::scheduler::Scheduler,
    {
      /// The number of observers currently attached.
      pub fn observer_count(&self) -> usize { self.core.observer_count() }

      /// Whether `error` or `complete` has been received.
      pub fn is_terminated(&self) -> bool { self.core.is_terminated() }
    }

    impl<Item, Err, Sch> $crate::observer::Observer<Item, Err> for $name<Item, Err, Sch>
    where
      Item: Clone + Send + 'static,
      Err: Clone + Send + 'static,
      Sch: $crate::scheduler::Scheduler,
    {
      #[inline]
      fn next(&mut self, value: Item) { self.core.next(value) }

      #[inline]
      fn error(&mut self, err: Err) { self.core.error(err) }

      #[inline]
      fn complete(&mut self) { self.core.complete() }

      #[inline]
      fn is_finished(&self) -> bool { self.core.is_terminated() }
    }

    impl<Item, Err, Sch, O> $crate::observable::Observable<Item, Err, O> for $name<Item, Err, Sch>
    where
      Item: Clone + Send + 'static,
      Err: Clone + Send + 'static,
      Sch: $crate::scheduler::Scheduler,
      O: $crate::observer::Observer<Item, Err> + Send + 'static,
    {
      type Unsub = $crate::subject::SubjectSubscription<Item, Err, Sch>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        self.core.subscribe(Box::new(observer))
      }
    }

    impl<Item, Err, Sch> $crate::observable::ObservableExt<Item, Err> for $name<Item, Err, Sch> {}
  };
}

mod async_subject;
mod behavior_subject;
mod publish_subject;
mod replay_buffer;
mod replay_subject;
mod scheduled_observer;
mod subject_core;
mod subject_subscription;
mod subscribers;

pub use async_subject::AsyncSubject;
pub use behavior_subject::BehaviorSubject;
pub use publish_subject::Subject;
pub use replay_buffer::ReplayConfig;
pub use replay_subject::ReplaySubject;
pub use subject_subscription::SubjectSubscription;
