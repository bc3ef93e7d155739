use std::marker::PhantomData;

use tracing::trace;

use super::{Observable, ObservableExt};
use crate::{
  observer::{BoxObserver, Observer, SafeObserver},
  scheduler::{CurrentThreadScheduler, Scheduler, Task},
  subscription::{ProxySubscription, SubscriptionLike},
};

/// Observable created from a subscribe function.
///
/// This struct is created by [`create`] and [`try_create`].
pub struct ObservableFn<F, Item, Err> {
  f: F,
  _marker: PhantomData<fn() -> (Item, Err)>,
}

impl<F: Clone, Item, Err> Clone for ObservableFn<F, Item, Err> {
  fn clone(&self) -> Self { Self { f: self.f.clone(), _marker: PhantomData } }
}

/// Creates an observable from a subscribe function.
///
/// `subscribe` runs once per subscription with a [`Subscriber`] to emit into
/// and returns the resource to release when the subscription ends. It runs
/// through the [`CurrentThreadScheduler`], so a subscription made from inside
/// another subscribe function starts after that one returns instead of
/// nesting on the stack.
///
/// The returned resource is released when the subscription is disposed, or
/// right after the subscriber receives `error` or `complete`; if that already
/// happened by the time `subscribe` returns, it is released immediately.
///
/// ```rust
/// use rxcore::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// observable::create(|mut subscriber: Subscriber<i32, ()>| {
///   subscriber.next(1);
///   subscriber.next(2);
///   subscriber.complete();
/// })
/// .subscribe(move |v| c_seen.lock().unwrap().push(v));
///
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// ```
pub fn create<F, Item, Err, U>(subscribe: F) -> ObservableFn<F, Item, Err>
where
  F: FnOnce(Subscriber<Item, Err>) -> U,
  U: SubscriptionLike,
{
  ObservableFn { f: subscribe, _marker: PhantomData }
}

/// Like [`create`], for subscribe functions that can fail before producing
/// their resource. An `Err` is delivered to the subscriber as `error`.
pub fn try_create<F, Item, Err, U>(
  subscribe: F,
) -> ObservableFn<impl FnOnce(Subscriber<Item, Err>) -> Option<U>, Item, Err>
where
  F: FnOnce(Subscriber<Item, Err>) -> Result<U, Err>,
  U: SubscriptionLike,
{
  create(move |subscriber: Subscriber<Item, Err>| {
    let mut on_error = subscriber.clone();
    match subscribe(subscriber) {
      Ok(resource) => Some(resource),
      Err(err) => {
        on_error.error(err);
        None
      }
    }
  })
}

/// The observer handed to a subscribe function.
///
/// Notifications go through a termination guard, so at most one terminal
/// reaches the downstream observer. After the terminal, or once the
/// subscription is disposed, everything is dropped and
/// [`SubscriptionLike::is_closed`] reports true; long-running producers
/// should check it to stop early. Clones share the same state and may emit
/// from other threads.
pub struct Subscriber<Item, Err> {
  observer: SafeObserver<Item, Err, BoxObserver<Item, Err>>,
  teardown: ProxySubscription,
}

impl<Item, Err> Clone for Subscriber<Item, Err> {
  fn clone(&self) -> Self {
    Self { observer: self.observer.clone(), teardown: self.teardown.clone() }
  }
}

impl<Item, Err> Observer<Item, Err> for Subscriber<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(&mut self, err: Err) {
    self.observer.error(err);
    self.teardown.unsubscribe();
  }

  fn complete(&mut self) {
    self.observer.complete();
    self.teardown.unsubscribe();
  }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_stopped() }
}

impl<Item, Err> SubscriptionLike for Subscriber<Item, Err> {
  fn unsubscribe(&mut self) {
    self.observer.stop();
    self.teardown.unsubscribe();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_stopped() }
}

/// The subscription returned by subscribing an [`ObservableFn`].
pub struct CreateSubscription<Item, Err>(Subscriber<Item, Err>);

impl<Item, Err> SubscriptionLike for CreateSubscription<Item, Err> {
  #[inline]
  fn unsubscribe(&mut self) { self.0.unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<F, Item, Err, U, O> Observable<Item, Err, O> for ObservableFn<F, Item, Err>
where
  F: FnOnce(Subscriber<Item, Err>) -> U + Send + 'static,
  U: SubscriptionLike + Send + Sync + 'static,
  O: Observer<Item, Err> + Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Unsub = CreateSubscription<Item, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let subscriber = Subscriber {
      observer: SafeObserver::new(Box::new(observer) as BoxObserver<Item, Err>),
      teardown: ProxySubscription::default(),
    };
    let handle = CreateSubscription(subscriber.clone());
    let f = self.f;
    CurrentThreadScheduler.schedule(
      Task::once(move || {
        if subscriber.is_closed() {
          trace!("subscription disposed before subscribe function ran");
          return;
        }
        let teardown = subscriber.teardown.clone();
        let resource = f(subscriber);
        teardown.set(resource);
      }),
      None,
    );
    handle
  }
}

impl<F, Item, Err> ObservableExt<Item, Err> for ObservableFn<F, Item, Err> {}
