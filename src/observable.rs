//! Observables: lazy push-based sources.
//!
//! An observable does nothing until it is subscribed. Subscribing hands it
//! an observer and returns a subscription that detaches the observer again.

use crate::{
  observer::{Observer, ObserverAll, ObserverErr, ObserverNext},
  subscription::{SubscriptionLike, SubscriptionWrapper},
};

mod connectable_observable;
mod create;
pub use connectable_observable::{ConnectableObservable, Connection};
pub use create::{create, try_create, CreateSubscription, ObservableFn, Subscriber};

/// A source that can deliver its notifications to an `O`.
pub trait Observable<Item, Err, O>
where
  O: Observer<Item, Err>,
{
  /// A type implementing [`SubscriptionLike`]
  type Unsub: SubscriptionLike;

  fn actual_subscribe(self, observer: O) -> Self::Unsub;
}

/// Subscription helpers for observables.
pub trait ObservableExt<Item, Err>: Sized {
  /// Invokes an execution of an Observable and registers a handler for the
  /// values it emits. Errors and completion are ignored.
  fn subscribe<N>(
    self, next: N,
  ) -> SubscriptionWrapper<<Self as Observable<Item, Err, ObserverNext<N>>>::Unsub>
  where
    N: FnMut(Item),
    Self: Observable<Item, Err, ObserverNext<N>>,
  {
    SubscriptionWrapper(self.actual_subscribe(ObserverNext::new(next)))
  }

  /// Like [`ObservableExt::subscribe`], with an error handler.
  fn subscribe_err<N, E>(
    self, next: N, error: E,
  ) -> SubscriptionWrapper<<Self as Observable<Item, Err, ObserverErr<N, E>>>::Unsub>
  where
    N: FnMut(Item),
    E: FnMut(Err),
    Self: Observable<Item, Err, ObserverErr<N, E>>,
  {
    SubscriptionWrapper(self.actual_subscribe(ObserverErr::new(next, error)))
  }

  /// Registers handlers for every kind of notification.
  ///
  /// * `error`: A handler for a terminal event resulting from an error.
  /// * `complete`: A handler for a terminal event resulting from successful
  ///   completion.
  fn subscribe_all<N, E, C>(
    self, next: N, error: E, complete: C,
  ) -> SubscriptionWrapper<<Self as Observable<Item, Err, ObserverAll<N, E, C>>>::Unsub>
  where
    N: FnMut(Item),
    E: FnMut(Err),
    C: FnMut(),
    Self: Observable<Item, Err, ObserverAll<N, E, C>>,
  {
    SubscriptionWrapper(self.actual_subscribe(ObserverAll::new(next, error, complete)))
  }

  /// Subscribes an observer value.
  fn subscribe_with<O>(
    self, observer: O,
  ) -> SubscriptionWrapper<<Self as Observable<Item, Err, O>>::Unsub>
  where
    O: Observer<Item, Err>,
    Self: Observable<Item, Err, O>,
  {
    SubscriptionWrapper(self.actual_subscribe(observer))
  }

  /// Shares one subscription to this source between every subscriber, once
  /// [`ConnectableObservable::connect`] is called.
  fn publish(self) -> ConnectableObservable<Self, Item, Err>
  where
    Self: Clone,
    Item: Clone + Send + 'static,
    Err: Clone + Send + 'static,
  {
    ConnectableObservable::new(self)
  }
}
