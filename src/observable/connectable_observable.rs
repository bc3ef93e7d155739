use tracing::debug;

use super::{Observable, ObservableExt};
use crate::{
  observer::Observer,
  rc::{MutArc, RcDeref, RcDerefMut},
  scheduler::ImmediateScheduler,
  subject::{Subject, SubjectSubscription},
  subscription::{ProxySubscription, SubscriptionLike},
};

/// A source shared through a [`Subject`], which only starts once
/// [`connect`](ConnectableObservable::connect) is called.
///
/// Subscribing attaches to the subject, so observers can be in place before
/// the source produces anything. At most one subscription to the source is
/// live at a time: `connect` while connected hands back the existing
/// connection, and disposing that connection lets the next `connect`
/// subscribe again.
///
/// ```rust
/// use rxcore::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(vec![]));
/// let published = observable::create(|mut s: Subscriber<i32, ()>| {
///   s.next(1);
///   s.next(2);
/// })
/// .publish();
///
/// for _ in 0..2 {
///   let seen = seen.clone();
///   published.clone().subscribe(move |v| seen.lock().unwrap().push(v));
/// }
/// published.connect();
/// assert_eq!(*seen.lock().unwrap(), vec![1, 1, 2, 2]);
/// ```
pub struct ConnectableObservable<S, Item, Err> {
  source: S,
  subject: Subject<Item, Err>,
  connection: MutArc<Option<ProxySubscription>>,
}

impl<S: Clone, Item, Err> Clone for ConnectableObservable<S, Item, Err> {
  fn clone(&self) -> Self {
    Self {
      source: self.source.clone(),
      subject: self.subject.clone(),
      connection: self.connection.clone(),
    }
  }
}

impl<S, Item, Err> ConnectableObservable<S, Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  pub fn new(source: S) -> Self {
    Self { source, subject: Subject::new(), connection: MutArc::own(None) }
  }

  /// Whether a connection made by [`connect`](Self::connect) is live.
  pub fn is_connected(&self) -> bool {
    self.connection.rc_deref().as_ref().is_some_and(|c| !c.is_closed())
  }

  /// Subscribes the shared subject to the source, unless already connected.
  pub fn connect(&self) -> Connection
  where
    S: Observable<Item, Err, Subject<Item, Err>> + Clone,
    S::Unsub: Send + Sync + 'static,
  {
    let (upstream, fresh) = {
      let mut connection = self.connection.rc_deref_mut();
      match connection.as_ref() {
        Some(live) if !live.is_closed() => (live.clone(), false),
        _ => {
          let upstream = ProxySubscription::default();
          *connection = Some(upstream.clone());
          (upstream, true)
        }
      }
    };
    if fresh {
      debug!(observers = self.subject.observer_count(), "connectable connected");
      upstream.set(self.source.clone().actual_subscribe(self.subject.clone()));
    }
    Connection { upstream, state: self.connection.clone() }
  }
}

/// The subscription returned by [`ConnectableObservable::connect`].
///
/// Disposing it detaches the shared subject from the source.
#[derive(Clone)]
pub struct Connection {
  upstream: ProxySubscription,
  state: MutArc<Option<ProxySubscription>>,
}

impl SubscriptionLike for Connection {
  fn unsubscribe(&mut self) {
    if self.upstream.is_closed() {
      return;
    }
    self.upstream.unsubscribe();
    let mut state = self.state.rc_deref_mut();
    if state.as_ref().is_some_and(|s| s.ptr_eq(&self.upstream)) {
      *state = None;
    }
    debug!("connectable disconnected");
  }

  #[inline]
  fn is_closed(&self) -> bool { self.upstream.is_closed() }
}

impl<S, Item, Err, O> Observable<Item, Err, O> for ConnectableObservable<S, Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  O: Observer<Item, Err> + Send + 'static,
{
  type Unsub = SubjectSubscription<Item, Err, ImmediateScheduler>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.subject.actual_subscribe(observer) }
}

impl<S, Item, Err> ObservableExt<Item, Err> for ConnectableObservable<S, Item, Err> {}
