use crate::rc::{lock, MutArc, RcDeref, RcDerefMut};
use std::{
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
  },
};

mod composite;
mod dynamic;
mod proxy;
mod ref_count;

pub use composite::CompositeSubscription;
pub use dynamic::DynamicSubscriptions;
pub use proxy::ProxySubscription;
pub use ref_count::{RefCountHandle, RefCountSubscription};

/// Subscription returns from `Observable.subscribe(Subscriber)` to allow
/// unsubscribing.
///
/// Unsubscribing is idempotent: the first call releases the underlying
/// resource, every later call is a no-op.
pub trait SubscriptionLike {
  /// This allows deregistering a stream before it has finished receiving all
  /// events (i.e. before `complete` is called).
  fn unsubscribe(&mut self);

  fn is_closed(&self) -> bool;
}

/// A type-erased subscription that can be released from any thread.
pub type BoxSubscription = Box<dyn SubscriptionLike + Send + Sync>;

impl Debug for dyn SubscriptionLike + Send + Sync {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("dyn SubscriptionLike").field("is_closed", &self.is_closed()).finish()
  }
}

/// An empty subscription, always closed.
impl SubscriptionLike for () {
  #[inline]
  fn unsubscribe(&mut self) {}
  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<T: ?Sized> SubscriptionLike for Box<T>
where
  T: SubscriptionLike,
{
  #[inline]
  fn unsubscribe(&mut self) {
    let s = &mut **self;
    s.unsubscribe()
  }

  #[inline]
  fn is_closed(&self) -> bool {
    let s = &**self;
    s.is_closed()
  }
}

impl<T: SubscriptionLike> SubscriptionLike for Option<T> {
  #[inline]
  fn unsubscribe(&mut self) {
    if let Some(s) = self {
      s.unsubscribe()
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.as_ref().map_or(true, SubscriptionLike::is_closed) }
}

impl<T: SubscriptionLike> SubscriptionLike for MutArc<T> {
  #[inline]
  fn unsubscribe(&mut self) { self.rc_deref_mut().unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.rc_deref().is_closed() }
}

/// A subscription that only records whether it was disposed.
#[derive(Clone, Debug, Default)]
pub struct SingleSubscription(Arc<AtomicBool>);

impl SubscriptionLike for SingleSubscription {
  #[inline]
  fn unsubscribe(&mut self) { self.0.store(true, Ordering::Release) }

  #[inline]
  fn is_closed(&self) -> bool { self.0.load(Ordering::Acquire) }
}

/// Runs a teardown action exactly once, on the first `unsubscribe`.
///
/// Clones share the same action.
pub struct ClosureSubscription<F>(Arc<Mutex<Option<F>>>);

impl<F: FnOnce()> ClosureSubscription<F> {
  pub fn new(teardown: F) -> Self { Self(Arc::new(Mutex::new(Some(teardown)))) }
}

impl<F> Clone for ClosureSubscription<F> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<F: FnOnce()> SubscriptionLike for ClosureSubscription<F> {
  fn unsubscribe(&mut self) {
    let teardown = lock(&self.0).take();
    if let Some(teardown) = teardown {
      teardown();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { lock(&self.0).is_none() }
}

/// Wrapper around a subscription which provides the
/// `unsubscribe_when_dropped()` method.
pub struct SubscriptionWrapper<T: SubscriptionLike>(pub(crate) T);

impl<T: SubscriptionLike> SubscriptionWrapper<T> {
  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard<T> { SubscriptionGuard(self.0) }

  /// Consumes this wrapper and returns the underlying subscription.
  pub fn into_inner(self) -> T { self.0 }
}

impl<T: SubscriptionLike> SubscriptionLike for SubscriptionWrapper<T> {
  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
  #[inline]
  fn unsubscribe(&mut self) { self.0.unsubscribe() }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope.
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard<T: SubscriptionLike>(pub(crate) T);

impl<T: SubscriptionLike> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(subscription) }
}

impl<T: SubscriptionLike> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}
