use super::{BoxSubscription, SubscriptionLike};
use crate::rc::{MutArc, RcDeref, RcDerefMut};

/// A single-slot subscription whose resource can be filled in later.
///
/// Used when a subscription must be handed out before the resource it guards
/// exists. Setting a resource into a slot that was already disposed releases
/// the resource immediately, so a resource is never leaked by a
/// set/unsubscribe race, and it is released exactly once.
#[derive(Clone, Default)]
pub struct ProxySubscription(MutArc<ProxyState>);

#[derive(Default)]
struct ProxyState {
  closed: bool,
  inner: Option<BoxSubscription>,
}

impl ProxySubscription {
  /// Stores `subscription` in the slot.
  ///
  /// Returns the previously stored resource, which the caller now owns and
  /// has not been released. If the slot is already disposed, `subscription`
  /// is released before returning `None`.
  pub fn set<U>(&self, subscription: U) -> Option<BoxSubscription>
  where
    U: SubscriptionLike + Send + Sync + 'static,
  {
    let mut subscription = subscription;
    {
      let mut state = self.0.rc_deref_mut();
      if !state.closed {
        return state.inner.replace(Box::new(subscription));
      }
    }
    subscription.unsubscribe();
    None
  }

  /// Returns true if both handles share a slot.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { self.0.ptr_eq(&other.0) }
}

impl SubscriptionLike for ProxySubscription {
  fn unsubscribe(&mut self) {
    let inner = {
      let mut state = self.0.rc_deref_mut();
      if state.closed {
        return;
      }
      state.closed = true;
      state.inner.take()
    };
    if let Some(mut inner) = inner {
      inner.unsubscribe();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}
