use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use tracing::debug;

use super::{BoxSubscription, SubscriptionLike};
use crate::rc::{MutArc, RcDeref, RcDerefMut};

/// Keeps a resource alive until the owner and every outstanding
/// [`RefCountHandle`] have been disposed.
///
/// The resource is released exactly once: by whichever of those disposals
/// comes last.
#[derive(Clone)]
pub struct RefCountSubscription(MutArc<Inner>);

struct Inner {
  primary_closed: bool,
  count: usize,
  resource: Option<BoxSubscription>,
}

/// A dependent reference handed out by [`RefCountSubscription::handle`].
///
/// Clones share one reference; disposing any of them releases it.
#[derive(Clone)]
pub struct RefCountHandle {
  parent: Option<MutArc<Inner>>,
  released: Arc<AtomicBool>,
}

impl RefCountSubscription {
  pub fn new<S>(resource: S) -> Self
  where
    S: SubscriptionLike + Send + Sync + 'static,
  {
    Self(MutArc::own(Inner {
      primary_closed: false,
      count: 0,
      resource: Some(Box::new(resource)),
    }))
  }

  /// Takes an extra reference on the resource.
  ///
  /// Once the owner has been disposed the returned handle is already closed
  /// and holds nothing.
  pub fn handle(&self) -> RefCountHandle {
    let mut inner = self.0.rc_deref_mut();
    if inner.primary_closed {
      return RefCountHandle { parent: None, released: Arc::new(AtomicBool::new(true)) };
    }
    inner.count += 1;
    RefCountHandle { parent: Some(self.0.clone()), released: Arc::new(AtomicBool::new(false)) }
  }

  /// Number of live dependent handles.
  pub fn handle_count(&self) -> usize { self.0.rc_deref().count }
}

impl SubscriptionLike for RefCountSubscription {
  fn unsubscribe(&mut self) {
    let resource = {
      let mut inner = self.0.rc_deref_mut();
      if inner.primary_closed {
        return;
      }
      inner.primary_closed = true;
      if inner.count == 0 {
        inner.resource.take()
      } else {
        None
      }
    };
    release(resource);
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.rc_deref().primary_closed }
}

impl SubscriptionLike for RefCountHandle {
  fn unsubscribe(&mut self) {
    if self.released.swap(true, Ordering::AcqRel) {
      return;
    }
    let Some(parent) = &self.parent else { return };
    let resource = {
      let mut inner = parent.rc_deref_mut();
      inner.count -= 1;
      if inner.primary_closed && inner.count == 0 {
        inner.resource.take()
      } else {
        None
      }
    };
    release(resource);
  }

  #[inline]
  fn is_closed(&self) -> bool { self.released.load(Ordering::Acquire) }
}

fn release(resource: Option<BoxSubscription>) {
  if let Some(mut resource) = resource {
    debug!("ref-counted resource released");
    resource.unsubscribe();
  }
}
