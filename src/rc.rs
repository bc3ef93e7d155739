use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared read access to the value behind a reference-counted lock.
pub trait RcDeref {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a>;
}

/// Exclusive access to the value behind a reference-counted lock.
pub trait RcDerefMut {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a>;
}

/// `Arc<Mutex<T>>` with lock access that survives poisoning.
///
/// Every critical section in this crate only touches its own bookkeeping, so
/// a poisoned lock still guards consistent data and is simply re-entered.
#[derive(Default)]
pub struct MutArc<T>(Arc<Mutex<T>>);

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  /// Returns true if both handles point at the same allocation.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl<T> From<T> for MutArc<T> {
  #[inline]
  fn from(t: T) -> Self { Self::own(t) }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> RcDeref for MutArc<T> {
  type Target<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<T> RcDerefMut for MutArc<T> {
  type Target<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Locks a plain `Mutex`, recovering the guard if a previous holder panicked.
#[inline]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod test {
  use super::*;
  use std::{panic, thread};

  #[test]
  fn shared_mutation() {
    let counter = MutArc::own(0);
    let handles: Vec<_> = (0..4)
      .map(|_| {
        let counter = counter.clone();
        thread::spawn(move || {
          for _ in 0..100 {
            *counter.rc_deref_mut() += 1;
          }
        })
      })
      .collect();
    for h in handles {
      h.join().unwrap();
    }
    assert_eq!(*counter.rc_deref(), 400);
  }

  #[test]
  fn poisoned_lock_is_recovered() {
    let value = MutArc::own(1);
    let c_value = value.clone();
    let _ = panic::catch_unwind(panic::AssertUnwindSafe(move || {
      let _guard = c_value.rc_deref_mut();
      panic!("poison");
    }));
    *value.rc_deref_mut() += 1;
    assert_eq!(*value.rc_deref(), 2);
  }

  #[test]
  fn ptr_eq() {
    let a = MutArc::own(());
    let b = a.clone();
    assert!(a.ptr_eq(&b));
    assert!(!a.ptr_eq(&MutArc::own(())));
  }
}
