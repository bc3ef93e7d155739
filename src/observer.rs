//! Observer trait and implementations
//!
//! An observer consumes a stream: any number of `next` calls followed by at
//! most one terminal call, either `error` or `complete`.

use crate::rc::{MutArc, RcDeref, RcDerefMut};

mod safe_observer;
pub use safe_observer::SafeObserver;

/// The consumer of data in reactive programming.
pub trait Observer<Item, Err> {
  fn next(&mut self, value: Item);

  fn error(&mut self, err: Err);

  fn complete(&mut self);

  /// True once this observer will accept no more notifications.
  ///
  /// Sources may poll this to stop producing early.
  fn is_finished(&self) -> bool;
}

/// A type-erased observer that can be moved across threads.
pub type BoxObserver<Item, Err> = Box<dyn Observer<Item, Err> + Send>;

impl<Item, Err, T> Observer<Item, Err> for Box<T>
where
  T: Observer<Item, Err> + ?Sized,
{
  #[inline]
  fn next(&mut self, value: Item) { (**self).next(value) }

  #[inline]
  fn error(&mut self, err: Err) { (**self).error(err) }

  #[inline]
  fn complete(&mut self) { (**self).complete() }

  #[inline]
  fn is_finished(&self) -> bool { (**self).is_finished() }
}

/// A shared observer; every call holds the lock for its duration, which
/// serializes notifications coming from several threads.
impl<Item, Err, O> Observer<Item, Err> for MutArc<O>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) { self.rc_deref_mut().next(value) }

  #[inline]
  fn error(&mut self, err: Err) { self.rc_deref_mut().error(err) }

  #[inline]
  fn complete(&mut self) { self.rc_deref_mut().complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.rc_deref().is_finished() }
}

/// Helpers available on every observer.
pub trait ObserverExt<Item, Err>: Observer<Item, Err> {
  /// Forwards `Ok` as `next` and `Err` as `error`.
  fn next_result(&mut self, result: Result<Item, Err>) {
    match result {
      Ok(value) => self.next(value),
      Err(err) => self.error(err),
    }
  }
}

impl<Item, Err, O: Observer<Item, Err> + ?Sized> ObserverExt<Item, Err> for O {}

/// Observer built from a `next` closure; errors and completion only mark it
/// finished.
#[derive(Clone)]
pub struct ObserverNext<N> {
  next: N,
  is_stopped: bool,
}

impl<N> ObserverNext<N> {
  #[inline]
  pub fn new(next: N) -> Self { Self { next, is_stopped: false } }
}

impl<Item, Err, N> Observer<Item, Err> for ObserverNext<N>
where
  N: FnMut(Item),
{
  #[inline]
  fn next(&mut self, value: Item) {
    if !self.is_stopped {
      (self.next)(value);
    }
  }

  #[inline]
  fn error(&mut self, _err: Err) { self.is_stopped = true; }

  #[inline]
  fn complete(&mut self) { self.is_stopped = true; }

  #[inline]
  fn is_finished(&self) -> bool { self.is_stopped }
}

/// Observer built from `next` and `error` closures.
#[derive(Clone)]
pub struct ObserverErr<N, E> {
  next: N,
  error: E,
  is_stopped: bool,
}

impl<N, E> ObserverErr<N, E> {
  #[inline]
  pub fn new(next: N, error: E) -> Self { Self { next, error, is_stopped: false } }
}

impl<Item, Err, N, E> Observer<Item, Err> for ObserverErr<N, E>
where
  N: FnMut(Item),
  E: FnMut(Err),
{
  #[inline]
  fn next(&mut self, value: Item) {
    if !self.is_stopped {
      (self.next)(value);
    }
  }

  fn error(&mut self, err: Err) {
    if !self.is_stopped {
      self.is_stopped = true;
      (self.error)(err);
    }
  }

  #[inline]
  fn complete(&mut self) { self.is_stopped = true; }

  #[inline]
  fn is_finished(&self) -> bool { self.is_stopped }
}

/// Observer built from `next`, `error` and `complete` closures.
#[derive(Clone)]
pub struct ObserverAll<N, E, C> {
  next: N,
  error: E,
  complete: C,
  is_stopped: bool,
}

impl<N, E, C> ObserverAll<N, E, C> {
  #[inline]
  pub fn new(next: N, error: E, complete: C) -> Self {
    Self { next, error, complete, is_stopped: false }
  }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for ObserverAll<N, E, C>
where
  N: FnMut(Item),
  E: FnMut(Err),
  C: FnMut(),
{
  #[inline]
  fn next(&mut self, value: Item) {
    if !self.is_stopped {
      (self.next)(value);
    }
  }

  fn error(&mut self, err: Err) {
    if !self.is_stopped {
      self.is_stopped = true;
      (self.error)(err);
    }
  }

  fn complete(&mut self) {
    if !self.is_stopped {
      self.is_stopped = true;
      (self.complete)();
    }
  }

  #[inline]
  fn is_finished(&self) -> bool { self.is_stopped }
}
