use std::{
  collections::VecDeque,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
  },
  thread,
};

use super::Observer;
use crate::{notification::Notification, rc::lock};

/// Guards an observer so that it sees at most one terminal notification and
/// nothing after it, whichever threads the notifications come from.
///
/// The first terminal call wins; later `next`, `error` and `complete` calls
/// are dropped. Notifications are delivered one at a time and no lock is held
/// while the inner observer runs. A call arriving while another delivery is in
/// progress, from another thread or from inside the callback itself, is queued
/// and delivered by the caller already delivering, in arrival order.
pub struct SafeObserver<Item, Err, O> {
  inner: Arc<SafeInner<Item, Err, O>>,
}

struct SafeInner<Item, Err, O> {
  stopped: AtomicBool,
  delivery: Mutex<Delivery<Item, Err, O>>,
}

struct Delivery<Item, Err, O> {
  observer: Option<O>,
  pending: VecDeque<Notification<Item, Err>>,
  draining: bool,
}

impl<Item, Err, O> Clone for SafeObserver<Item, Err, O> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<Item, Err, O> SafeObserver<Item, Err, O> {
  pub fn new(observer: O) -> Self {
    let delivery = Delivery { observer: Some(observer), pending: VecDeque::new(), draining: false };
    let inner = SafeInner { stopped: AtomicBool::new(false), delivery: Mutex::new(delivery) };
    Self { inner: Arc::new(inner) }
  }

  /// Drops every later notification along with anything still queued.
  /// Returns true if this call stopped the observer.
  pub fn stop(&self) -> bool {
    let stopped = !self.inner.stopped.swap(true, Ordering::AcqRel);
    lock(&self.inner.delivery).pending.clear();
    stopped
  }

  #[inline]
  pub fn is_stopped(&self) -> bool { self.inner.stopped.load(Ordering::Acquire) }
}

impl<Item, Err, O> SafeObserver<Item, Err, O>
where
  O: Observer<Item, Err>,
{
  fn deliver(&self, notification: Notification<Item, Err>) {
    let mut delivery = lock(&self.inner.delivery);
    if !notification.is_terminal() && self.is_stopped() {
      return;
    }
    delivery.pending.push_back(notification);
    if delivery.draining {
      return;
    }
    delivery.draining = true;
    loop {
      let Some(notification) = delivery.pending.pop_front() else {
        delivery.draining = false;
        return;
      };
      let Some(mut observer) = delivery.observer.take() else {
        delivery.pending.clear();
        delivery.draining = false;
        return;
      };
      drop(delivery);

      let guard = UnwindGuard(&self.inner);
      let terminal = notification.is_terminal();
      notification.accept(&mut observer);
      drop(guard);
      let observer = (!terminal).then_some(observer);

      delivery = lock(&self.inner.delivery);
      if observer.is_none() {
        delivery.pending.clear();
      }
      delivery.observer = observer;
    }
  }
}

/// Stops the observer and releases the delivery slot if a callback panics.
struct UnwindGuard<'a, Item, Err, O>(&'a SafeInner<Item, Err, O>);

impl<Item, Err, O> Drop for UnwindGuard<'_, Item, Err, O> {
  fn drop(&mut self) {
    if thread::panicking() {
      self.0.stopped.store(true, Ordering::Release);
      let mut delivery = lock(&self.0.delivery);
      delivery.pending.clear();
      delivery.draining = false;
    }
  }
}

impl<Item, Err, O> Observer<Item, Err> for SafeObserver<Item, Err, O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.is_stopped() {
      return;
    }
    self.deliver(Notification::Next(value));
  }

  fn error(&mut self, err: Err) {
    if !self.inner.stopped.swap(true, Ordering::AcqRel) {
      self.deliver(Notification::Error(err));
    }
  }

  fn complete(&mut self) {
    if !self.inner.stopped.swap(true, Ordering::AcqRel) {
      self.deliver(Notification::Completed);
    }
  }

  #[inline]
  fn is_finished(&self) -> bool { self.is_stopped() }
}
