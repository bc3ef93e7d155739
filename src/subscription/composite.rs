use std::{
  any::Any,
  panic::{self, AssertUnwindSafe},
};

use smallvec::SmallVec;
use tracing::warn;

use super::{BoxSubscription, DynamicSubscriptions, SubscriptionLike};
use crate::rc::{MutArc, RcDeref, RcDerefMut};

/// A group of subscriptions disposed together.
///
/// Members can be added and removed by id at any time. Once the group is
/// disposed, anything added later is released on the spot. Members are always
/// released outside the group's lock; a panic from one member does not stop
/// the others from being released and is re-raised afterwards.
#[derive(Clone, Default)]
pub struct CompositeSubscription(MutArc<Inner>);

#[derive(Default)]
struct Inner {
  closed: bool,
  members: DynamicSubscriptions<BoxSubscription>,
}

impl CompositeSubscription {
  /// Adds a member and returns the id it can later be removed with.
  ///
  /// Returns `None` when the group is already disposed, in which case the
  /// member has been released, or when a group is added to itself.
  pub fn add<S>(&self, subscription: S) -> Option<usize>
  where
    S: SubscriptionLike + Send + Sync + 'static,
  {
    let mut subscription = subscription;
    if self.is_same(&subscription) {
      return None;
    }
    let mut inner = self.0.rc_deref_mut();
    if inner.closed {
      drop(inner);
      subscription.unsubscribe();
      return None;
    }
    let pruned = inner.members.take_where(|m| m.is_closed());
    let id = inner.members.add(Box::new(subscription));
    drop(inner);
    drop(pruned);
    Some(id)
  }

  /// Removes the member with `id` and releases it.
  ///
  /// Returns false if no such member is present.
  pub fn remove(&self, id: usize) -> bool {
    let member = self.0.rc_deref_mut().members.remove(id);
    match member {
      Some(mut member) => {
        member.unsubscribe();
        true
      }
      None => false,
    }
  }

  /// Releases all current members but keeps the group usable.
  pub fn clear(&self) {
    let members = self.0.rc_deref_mut().members.take_all();
    release_all(members);
  }

  #[inline]
  pub fn len(&self) -> usize { self.0.rc_deref().members.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.len() == 0 }

  fn is_same(&self, other: &dyn Any) -> bool {
    other.downcast_ref::<Self>().map_or(false, |other| self.0.ptr_eq(&other.0))
  }
}

impl SubscriptionLike for CompositeSubscription {
  fn unsubscribe(&mut self) {
    let members = {
      let mut inner = self.0.rc_deref_mut();
      if inner.closed {
        return;
      }
      inner.closed = true;
      inner.members.take_all()
    };
    release_all(members);
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

fn release_all(members: SmallVec<[BoxSubscription; 2]>) {
  let mut first_panic = None;
  for mut member in members {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| member.unsubscribe())) {
      warn!("member of a composite subscription panicked while unsubscribing");
      first_panic.get_or_insert(payload);
    }
  }
  if let Some(payload) = first_panic {
    panic::resume_unwind(payload);
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::subscription::{ClosureSubscription, SingleSubscription};
  use proptest::prelude::*;
  use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
  };

  #[test]
  fn unsubscribe_releases_members() {
    let mut composite = CompositeSubscription::default();
    let a = SingleSubscription::default();
    let b = SingleSubscription::default();
    composite.add(a.clone());
    composite.add(b.clone());
    assert_eq!(composite.len(), 2);

    composite.unsubscribe();
    assert!(a.is_closed());
    assert!(b.is_closed());
    assert!(composite.is_empty());
  }

  #[test]
  fn add_after_unsubscribe() {
    let mut composite = CompositeSubscription::default();
    composite.unsubscribe();
    let late = SingleSubscription::default();
    assert_eq!(composite.add(late.clone()), None);
    assert!(late.is_closed());
    assert_eq!(composite.len(), 0);
  }

  #[test]
  fn remove_releases_only_that_member() {
    let composite = CompositeSubscription::default();
    let a = SingleSubscription::default();
    let b = SingleSubscription::default();
    let id = composite.add(a.clone()).unwrap();
    composite.add(b.clone());

    assert!(composite.remove(id));
    assert!(!composite.remove(id));
    assert!(a.is_closed());
    assert!(!b.is_closed());
    assert_eq!(composite.len(), 1);
  }

  #[test]
  fn clear_keeps_group_open() {
    let composite = CompositeSubscription::default();
    let a = SingleSubscription::default();
    composite.add(a.clone());
    composite.clear();
    assert!(a.is_closed());
    assert!(!composite.is_closed());

    let b = SingleSubscription::default();
    composite.add(b.clone());
    assert!(!b.is_closed());
    assert_eq!(composite.len(), 1);
  }

  #[test]
  fn closed_members_are_pruned_on_add() {
    let composite = CompositeSubscription::default();
    let mut a = SingleSubscription::default();
    composite.add(a.clone());
    a.unsubscribe();
    composite.add(SingleSubscription::default());
    assert_eq!(composite.len(), 1);
  }

  #[test]
  fn adding_itself_is_ignored() {
    let composite = CompositeSubscription::default();
    assert_eq!(composite.add(composite.clone()), None);
    assert!(!composite.is_closed());
    assert!(composite.is_empty());
  }

  #[test]
  fn panicking_member_does_not_block_others() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut composite = CompositeSubscription::default();
    composite.add(ClosureSubscription::new(|| panic!("teardown failed")));
    let c_hits = hits.clone();
    composite.add(ClosureSubscription::new(move || {
      c_hits.fetch_add(1, Ordering::SeqCst);
    }));

    let result = panic::catch_unwind(AssertUnwindSafe(|| composite.unsubscribe()));
    assert!(result.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(composite.is_closed());
  }

  /// A member that looks at its group when dropped.
  struct InspectsGroupOnDrop {
    group: CompositeSubscription,
    closed: Arc<AtomicBool>,
    len_at_drop: Arc<AtomicUsize>,
  }

  impl SubscriptionLike for InspectsGroupOnDrop {
    fn unsubscribe(&mut self) { self.closed.store(true, Ordering::SeqCst); }

    fn is_closed(&self) -> bool { self.closed.load(Ordering::SeqCst) }
  }

  impl Drop for InspectsGroupOnDrop {
    fn drop(&mut self) { self.len_at_drop.store(self.group.len(), Ordering::SeqCst); }
  }

  #[test]
  fn pruned_members_drop_outside_the_lock() {
    let composite = CompositeSubscription::default();
    let closed = Arc::new(AtomicBool::new(false));
    let len_at_drop = Arc::new(AtomicUsize::new(usize::MAX));
    composite.add(InspectsGroupOnDrop {
      group: composite.clone(),
      closed: closed.clone(),
      len_at_drop: len_at_drop.clone(),
    });
    closed.store(true, Ordering::SeqCst);

    composite.add(SingleSubscription::default());
    assert_eq!(len_at_drop.load(Ordering::SeqCst), 1);
    assert_eq!(composite.len(), 1);
  }

  #[derive(Clone, Debug)]
  enum Op {
    Add,
    Remove(prop::sample::Index),
    CloseExternally(prop::sample::Index),
    Clear,
    Dispose,
  }

  fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
      3 => Just(Op::Add),
      2 => any::<prop::sample::Index>().prop_map(Op::Remove),
      1 => any::<prop::sample::Index>().prop_map(Op::CloseExternally),
      1 => Just(Op::Clear),
      1 => Just(Op::Dispose),
    ]
  }

  proptest! {
    // However adds, removals, external closes and disposals interleave, each
    // member is released exactly once by the time the group is disposed.
    #[test]
    fn members_released_once_in_any_order(ops in proptest::collection::vec(op(), 0..32)) {
      let mut composite = CompositeSubscription::default();
      let mut members: Vec<(Option<usize>, Box<dyn SubscriptionLike>, Arc<AtomicUsize>)> =
        Vec::new();
      let mut disposed = false;

      for op in ops {
        match op {
          Op::Add => {
            let releases = Arc::new(AtomicUsize::new(0));
            let c_releases = releases.clone();
            let member = ClosureSubscription::new(move || {
              c_releases.fetch_add(1, Ordering::SeqCst);
            });
            let id = composite.add(member.clone());
            prop_assert_eq!(id.is_none(), disposed);
            prop_assert_eq!(releases.load(Ordering::SeqCst), usize::from(disposed));
            members.push((id, Box::new(member), releases));
          }
          Op::Remove(idx) => {
            if members.is_empty() {
              continue;
            }
            let (id, _, releases) = &members[idx.index(members.len())];
            if let Some(id) = id {
              if composite.remove(*id) {
                prop_assert_eq!(releases.load(Ordering::SeqCst), 1);
              }
            }
          }
          Op::CloseExternally(idx) => {
            if members.is_empty() {
              continue;
            }
            let len = members.len();
            let (_, member, releases) = &mut members[idx.index(len)];
            member.unsubscribe();
            prop_assert_eq!(releases.load(Ordering::SeqCst), 1);
          }
          Op::Clear => composite.clear(),
          Op::Dispose => {
            composite.unsubscribe();
            disposed = true;
          }
        }
        for (_, _, releases) in &members {
          prop_assert!(releases.load(Ordering::SeqCst) <= 1);
        }
      }

      composite.unsubscribe();
      prop_assert!(composite.is_empty());
      for (_, member, releases) in &members {
        prop_assert!(member.is_closed());
        prop_assert_eq!(releases.load(Ordering::SeqCst), 1);
      }
    }
  }
}
