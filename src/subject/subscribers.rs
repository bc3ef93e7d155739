use std::sync::Arc;

/// The observer list of a subject, published as immutable snapshots.
///
/// Readers take a snapshot (one reference-count bump) and iterate it without
/// any lock. Writers copy the list only while a snapshot is still held
/// elsewhere, so the common case of mutating an unshared list stays in
/// place.
pub(crate) struct Subscribers<Ob> {
  next_id: usize,
  list: Arc<Vec<(usize, Ob)>>,
}

impl<Ob> Default for Subscribers<Ob> {
  fn default() -> Self { Self { next_id: 0, list: Arc::new(Vec::new()) } }
}

impl<Ob: Clone> Subscribers<Ob> {
  /// Add an observer and return its id.
  pub(crate) fn add(&mut self, observer: Ob) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    Arc::make_mut(&mut self.list).push((id, observer));
    id
  }

  pub(crate) fn remove(&mut self, id: usize) -> Option<Ob> {
    let pos = self.list.iter().position(|(i, _)| *i == id)?;
    Some(Arc::make_mut(&mut self.list).remove(pos).1)
  }
}

impl<Ob> Subscribers<Ob> {
  #[inline]
  pub(crate) fn snapshot(&self) -> Arc<Vec<(usize, Ob)>> { self.list.clone() }

  /// Empty the list, returning everything that was in it.
  pub(crate) fn take_all(&mut self) -> Arc<Vec<(usize, Ob)>> {
    std::mem::replace(&mut self.list, Arc::new(Vec::new()))
  }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.list.len() }
}
