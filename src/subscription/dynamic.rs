use smallvec::SmallVec;

/// A container of subscriptions keyed by the id handed out when each one was
/// added.
///
/// Ids are never reused, so a stale id can not remove a later member.
/// Storage is inline for up to two members.
///
/// # Examples
///
/// ```rust
/// use rxcore::subscription::DynamicSubscriptions;
///
/// let mut subs: DynamicSubscriptions<()> = DynamicSubscriptions::default();
///
/// let id1 = subs.add(());
/// let id2 = subs.add(());
/// assert_ne!(id1, id2);
/// assert_eq!(subs.len(), 2);
///
/// assert!(subs.remove(id1).is_some());
/// assert!(subs.remove(id1).is_none());
/// assert_eq!(subs.len(), 1);
/// ```
pub struct DynamicSubscriptions<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for DynamicSubscriptions<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> DynamicSubscriptions<U> {
  /// Add an item and return its id.
  #[inline]
  pub fn add(&mut self, item: U) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.items.push((id, item));
    id
  }

  pub fn remove(&mut self, id: usize) -> Option<U> {
    self.items.iter().position(|(i, _)| *i == id).map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Move every member out, leaving the container empty.
  ///
  /// The id counter keeps running.
  pub fn take_all(&mut self) -> SmallVec<[U; 2]> {
    self.items.drain(..).map(|(_, item)| item).collect()
  }

  /// Move out the members for which `pred` returns true, keeping the order
  /// of the rest. The caller decides where the taken members are dropped.
  pub fn take_where(&mut self, mut pred: impl FnMut(&U) -> bool) -> SmallVec<[U; 2]> {
    let mut taken = SmallVec::new();
    let mut idx = 0;
    while idx < self.items.len() {
      if pred(&self.items[idx].1) {
        taken.push(self.items.remove(idx).1);
      } else {
        idx += 1;
      }
    }
    taken
  }
}
