use std::sync::{Arc, Weak};

use super::{scheduled_observer::ScheduledObserver, subject_core::SubjectCore};
use crate::{scheduler::Scheduler, subscription::SubscriptionLike};

/// The subscription returned when subscribing to a subject.
///
/// Disposing it stops delivery at once, including notifications already
/// queued for this observer, and detaches the observer from the subject.
/// It only holds a weak reference to the subject, so a dropped subject is
/// not kept alive by its subscriptions.
pub struct SubjectSubscription<Item, Err, Sch> {
  core: Weak<SubjectCore<Item, Err, Sch>>,
  observer: Arc<ScheduledObserver<Item, Err, Sch>>,
  id: Option<usize>,
}

impl<Item, Err, Sch> SubjectSubscription<Item, Err, Sch> {
  pub(crate) fn new(
    core: Weak<SubjectCore<Item, Err, Sch>>, observer: Arc<ScheduledObserver<Item, Err, Sch>>,
    id: Option<usize>,
  ) -> Self {
    Self { core, observer, id }
  }
}

impl<Item, Err, Sch> SubscriptionLike for SubjectSubscription<Item, Err, Sch>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  Sch: Scheduler,
{
  fn unsubscribe(&mut self) {
    self.observer.stop();
    if let Some(id) = self.id.take() {
      if let Some(core) = self.core.upgrade() {
        core.remove(id);
      }
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_stopped() }
}
