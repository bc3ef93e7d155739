use std::sync::Arc;

use super::{
  replay_buffer::ReplayConfig,
  subject_core::{Release, SubjectCore},
};
use crate::scheduler::{CurrentThreadScheduler, Scheduler};

/// A subject that always has a current value.
///
/// It starts with a seed. Every subscriber first receives the current
/// value, then live values. After termination a subscriber receives the
/// last value followed by the terminal notification.
pub struct BehaviorSubject<Item, Err, Sch = CurrentThreadScheduler> {
  core: Arc<SubjectCore<Item, Err, Sch>>,
}

impl<Item, Err> BehaviorSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  pub fn new(seed: Item) -> Self { Self::with_scheduler(seed, CurrentThreadScheduler) }
}

impl<Item, Err, Sch> BehaviorSubject<Item, Err, Sch>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  Sch: Scheduler,
{
  pub fn with_scheduler(seed: Item, scheduler: Sch) -> Self {
    let config = ReplayConfig::unbounded().with_buffer_size(1);
    let core = SubjectCore::new("behavior", config, Release::Live, scheduler).seed(seed);
    Self { core: Arc::new(core) }
  }

  /// The current value: the seed, or the last value published since.
  pub fn value(&self) -> Item {
    // The seed occupies a one-slot buffer without a window; it is only ever
    // replaced, never emptied.
    self.core.latest().expect("behavior subject always holds a value")
  }
}

impl_subject!(BehaviorSubject);
