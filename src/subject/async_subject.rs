use std::sync::Arc;

use super::{
  replay_buffer::ReplayConfig,
  subject_core::{Release, SubjectCore},
};
use crate::scheduler::{CurrentThreadScheduler, Scheduler};

/// A subject that emits a single result: the last value it received, once
/// it completes.
///
/// Values published before completion replace each other and reach no one.
/// On `complete` every subscriber, present or future, receives the last
/// value (if there was one) followed by `complete`. On `error` subscribers
/// only receive the error.
pub struct AsyncSubject<Item, Err, Sch = CurrentThreadScheduler> {
  core: Arc<SubjectCore<Item, Err, Sch>>,
}

impl<Item, Err> AsyncSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  pub fn new() -> Self { Self::with_scheduler(CurrentThreadScheduler) }
}

impl<Item, Err> Default for AsyncSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn default() -> Self { Self::new() }
}

impl<Item, Err, Sch> AsyncSubject<Item, Err, Sch>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  Sch: Scheduler,
{
  pub fn with_scheduler(scheduler: Sch) -> Self {
    let config = ReplayConfig::unbounded().with_buffer_size(1);
    Self { core: Arc::new(SubjectCore::new("async", config, Release::OnComplete, scheduler)) }
  }

  /// The result, available once the subject completed with a value.
  pub fn value(&self) -> Option<Item> { self.core.completed_value() }
}

impl_subject!(AsyncSubject);
