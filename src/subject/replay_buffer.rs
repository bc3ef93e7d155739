use std::collections::VecDeque;

use crate::scheduler::{Duration, Instant};

/// How much history a subject keeps for late subscribers.
///
/// Both limits default to unbounded; when both are set, a value is dropped
/// as soon as either limit excludes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayConfig {
  buffer_size: Option<usize>,
  window: Option<Duration>,
}

impl ReplayConfig {
  /// Keep every value.
  pub fn unbounded() -> Self { Self::default() }

  /// Keep at most the `size` most recent values.
  pub fn with_buffer_size(mut self, size: usize) -> Self {
    self.buffer_size = Some(size);
    self
  }

  /// Keep only values published within `window` of the current time.
  pub fn with_window(mut self, window: Duration) -> Self {
    self.window = Some(window);
    self
  }

  pub fn buffer_size(&self) -> Option<usize> { self.buffer_size }

  pub fn window(&self) -> Option<Duration> { self.window }
}

/// Timestamped values trimmed by a [`ReplayConfig`].
pub(crate) struct ReplayBuffer<Item> {
  config: ReplayConfig,
  items: VecDeque<(Instant, Item)>,
}

impl<Item> ReplayBuffer<Item> {
  pub(crate) fn new(config: ReplayConfig) -> Self { Self { config, items: VecDeque::new() } }

  /// False when the buffer can never hold anything.
  #[inline]
  pub(crate) fn retains(&self) -> bool { self.config.buffer_size != Some(0) }

  pub(crate) fn push(&mut self, now: Instant, item: Item) {
    if !self.retains() {
      return;
    }
    self.items.push_back((now, item));
    self.trim(now);
  }

  /// Drops values excluded by the size or time limit.
  pub(crate) fn trim(&mut self, now: Instant) {
    if let Some(size) = self.config.buffer_size {
      while self.items.len() > size {
        self.items.pop_front();
      }
    }
    if let Some(window) = self.config.window {
      while self.items.front().is_some_and(|(at, _)| now.saturating_duration_since(*at) > window) {
        self.items.pop_front();
      }
    }
  }

  pub(crate) fn values(&self) -> impl Iterator<Item = &Item> { self.items.iter().map(|(_, v)| v) }

  pub(crate) fn last(&self) -> Option<&Item> { self.items.back().map(|(_, v)| v) }

  #[cfg(test)]
  pub(crate) fn len(&self) -> usize { self.items.len() }
}
