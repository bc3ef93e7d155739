//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Creation functions live under `observable::`
pub use crate::observable;
// Core traits
pub use crate::observable::{Observable, ObservableExt};
pub use crate::observer::{Observer, ObserverExt};
pub use crate::subscription::SubscriptionLike;
// Observables
pub use crate::observable::{ConnectableObservable, Connection, ObservableFn, Subscriber};
// Observers
pub use crate::notification::Notification;
pub use crate::observer::{BoxObserver, ObserverAll, ObserverErr, ObserverNext, SafeObserver};
// Scheduler core types
pub use crate::scheduler::{Duration, Instant, Scheduler, Task, TaskHandle, TaskState};
// Schedulers
pub use crate::scheduler::{CurrentThreadScheduler, ImmediateScheduler, TestScheduler};
#[cfg(feature = "futures-scheduler")]
pub use crate::scheduler::{ThreadPoolConfig, ThreadPoolScheduler};
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
// Subjects
pub use crate::subject::*;
// Subscriptions
pub use crate::subscription::{
  BoxSubscription, ClosureSubscription, CompositeSubscription, ProxySubscription,
  RefCountHandle, RefCountSubscription, SingleSubscription, SubscriptionGuard,
  SubscriptionWrapper,
};
// Errors
pub use crate::error::SchedulerError;
