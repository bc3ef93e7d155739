//! # rxcore: the race-free core of a reactive framework
//!
//! Subscriptions, schedulers, observers, a raw-function observable and the
//! subject family, with the thread-safety guarantees operators are built
//! on.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxcore::prelude::*;
//!
//! let mut subject = BehaviorSubject::<i32, ()>::new(0);
//! subject.clone().subscribe(|v| println!("Value: {}", v));
//! subject.next(1);
//! subject.complete();
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SubscriptionLike`] | Handle to release a resource, idempotently |
//! | [`Scheduler`] | Runs [`Task`]s now, later, or on another thread |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Observable`] | A source that delivers to observers once subscribed |
//! | [`Subject`] | Both at once: shares one stream between many observers |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): `ThreadPoolScheduler` on the futures
//!   thread pool
//! - **`tokio-scheduler`**: `TokioScheduler` on a tokio runtime
//!
//! [`SubscriptionLike`]: subscription::SubscriptionLike
//! [`Scheduler`]: scheduler::Scheduler
//! [`Task`]: scheduler::Task
//! [`Observer`]: observer::Observer
//! [`Observable`]: observable::Observable
//! [`Subject`]: subject::Subject

pub mod error;
pub mod notification;
pub mod observable;
pub mod observer;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscription;

pub use crate::scheduler::{Duration, Instant};
