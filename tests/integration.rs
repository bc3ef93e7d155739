//! Integration tests for rxcore
//!
//! Exercise subjects, schedulers and subscriptions together, across threads.

use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    mpsc, Arc, Mutex,
  },
  thread,
  time::Duration,
};

use rxcore::prelude::*;

#[test]
fn connectable_over_a_subject_source() {
  let mut source = Subject::<i32, ()>::new();
  let published = source.clone().publish();
  let seen = Arc::new(Mutex::new(vec![]));
  for tag in ["a", "b"] {
    let seen = seen.clone();
    published.clone().subscribe(move |v| seen.lock().unwrap().push((tag, v)));
  }

  source.next(0);
  let mut connection = published.connect();
  assert_eq!(source.observer_count(), 1);
  source.next(1);
  connection.unsubscribe();
  assert_eq!(source.observer_count(), 0);
  source.next(2);

  assert_eq!(*seen.lock().unwrap(), vec![("a", 1), ("b", 1)]);
  assert!(!published.clone().subscribe(|_| {}).is_closed());
}

#[test]
fn composite_disposes_subject_subscriptions() {
  let subject = ReplaySubject::<i32, ()>::unbounded();
  let group = CompositeSubscription::default();
  for _ in 0..3 {
    group.add(subject.clone().subscribe(|_| {}));
  }
  assert_eq!(subject.observer_count(), 3);
  let mut handle = group.clone();
  handle.unsubscribe();
  assert_eq!(subject.observer_count(), 0);
  assert!(group.add(subject.clone().subscribe(|_| {})).is_none());
  assert_eq!(subject.observer_count(), 0);
}

#[test]
fn subscribe_and_unsubscribe_while_publishing() {
  let subject = Subject::<usize, ()>::new();
  let delivered = Arc::new(AtomicUsize::new(0));

  let mut publisher = subject.clone();
  let producer = thread::spawn(move || {
    for i in 0..2_000 {
      publisher.next(i);
    }
    publisher.complete();
  });

  let churners: Vec<_> = (0..4)
    .map(|_| {
      let subject = subject.clone();
      let delivered = delivered.clone();
      thread::spawn(move || {
        for _ in 0..200 {
          let delivered = delivered.clone();
          let mut subscription = subject.clone().subscribe(move |_| {
            delivered.fetch_add(1, Ordering::Relaxed);
          });
          thread::yield_now();
          subscription.unsubscribe();
        }
      })
    })
    .collect();

  producer.join().unwrap();
  for churner in churners {
    churner.join().unwrap();
  }
  assert!(subject.is_terminated());
  assert_eq!(subject.observer_count(), 0);
}

fn nested_chain(depth: usize, reached: Arc<AtomicUsize>) {
  observable::create(move |mut s: Subscriber<(), ()>| {
    reached.fetch_add(1, Ordering::SeqCst);
    if depth > 0 {
      nested_chain(depth - 1, reached);
    }
    s.complete();
  })
  .subscribe(|_| {});
}

#[test]
fn deeply_nested_subscriptions_run_in_constant_stack() {
  let reached = Arc::new(AtomicUsize::new(0));
  nested_chain(50_000, reached.clone());
  assert_eq!(reached.load(Ordering::SeqCst), 50_001);
  assert!(!CurrentThreadScheduler::is_running());
}

#[test]
fn behavior_subject_on_virtual_time() {
  let scheduler = TestScheduler::new();
  let mut subject = BehaviorSubject::<&str, (), _>::with_scheduler("idle", scheduler.clone());
  let seen = Arc::new(Mutex::new(vec![]));
  let c_seen = seen.clone();
  subject.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));
  subject.next("busy");
  assert!(seen.lock().unwrap().is_empty());

  scheduler.flush();
  assert_eq!(*seen.lock().unwrap(), vec!["idle", "busy"]);
  assert_eq!(subject.value(), "busy");
}

#[cfg(feature = "futures-scheduler")]
#[test]
fn replay_subject_on_thread_pool_keeps_order() {
  let scheduler = ThreadPoolConfig::default().pool_size(2).build().unwrap();
  let config = ReplayConfig::unbounded();
  let mut subject = ReplaySubject::<i32, (), _>::with_scheduler(config, scheduler);
  for v in 0..50 {
    subject.next(v);
  }

  let (tx, rx) = mpsc::channel();
  let done = tx.clone();
  subject.clone().subscribe_all(
    move |v| tx.send(Some(v)).unwrap(),
    |_| {},
    move || done.send(None).unwrap(),
  );
  for v in 50..100 {
    subject.next(v);
  }
  subject.complete();

  let mut received = vec![];
  while let Some(v) = rx.recv_timeout(Duration::from_secs(5)).unwrap() {
    received.push(v);
  }
  assert_eq!(received, (0..100).collect::<Vec<_>>());
}

#[cfg(feature = "futures-scheduler")]
#[test]
fn async_subject_result_delivered_from_another_thread() {
  let scheduler = ThreadPoolScheduler::new().unwrap();
  let subject = AsyncSubject::<String, (), _>::with_scheduler(scheduler);
  let (tx, rx) = mpsc::channel();
  subject.clone().subscribe(move |v| tx.send(v).unwrap());

  let mut producer = subject.clone();
  thread::spawn(move || {
    producer.next("draft".to_owned());
    producer.next("final".to_owned());
    producer.complete();
  })
  .join()
  .unwrap();

  assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "final");
  assert_eq!(subject.value().as_deref(), Some("final"));
}

#[cfg(feature = "tokio-scheduler")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subject_on_tokio_runtime() {
  let scheduler = TokioScheduler::current().unwrap();
  let mut subject = Subject::<i32, (), _>::with_scheduler(scheduler);
  let (tx, rx) = mpsc::channel();
  subject.clone().subscribe(move |v| tx.send(v).unwrap());
  subject.next(1);
  subject.next(2);

  let received = tokio::task::spawn_blocking(move || {
    (0..2).map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap()).collect::<Vec<_>>()
  })
  .await
  .unwrap();
  assert_eq!(received, vec![1, 2]);
}
