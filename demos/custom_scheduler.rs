//! Example: Custom Scheduler Injection
//!
//! Defines a scheduler that logs what it runs and executes tasks inline
//! (blocking the thread for delays), then hands it to a replay subject so
//! every delivery goes through it.

use std::time::Duration;

use rxcore::prelude::*;

// ==================================================================================
// 1. Define the Custom Scheduler
// ==================================================================================

#[derive(Clone, Default)]
pub struct VerboseScheduler;

// 2. Implement Scheduler
// A task is a state machine: run steps until it reports `Finished`, honoring
// the pauses it asks for.
impl Scheduler for VerboseScheduler {
  fn schedule<S: Send + 'static>(&self, mut task: Task<S>, delay: Option<Duration>) -> TaskHandle {
    println!("[VerboseScheduler] Scheduling new task. Initial delay: {:?}", delay);
    if let Some(d) = delay {
      std::thread::sleep(d);
    }

    let mut steps = 0;
    loop {
      steps += 1;
      match task.step() {
        TaskState::Finished => break,
        TaskState::Yield => {}
        TaskState::Sleeping(d) => {
          println!("[VerboseScheduler] Task requested sleep for {:?} (Blocking thread...)", d);
          std::thread::sleep(d);
        }
      }
    }
    println!("[VerboseScheduler] Task finished after {} step(s).", steps);

    TaskHandle::finished()
  }
}

// ==================================================================================
// 3. Usage
// ==================================================================================

fn main() {
  println!("--- Starting Custom Scheduler Example ---");

  let config = ReplayConfig::unbounded().with_buffer_size(2);
  let mut subject = ReplaySubject::<i32, (), _>::with_scheduler(config, VerboseScheduler);
  for v in 1..=3 {
    subject.next(v);
  }

  // The late subscriber is served from the buffer through VerboseScheduler.
  subject.clone().subscribe(|v| println!("Consumer received value: {}", v));
  subject.next(4);
  subject.complete();

  println!("--- Example Finished ---");
}
