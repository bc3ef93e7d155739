use crate::observer::Observer;

/// A single stream event, reified so it can be queued and replayed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Completed,
}

impl<Item, Err> Notification<Item, Err> {
  /// Delivers this notification to `observer`.
  pub fn accept<O>(self, observer: &mut O)
  where
    O: Observer<Item, Err> + ?Sized,
  {
    match self {
      Notification::Next(value) => observer.next(value),
      Notification::Error(err) => observer.error(err),
      Notification::Completed => observer.complete(),
    }
  }

  /// True for `Error` and `Completed`.
  #[inline]
  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }

  pub fn map<U>(self, f: impl FnOnce(Item) -> U) -> Notification<U, Err> {
    match self {
      Notification::Next(value) => Notification::Next(f(value)),
      Notification::Error(err) => Notification::Error(err),
      Notification::Completed => Notification::Completed,
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::observer::ObserverAll;

  #[test]
  fn accept_dispatches() {
    let mut log = vec![];
    {
      let log = std::cell::RefCell::new(&mut log);
      let mut observer = ObserverAll::new(
        |v: i32| log.borrow_mut().push(format!("next {v}")),
        |e: &str| log.borrow_mut().push(format!("error {e}")),
        || log.borrow_mut().push("complete".to_owned()),
      );
      Notification::Next(1).accept(&mut observer);
      Notification::<i32, &str>::Completed.accept(&mut observer);
    }
    assert_eq!(log, vec!["next 1", "complete"]);
  }

  #[test]
  fn map_and_terminal() {
    let n: Notification<i32, ()> = Notification::Next(2);
    assert!(!n.is_terminal());
    assert_eq!(n.map(|v| v * 10), Notification::Next(20));
    let e: Notification<i32, &str> = Notification::Error("x");
    assert!(e.is_terminal());
    assert_eq!(e.map(|v| v + 1), Notification::Error("x"));
  }
}
