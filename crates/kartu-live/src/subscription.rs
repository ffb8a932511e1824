//! Subscriber handles over `watch` channels.

use tokio::sync::watch;

/// A live view of a single published value.
///
/// The first [`next`](Self::next) yields the value current at subscription
/// time; later calls wait for a change. Intermediate values published while
/// the subscriber is not polling collapse into the latest one. Dropping the
/// handle unsubscribes.
pub struct Subscription<T> {
  rx:     watch::Receiver<T>,
  primed: bool,
}

impl<T: Clone> Subscription<T> {
  pub(crate) fn new(rx: watch::Receiver<T>) -> Self {
    Self { rx, primed: false }
  }

  /// The latest published value, without waiting.
  pub fn current(&self) -> T { self.rx.borrow().clone() }

  /// The current value on first call, then each subsequent change. `None`
  /// once the publisher has shut down.
  pub async fn next(&mut self) -> Option<T> {
    if !self.primed {
      self.primed = true;
      return Some(self.rx.borrow_and_update().clone());
    }
    self.rx.changed().await.ok()?;
    Some(self.rx.borrow_and_update().clone())
  }
}

/// Store `value` and notify receivers if it differs from the current one.
/// Returns whether it did.
pub(crate) fn publish_if_changed<T: PartialEq>(
  tx: &watch::Sender<T>,
  value: T,
) -> bool {
  tx.send_if_modified(|current| {
    if *current == value {
      false
    } else {
      *current = value;
      true
    }
  })
}

impl<T> Clone for Subscription<T> {
  fn clone(&self) -> Self {
    Self { rx: self.rx.clone(), primed: false }
  }
}
