//! The invalidation bus between the mutation gateway and every live view.
//!
//! Signals are coarse: they name which tables a write touched, never which
//! rows. A `broadcast` channel fans each signal out to every listener; a
//! listener that falls behind treats the gap as "everything changed".

use std::time::Duration;

use kartu_core::query::Table;
use tokio::{
  sync::broadcast::{self, error::RecvError},
  task::JoinHandle,
};
use tracing::{debug, warn};

/// What a write (or the passage of time) may have made stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Invalidation {
  pub employees: bool,
  pub skills:    bool,
  /// Wall-clock time advanced; time-dependent views should re-evaluate.
  pub clock:     bool,
}

impl Invalidation {
  pub const ALL: Self = Self { employees: true, skills: true, clock: true };
  pub const EMPLOYEES: Self =
    Self { employees: true, skills: false, clock: false };
  pub const NONE: Self = Self { employees: false, skills: false, clock: false };
  /// A skill write also rewrites its owner's score.
  pub const SKILLS: Self = Self { employees: true, skills: true, clock: false };

  pub fn touches(self, table: Table) -> bool {
    match table {
      Table::Employees => self.employees,
      Table::Skills => self.skills,
    }
  }

  pub fn is_empty(self) -> bool { self == Self::NONE }
}

// ─── Publisher ───────────────────────────────────────────────────────────────

/// Cloneable publishing side of the bus.
#[derive(Clone)]
pub struct Invalidator {
  tx: broadcast::Sender<Invalidation>,
}

impl Invalidator {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    Self { tx }
  }

  /// Deliver `signal` to every current listener. Empty signals are dropped.
  pub fn publish(&self, signal: Invalidation) {
    if signal.is_empty() {
      return;
    }
    // No listeners is not an error; there is simply nobody to tell.
    let listeners = self.tx.send(signal).unwrap_or(0);
    debug!(?signal, listeners, "published invalidation");
  }

  pub fn subscribe(&self) -> InvalidationStream {
    InvalidationStream { rx: self.tx.subscribe() }
  }

  /// Publish [`Invalidation::ALL`] every `period` until the handle is
  /// aborted. This re-evaluates every open view, picking up both the
  /// passage of time and writes made by other processes.
  pub fn spawn_ticker(&self, period: Duration) -> JoinHandle<()> {
    let this = self.clone();
    tokio::spawn(async move {
      let mut interval = tokio::time::interval(period);
      // The first tick completes immediately.
      interval.tick().await;
      loop {
        interval.tick().await;
        this.publish(Invalidation::ALL);
      }
    })
  }
}

// ─── Listener ────────────────────────────────────────────────────────────────

pub struct InvalidationStream {
  rx: broadcast::Receiver<Invalidation>,
}

impl InvalidationStream {
  /// The next signal, or `None` once every publisher is gone.
  pub async fn recv(&mut self) -> Option<Invalidation> {
    match self.rx.recv().await {
      Ok(signal) => Some(signal),
      Err(RecvError::Lagged(skipped)) => {
        warn!(skipped, "invalidation listener lagged, refreshing everything");
        Some(Invalidation::ALL)
      }
      Err(RecvError::Closed) => None,
    }
  }
}
