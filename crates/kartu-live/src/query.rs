//! The query layer: shared, self-refreshing result sets keyed by descriptor.
//!
//! The first subscriber to a descriptor evaluates it and spawns a refresher
//! task. Later subscribers to the same descriptor share that task's `watch`
//! channel, re-evaluating on join so they never start from a value the
//! refresher has not caught up on yet. The refresher re-evaluates on every
//! invalidation touching the descriptor's table, republishes only when the
//! result actually changed, and exits once its last subscriber is gone.

use std::sync::Arc;

use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use kartu_core::{
  query::{QueryDescriptor, QueryResult},
  store::CompetencyStore,
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
  Error, Result,
  config::LiveConfig,
  invalidation::{Invalidation, InvalidationStream, Invalidator},
  subscription::{Subscription, publish_if_changed},
};

type Slot = Arc<watch::Sender<QueryResult>>;

struct Inner<S> {
  store:       Arc<S>,
  invalidator: Invalidator,
  config:      LiveConfig,
  open:        DashMap<QueryDescriptor, Slot>,
}

/// Cloneable handle to the query registry.
pub struct QueryLayer<S> {
  inner: Arc<Inner<S>>,
}

impl<S> Clone for QueryLayer<S> {
  fn clone(&self) -> Self {
    Self { inner: self.inner.clone() }
  }
}

/// Evaluate `descriptor` once against the store's current state.
pub async fn evaluate<S: CompetencyStore>(
  store: &S,
  descriptor: &QueryDescriptor,
  config: &LiveConfig,
) -> Result<QueryResult> {
  let snapshot = store
    .fetch(descriptor.source())
    .await
    .map_err(Error::from_store)?;
  let cx = config.query_context(Utc::now());
  Ok(descriptor.evaluate(snapshot, &cx))
}

fn wants(descriptor: &QueryDescriptor, signal: Invalidation) -> bool {
  signal.touches(descriptor.source().table())
    || (signal.clock && descriptor.is_time_sensitive())
}

impl<S: CompetencyStore + 'static> QueryLayer<S> {
  pub fn new(store: Arc<S>, invalidator: Invalidator, config: LiveConfig) -> Self {
    Self {
      inner: Arc::new(Inner {
        store,
        invalidator,
        config,
        open: DashMap::new(),
      }),
    }
  }

  /// One-shot evaluation that does not register a live query.
  pub async fn get(&self, descriptor: &QueryDescriptor) -> Result<QueryResult> {
    evaluate(&*self.inner.store, descriptor, &self.inner.config).await
  }

  /// Subscribe to a live result set. The subscription's first value is the
  /// result as of this call.
  pub async fn subscribe(
    &self,
    descriptor: QueryDescriptor,
  ) -> Result<Subscription<QueryResult>> {
    let existing = self.inner.open.get(&descriptor).map(|slot| slot.clone());
    if let Some(slot) = existing {
      // Attach first so the refresher cannot close underneath us, then
      // publish a fresh result: a write acknowledged before this call may
      // not have reached the refresher yet.
      let rx = slot.subscribe();
      let latest =
        evaluate(&*self.inner.store, &descriptor, &self.inner.config).await?;
      publish_if_changed(&slot, latest);
      return Ok(Subscription::new(rx));
    }

    // Listen before evaluating so no write can fall between the two.
    let invalidations = self.inner.invalidator.subscribe();
    let initial =
      evaluate(&*self.inner.store, &descriptor, &self.inner.config).await?;

    let rx = match self.inner.open.entry(descriptor.clone()) {
      Entry::Occupied(slot) => {
        let slot = slot.get().clone();
        let rx = slot.subscribe();
        publish_if_changed(&slot, initial);
        rx
      }
      Entry::Vacant(vacant) => {
        let (tx, rx) = watch::channel(initial);
        let slot = Arc::new(tx);
        vacant.insert(slot.clone());
        debug!(?descriptor, "opened live query");
        tokio::spawn(refresh(self.inner.clone(), descriptor, slot, invalidations));
        rx
      }
    };
    Ok(Subscription::new(rx))
  }

  /// Number of descriptors with at least one live refresher.
  pub fn open_queries(&self) -> usize { self.inner.open.len() }
}

async fn refresh<S: CompetencyStore>(
  inner: Arc<Inner<S>>,
  descriptor: QueryDescriptor,
  slot: Slot,
  mut invalidations: InvalidationStream,
) {
  loop {
    tokio::select! {
      () = slot.closed() => {
        // A subscriber may have attached since `closed` fired; only leave
        // if the slot is still unobserved.
        let removed = inner.open.remove_if(&descriptor, |_, open| {
          Arc::ptr_eq(open, &slot) && open.receiver_count() == 0
        });
        if removed.is_some() {
          break;
        }
      }
      signal = invalidations.recv() => {
        let Some(signal) = signal else { break };
        if !wants(&descriptor, signal) {
          continue;
        }
        match evaluate(&*inner.store, &descriptor, &inner.config).await {
          Ok(result) => {
            let changed = publish_if_changed(&slot, result);
            debug!(?descriptor, changed, "re-evaluated live query");
          }
          Err(err) => {
            warn!(?descriptor, %err, "live query refresh failed, keeping last result");
          }
        }
      }
    }
  }
  debug!(?descriptor, "closed live query");
}
