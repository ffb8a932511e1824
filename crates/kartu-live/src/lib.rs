//! The live layer over a [`CompetencyStore`]: serialised writes, shared
//! self-refreshing queries, and a reactive view graph per selection.
//!
//! [`LiveStore`] is the composition root. It owns the store handle, starts
//! the mutation worker, and wires every query and view graph to the same
//! invalidation bus. All of it must be created inside a tokio runtime.

use std::sync::Arc;

use kartu_core::store::CompetencyStore;
use tokio::task::JoinHandle;
use tracing::info;

mod config;
mod gateway;
mod graph;
mod invalidation;
mod query;
mod subscription;

pub mod error;

pub use config::LiveConfig;
pub use error::{Error, Result};
pub use gateway::{MutationGateway, MutationHandle};
pub use graph::{CompetencyCard, Node, ViewGraph};
pub use invalidation::{Invalidation, InvalidationStream, Invalidator};
pub use query::{QueryLayer, evaluate};
pub use subscription::Subscription;

/// A store with its live machinery attached.
pub struct LiveStore<S> {
  store:       Arc<S>,
  config:      LiveConfig,
  invalidator: Invalidator,
  gateway:     MutationGateway,
  queries:     QueryLayer<S>,
  ticker:      Option<JoinHandle<()>>,
}

impl<S: CompetencyStore + 'static> LiveStore<S> {
  pub fn new(store: S, config: LiveConfig) -> Self {
    let store = Arc::new(store);
    let invalidator = Invalidator::new(config.broadcast_capacity);
    let gateway = MutationGateway::spawn(
      store.clone(),
      invalidator.clone(),
      config.id_policy(),
    );
    let queries =
      QueryLayer::new(store.clone(), invalidator.clone(), config.clone());
    let ticker = config.refresh_interval().map(|period| {
      info!(?period, "periodic refresh enabled");
      invalidator.spawn_ticker(period)
    });

    Self { store, config, invalidator, gateway, queries, ticker }
  }

  /// The write entry points.
  pub fn gateway(&self) -> &MutationGateway { &self.gateway }

  pub fn queries(&self) -> &QueryLayer<S> { &self.queries }

  /// Direct read access. Writes must go through [`Self::gateway`] so that
  /// live views are invalidated.
  pub fn store(&self) -> &S { &self.store }

  pub fn invalidator(&self) -> &Invalidator { &self.invalidator }

  /// A fresh view graph with nothing selected.
  pub fn view_graph(&self) -> ViewGraph {
    ViewGraph::spawn(self.store.clone(), &self.invalidator, self.config.clone())
  }
}

impl<S> Drop for LiveStore<S> {
  fn drop(&mut self) {
    if let Some(ticker) = self.ticker.take() {
      ticker.abort();
    }
  }
}

#[cfg(test)]
mod tests;
