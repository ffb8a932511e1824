//! SQLite backend for the Kartu competency store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on one dedicated
//! thread. Every trait call is a single transaction on that thread, which
//! makes each write atomic and serialises writes against each other.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
