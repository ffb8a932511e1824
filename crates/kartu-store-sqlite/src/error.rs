//! Error type for `kartu-store-sqlite`.

use kartu_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] kartu_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored key no longer parses as an employee id.
  #[error("corrupt row in {table}: {reason}")]
  Corrupt {
    table:  &'static str,
    reason: String,
  },
}

impl StoreError for Error {
  fn into_core(self) -> Result<kartu_core::Error, Self> {
    match self {
      Self::Core(e) => Ok(e),
      other => Err(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
