//! Error type for `kartu-live`.

use kartu_core::{ErrorKind, ValidationError, store::StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The domain refused the request; nothing was written.
  #[error(transparent)]
  Rejected(#[from] kartu_core::Error),

  #[error("store error: {0}")]
  Store(Box<dyn std::error::Error + Send + Sync>),

  #[error("mutation cancelled before it started")]
  Cancelled,

  #[error("mutation gateway has shut down")]
  Closed,
}

impl Error {
  /// Split a backend error into a domain rejection or an opaque fault.
  pub fn from_store<E: StoreError>(err: E) -> Self {
    match err.into_core() {
      Ok(core) => Self::Rejected(core),
      Err(other) => Self::Store(Box::new(other)),
    }
  }

  /// The recoverable class of a rejection; `None` for faults and
  /// cancellation.
  pub fn kind(&self) -> Option<ErrorKind> {
    match self {
      Self::Rejected(e) => Some(e.kind()),
      Self::Store(_) | Self::Cancelled | Self::Closed => None,
    }
  }
}

impl From<ValidationError> for Error {
  fn from(err: ValidationError) -> Self {
    Self::Rejected(kartu_core::Error::Validation(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
