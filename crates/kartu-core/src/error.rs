//! Error types for `kartu-core`.

use thiserror::Error;

use crate::id::{EmployeeId, SkillId};

/// Input rejected before it reaches a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("employee id must not be empty")]
  EmptyEmployeeId,

  #[error("employee id must be 1 to 18 ASCII digits, got {0:?}")]
  MalformedEmployeeId(String),

  #[error("employee id {0} is not in the canonical 18-digit form")]
  NonCanonicalEmployeeId(EmployeeId),

  #[error("skill name must not be empty")]
  EmptySkillName,

  #[error("target score must be positive, got {0}")]
  NonPositiveTarget(i32),
}

/// The three recoverable failure classes a mutation can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  ConstraintViolation,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("employee not found: {0}")]
  EmployeeNotFound(EmployeeId),

  #[error("skill not found: {0}")]
  SkillNotFound(SkillId),

  #[error("employee {0} already exists")]
  DuplicateEmployee(EmployeeId),

  #[error("skill {skill} belongs to {owner} and cannot move to {requested}")]
  OwnerChanged {
    skill:     SkillId,
    owner:     EmployeeId,
    requested: EmployeeId,
  },

  /// A skill referenced an owner that is not in the store.
  #[error("no employee {0} to own this skill")]
  UnknownOwner(EmployeeId),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) | Self::UnknownOwner(_) => ErrorKind::Validation,
      Self::EmployeeNotFound(_) | Self::SkillNotFound(_) => ErrorKind::NotFound,
      Self::DuplicateEmployee(_) | Self::OwnerChanged { .. } => {
        ErrorKind::ConstraintViolation
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
