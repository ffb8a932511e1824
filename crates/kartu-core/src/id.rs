//! Primary keys for the two record tables.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Number of digits in a canonical employee identifier (NIP).
pub const CANONICAL_EMPLOYEE_ID_LEN: usize = 18;

// ─── EmployeeId ──────────────────────────────────────────────────────────────

/// The caller-supplied key of an employee: a non-empty string of ASCII
/// digits. Immutable once the employee exists.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct EmployeeId(String);

impl EmployeeId {
  /// Parse an identifier, accepting 1 to 18 ASCII digits.
  pub fn parse(raw: &str) -> Result<Self, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err(ValidationError::EmptyEmployeeId);
    }
    if trimmed.len() > CANONICAL_EMPLOYEE_ID_LEN
      || !trimmed.bytes().all(|b| b.is_ascii_digit())
    {
      return Err(ValidationError::MalformedEmployeeId(raw.to_owned()));
    }
    Ok(Self(trimmed.to_owned()))
  }

  /// Whether this id has the full 18-digit form.
  pub fn is_canonical(&self) -> bool {
    self.0.len() == CANONICAL_EMPLOYEE_ID_LEN
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for EmployeeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl FromStr for EmployeeId {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

impl TryFrom<String> for EmployeeId {
  type Error = ValidationError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::parse(&value)
  }
}

impl From<EmployeeId> for String {
  fn from(id: EmployeeId) -> Self { id.0 }
}

// ─── SkillId ─────────────────────────────────────────────────────────────────

/// Opaque store-assigned key of a skill.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct SkillId(Uuid);

impl SkillId {
  /// Allocate a fresh identifier. Only stores call this.
  pub fn generate() -> Self { Self(Uuid::new_v4()) }

  pub fn from_uuid(id: Uuid) -> Self { Self(id) }

  pub fn as_uuid(&self) -> Uuid { self.0 }
}

impl fmt::Display for SkillId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.hyphenated())
  }
}

impl FromStr for SkillId {
  type Err = uuid::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(Self(Uuid::parse_str(s)?))
  }
}
