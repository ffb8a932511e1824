//! Tolerant decoding of persisted enum columns.
//!
//! Category, priority and status are closed enumerations. A stored string
//! that no longer names a variant is not an error: it decodes to the type's
//! default, and the result is tagged so callers can see that it happened.

use std::str::FromStr;

/// The outcome of decoding a persisted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<T> {
  /// The stored string named a known variant.
  Valid(T),
  /// The stored string was unrecognised; `value` is the fallback.
  Defaulted { value: T, raw: String },
}

impl<T> Decoded<T> {
  pub fn was_defaulted(&self) -> bool {
    matches!(self, Self::Defaulted { .. })
  }

  /// The unrecognised input, if decoding fell back to the default.
  pub fn raw(&self) -> Option<&str> {
    match self {
      Self::Valid(_) => None,
      Self::Defaulted { raw, .. } => Some(raw),
    }
  }

  pub fn value(&self) -> &T {
    match self {
      Self::Valid(value) | Self::Defaulted { value, .. } => value,
    }
  }

  pub fn into_value(self) -> T {
    match self {
      Self::Valid(value) | Self::Defaulted { value, .. } => value,
    }
  }
}

/// Decode `raw` into `T`, falling back to `T::default()`.
pub fn decode_or_default<T>(raw: &str) -> Decoded<T>
where
  T: FromStr + Default,
{
  match raw.parse() {
    Ok(value) => Decoded::Valid(value),
    Err(_) => Decoded::Defaulted {
      value: T::default(),
      raw:   raw.to_owned(),
    },
  }
}
