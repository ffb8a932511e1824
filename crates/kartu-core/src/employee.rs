//! Employee records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
  aggregate::{self, StalenessWindow},
  id::EmployeeId,
};

/// Default target for an employee's overall score.
pub const DEFAULT_EMPLOYEE_TARGET: i32 = 100;

/// Where an employee is in their employment lifecycle.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EmployeeStatus {
  #[default]
  Active,
  Inactive,
  OnLeave,
  Transferred,
}

impl EmployeeStatus {
  pub fn is_active(self) -> bool { matches!(self, Self::Active) }

  /// Still part of the organisation, even if temporarily away.
  pub fn is_present(self) -> bool {
    matches!(self, Self::Active | Self::OnLeave)
  }
}

/// A persisted employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub employee_id:     EmployeeId,
  pub name:            String,
  /// Organisational unit.
  pub unit:            Option<String>,
  pub position:        Option<String>,
  pub grade:           Option<String>,
  pub email:           Option<String>,
  pub phone:           Option<String>,
  pub join_date:       Option<NaiveDate>,
  /// Weak reference; the supervisor need not exist in the store.
  pub supervisor_id:   Option<EmployeeId>,
  /// Derived from the employee's skills. Writes through the gateway ignore
  /// this field except for an explicit correction.
  pub overall_score:   i32,
  pub target_score:    i32,
  pub last_assessment: Option<DateTime<Utc>>,
  pub status:          EmployeeStatus,
  pub notes:           Option<String>,
}

impl Employee {
  /// An active employee with default target and no optional fields.
  pub fn new(employee_id: EmployeeId, name: impl Into<String>) -> Self {
    Self {
      employee_id,
      name: name.into(),
      unit: None,
      position: None,
      grade: None,
      email: None,
      phone: None,
      join_date: None,
      supervisor_id: None,
      overall_score: 0,
      target_score: DEFAULT_EMPLOYEE_TARGET,
      last_assessment: None,
      status: EmployeeStatus::Active,
      notes: None,
    }
  }

  pub fn gap(&self) -> i32 { self.target_score - self.overall_score }

  pub fn is_below_target(&self) -> bool {
    self.overall_score < self.target_score
  }

  /// Overall score as a whole percentage of target, truncated.
  pub fn completion_percentage(&self) -> i32 {
    if self.target_score > 0 {
      self.overall_score * 100 / self.target_score
    } else {
      0
    }
  }

  pub fn needs_assessment(
    &self,
    window: StalenessWindow,
    now: DateTime<Utc>,
  ) -> bool {
    aggregate::is_stale(self.last_assessment, window, now)
  }

  /// Up to two upper-case initials from the name.
  pub fn initials(&self) -> String {
    self
      .name
      .split_whitespace()
      .filter_map(|part| part.chars().next())
      .take(2)
      .flat_map(char::to_uppercase)
      .collect()
  }
}
