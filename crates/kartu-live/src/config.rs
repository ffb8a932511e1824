//! Tunables for the live layer, deserialised from the `[live]` config table.

use std::time::Duration;

use chrono::{DateTime, Utc};
use kartu_core::{
  aggregate::StalenessWindow, query::QueryContext, validate::IdPolicy,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
  pub skill_staleness_months:    u32,
  pub employee_staleness_months: u32,
  /// Require the full 18-digit form on employee insert.
  pub strict_employee_ids:       bool,
  /// Re-evaluate every open view on this period. Off when unset or 0.
  pub refresh_interval_secs:     Option<u64>,
  pub broadcast_capacity:        usize,
}

impl Default for LiveConfig {
  fn default() -> Self {
    Self {
      skill_staleness_months:    StalenessWindow::SKILL_DEFAULT.as_months(),
      employee_staleness_months: StalenessWindow::EMPLOYEE_DEFAULT.as_months(),
      strict_employee_ids:       false,
      refresh_interval_secs:     None,
      broadcast_capacity:        256,
    }
  }
}

impl LiveConfig {
  pub fn id_policy(&self) -> IdPolicy {
    if self.strict_employee_ids {
      IdPolicy::Canonical
    } else {
      IdPolicy::Lenient
    }
  }

  pub fn refresh_interval(&self) -> Option<Duration> {
    self
      .refresh_interval_secs
      .filter(|&secs| secs > 0)
      .map(Duration::from_secs)
  }

  pub fn query_context(&self, now: DateTime<Utc>) -> QueryContext {
    QueryContext {
      now,
      skill_window: StalenessWindow::months(self.skill_staleness_months),
      employee_window: StalenessWindow::months(self.employee_staleness_months),
    }
  }
}
