//! Skill records: one assessed competency owned by exactly one employee.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
  aggregate::{self, StalenessWindow},
  id::{EmployeeId, SkillId},
};

/// Default target for a newly recorded skill.
pub const DEFAULT_TARGET_SCORE: i32 = 100;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// The competency group a skill is reported under. Variant order is the
/// display order of the groups.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
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
pub enum Category {
  #[default]
  Basic,
  Technical,
  Emerging,
  Potential,
}

impl Category {
  pub fn label(self) -> &'static str {
    match self {
      Self::Basic => "Basic Competency",
      Self::Technical => "Technical Competency",
      Self::Emerging => "Emerging Skills",
      Self::Potential => "Potential Development",
    }
  }
}

/// Development priority of a skill.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
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
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
}

impl Priority {
  /// One step up, saturating at `High`.
  pub fn raised(self) -> Self {
    match self {
      Self::Low => Self::Medium,
      Self::Medium | Self::High => Self::High,
    }
  }

  /// One step down, saturating at `Low`.
  pub fn lowered(self) -> Self {
    match self {
      Self::High => Self::Medium,
      Self::Medium | Self::Low => Self::Low,
    }
  }
}

// ─── Skill ───────────────────────────────────────────────────────────────────

/// A persisted skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
  pub skill_id:       SkillId,
  pub employee_id:    EmployeeId,
  pub name:           String,
  pub description:    Option<String>,
  /// Always within `0..=target_score` once stored.
  pub score:          i32,
  /// Always positive once stored.
  pub target_score:   i32,
  pub category:       Category,
  pub priority:       Priority,
  pub last_assessed:  Option<DateTime<Utc>>,
  pub recommendation: Option<String>,
  pub assessor:       Option<String>,
  pub notes:          Option<String>,
}

impl Skill {
  /// Points still missing to reach the target; negative when exceeded.
  pub fn gap(&self) -> i32 { self.target_score - self.score }

  pub fn is_target_achieved(&self) -> bool { self.score >= self.target_score }

  /// Score as a whole percentage of target, truncated.
  pub fn progress_percentage(&self) -> i32 {
    if self.target_score > 0 {
      self.score * 100 / self.target_score
    } else {
      0
    }
  }

  pub fn needs_assessment(
    &self,
    window: StalenessWindow,
    now: DateTime<Utc>,
  ) -> bool {
    aggregate::is_stale(self.last_assessed, window, now)
  }
}

// ─── NewSkill ────────────────────────────────────────────────────────────────

/// Input to a skill insert. The store assigns the [`SkillId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSkill {
  pub employee_id:    EmployeeId,
  pub name:           String,
  pub description:    Option<String>,
  pub score:          i32,
  pub target_score:   i32,
  pub category:       Category,
  /// `None` lets the priority be inferred from the score gap.
  pub priority:       Option<Priority>,
  pub last_assessed:  Option<DateTime<Utc>>,
  pub recommendation: Option<String>,
  pub assessor:       Option<String>,
  pub notes:          Option<String>,
}

impl NewSkill {
  /// Convenience constructor with a target of 100 and no optional fields.
  pub fn new(
    employee_id: EmployeeId,
    name: impl Into<String>,
    score: i32,
    category: Category,
  ) -> Self {
    Self {
      employee_id,
      name: name.into(),
      description: None,
      score,
      target_score: DEFAULT_TARGET_SCORE,
      category,
      priority: None,
      last_assessed: None,
      recommendation: None,
      assessor: None,
      notes: None,
    }
  }

  /// Attach the store-assigned id, inferring the priority if absent.
  pub fn into_skill(self, skill_id: SkillId) -> Skill {
    let priority = self.priority.unwrap_or_else(|| {
      aggregate::infer_priority(self.score, self.target_score)
    });
    Skill {
      skill_id,
      employee_id: self.employee_id,
      name: self.name,
      description: self.description,
      score: self.score,
      target_score: self.target_score,
      category: self.category,
      priority,
      last_assessed: self.last_assessed,
      recommendation: self.recommendation,
      assessor: self.assessor,
      notes: self.notes,
    }
  }
}
