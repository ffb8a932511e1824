//! The `CompetencyStore` trait and the write receipts it returns.
//!
//! Backends (e.g. `kartu-store-sqlite`) implement the trait. The live layer
//! depends only on this abstraction.

use std::future::Future;

use serde::Serialize;

use crate::{
  employee::Employee,
  id::{EmployeeId, SkillId},
  query::{Snapshot, Source, Table},
  skill::{NewSkill, Skill},
};

// ─── Receipts ────────────────────────────────────────────────────────────────

/// The owner's overall score before and after a skill write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreChange {
  pub employee_id: EmployeeId,
  pub previous:    i32,
  pub current:     i32,
}

impl ScoreChange {
  pub fn changed(&self) -> bool { self.previous != self.current }
}

/// Outcome of a skill insert, replace or delete. The owner's score is
/// recomputed in the same transaction as the skill write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillWrite {
  /// The skill as stored, or as it was before a delete.
  pub skill:   Skill,
  /// `false` when a replace matched the stored row exactly.
  pub changed: bool,
  pub rescore: ScoreChange,
}

/// A persisted enum column that did not decode and was read as its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultedValue {
  pub table:  Table,
  /// Primary key of the affected row.
  pub key:    String,
  pub column: &'static str,
  pub raw:    String,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend errors must be able to surface a domain rejection so callers can
/// tell a not-found from an I/O failure.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The domain error this wraps, or `self` back if it is a backend fault.
  fn into_core(self) -> Result<crate::Error, Self>
  where
    Self: Sized;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a competency store backend.
///
/// Every method is a single atomic unit: a failed call leaves no partial
/// effect. Skill writes also keep the owner's `overall_score` equal to the
/// aggregate of its remaining skills.
pub trait CompetencyStore: Send + Sync {
  type Error: StoreError;

  // ── Employees ─────────────────────────────────────────────────────────

  /// Insert or replace an employee. A fresh row starts with an overall
  /// score of zero; a replace keeps the stored score.
  fn put_employee(
    &self,
    employee: Employee,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  fn get_employee(
    &self,
    id: EmployeeId,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  fn list_employees(
    &self,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + '_;

  /// Remove an employee and all of its skills. Returns the number of skills
  /// removed with it.
  fn delete_employee(
    &self,
    id: EmployeeId,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Overwrite the stored overall score. This is the only write path for
  /// that column apart from skill rescoring.
  fn set_overall_score(
    &self,
    id: EmployeeId,
    score: i32,
  ) -> impl Future<Output = Result<ScoreChange, Self::Error>> + Send + '_;

  // ── Skills ────────────────────────────────────────────────────────────

  /// Insert a skill under a fresh store-assigned id.
  fn insert_skill(
    &self,
    input: NewSkill,
  ) -> impl Future<Output = Result<SkillWrite, Self::Error>> + Send + '_;

  /// Replace an existing skill. The owner may not change.
  fn put_skill(
    &self,
    skill: Skill,
  ) -> impl Future<Output = Result<SkillWrite, Self::Error>> + Send + '_;

  fn delete_skill(
    &self,
    id: SkillId,
  ) -> impl Future<Output = Result<SkillWrite, Self::Error>> + Send + '_;

  fn get_skill(
    &self,
    id: SkillId,
  ) -> impl Future<Output = Result<Option<Skill>, Self::Error>> + Send + '_;

  /// All skills owned by `id`, in no particular order.
  fn skills_of(
    &self,
    id: EmployeeId,
  ) -> impl Future<Output = Result<Vec<Skill>, Self::Error>> + Send + '_;

  fn list_skills(
    &self,
  ) -> impl Future<Output = Result<Vec<Skill>, Self::Error>> + Send + '_;

  // ── Integrity ─────────────────────────────────────────────────────────

  /// Every persisted enum value that was read back as its default.
  fn defaulted_values(
    &self,
  ) -> impl Future<Output = Result<Vec<DefaultedValue>, Self::Error>> + Send + '_;

  // ── Provided ──────────────────────────────────────────────────────────

  /// Fetch the rows a query needs.
  fn fetch(
    &self,
    source: Source,
  ) -> impl Future<Output = Result<Snapshot, Self::Error>> + Send + '_ {
    async move {
      Ok(match source {
        Source::Employee(id) => Snapshot::Employee(self.get_employee(id).await?),
        Source::Employees => Snapshot::Employees(self.list_employees().await?),
        Source::SkillsOf(id) => Snapshot::Skills(self.skills_of(id).await?),
      })
    }
  }
}
