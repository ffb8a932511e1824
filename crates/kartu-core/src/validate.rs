//! Input normalisation run before any store effect.
//!
//! Out-of-range scores are clamped into `0..=target`. Only input that cannot
//! be repaired by clamping is rejected.

use serde::{Deserialize, Serialize};

use crate::{
  aggregate::infer_priority,
  employee::Employee,
  error::ValidationError,
  skill::{NewSkill, Skill},
};

/// How strictly employee ids are checked on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
  /// Any 1 to 18 digit id.
  #[default]
  Lenient,
  /// Exactly 18 digits.
  Canonical,
}

pub fn clamp_score(score: i32, target: i32) -> i32 {
  score.clamp(0, target.max(0))
}

fn check_target(target: i32) -> Result<(), ValidationError> {
  if target > 0 {
    Ok(())
  } else {
    Err(ValidationError::NonPositiveTarget(target))
  }
}

fn normalise_name(name: &str) -> Result<String, ValidationError> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(ValidationError::EmptySkillName);
  }
  Ok(trimmed.to_owned())
}

/// Validate a skill insert, clamping its score and resolving its priority.
pub fn new_skill(mut input: NewSkill) -> Result<NewSkill, ValidationError> {
  check_target(input.target_score)?;
  input.name = normalise_name(&input.name)?;
  input.score = clamp_score(input.score, input.target_score);
  if input.priority.is_none() {
    input.priority = Some(infer_priority(input.score, input.target_score));
  }
  Ok(input)
}

/// Validate a full skill replacement.
pub fn skill(mut input: Skill) -> Result<Skill, ValidationError> {
  check_target(input.target_score)?;
  input.name = normalise_name(&input.name)?;
  input.score = clamp_score(input.score, input.target_score);
  Ok(input)
}

/// Validate an employee write.
pub fn employee(
  mut input: Employee,
  policy: IdPolicy,
) -> Result<Employee, ValidationError> {
  if policy == IdPolicy::Canonical && !input.employee_id.is_canonical() {
    return Err(ValidationError::NonCanonicalEmployeeId(input.employee_id));
  }
  check_target(input.target_score)?;
  input.overall_score = clamp_score(input.overall_score, input.target_score);
  Ok(input)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    id::{EmployeeId, SkillId},
    skill::{Category, Priority},
  };

  fn owner() -> EmployeeId { EmployeeId::parse("199901010001").unwrap() }

  #[test]
  fn scores_are_clamped_not_rejected() {
    let high = new_skill(NewSkill::new(owner(), "Java", 140, Category::Basic))
      .unwrap();
    assert_eq!(high.score, 100);

    let low = new_skill(NewSkill::new(owner(), "Java", -5, Category::Basic))
      .unwrap();
    assert_eq!(low.score, 0);
    assert_eq!(low.priority, Some(Priority::High));
  }

  #[test]
  fn explicit_priority_is_kept() {
    let mut input = NewSkill::new(owner(), "Java", 10, Category::Basic);
    input.priority = Some(Priority::Low);
    assert_eq!(new_skill(input).unwrap().priority, Some(Priority::Low));
  }

  #[test]
  fn blank_names_and_bad_targets_are_rejected() {
    let blank = NewSkill::new(owner(), "  ", 10, Category::Basic);
    assert_eq!(new_skill(blank), Err(ValidationError::EmptySkillName));

    let mut zero = NewSkill::new(owner(), "Java", 10, Category::Basic);
    zero.target_score = 0;
    assert_eq!(new_skill(zero), Err(ValidationError::NonPositiveTarget(0)));

    let mut stored = NewSkill::new(owner(), "Java", 10, Category::Basic)
      .into_skill(SkillId::generate());
    stored.target_score = -1;
    assert_eq!(skill(stored), Err(ValidationError::NonPositiveTarget(-1)));
  }

  #[test]
  fn canonical_policy_requires_eighteen_digits() {
    let short = Employee::new(owner(), "Ani");
    assert!(employee(short.clone(), IdPolicy::Lenient).is_ok());
    assert!(matches!(
      employee(short, IdPolicy::Canonical),
      Err(ValidationError::NonCanonicalEmployeeId(_))
    ));

    let full =
      Employee::new(EmployeeId::parse("199901012020121001").unwrap(), "Budi");
    assert!(employee(full, IdPolicy::Canonical).is_ok());
  }

  #[test]
  fn employee_score_is_clamped_into_target() {
    let mut input = Employee::new(owner(), "Ani");
    input.target_score = 80;
    input.overall_score = 95;
    assert_eq!(employee(input, IdPolicy::Lenient).unwrap().overall_score, 80);
  }
}
