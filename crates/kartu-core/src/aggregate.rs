//! The aggregation engine: pure rollups over a snapshot of skills.
//!
//! Nothing here reads a clock or touches a store. Functions that depend on
//! the current time take it as `now`, so identical inputs always produce
//! identical outputs.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{
  employee::Employee,
  query::compare_names,
  skill::{Category, Priority, Skill},
};

// ─── Staleness ───────────────────────────────────────────────────────────────

/// The maximum age of an assessment, in calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StalenessWindow {
  months: u32,
}

impl StalenessWindow {
  pub const EMPLOYEE_DEFAULT: Self = Self::months(6);
  pub const SKILL_DEFAULT: Self = Self::months(3);

  pub const fn months(months: u32) -> Self { Self { months } }

  pub fn as_months(self) -> u32 { self.months }

  /// Assessments strictly older than this instant are stale.
  pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
    now
      .checked_sub_months(Months::new(self.months))
      .unwrap_or(DateTime::<Utc>::MIN_UTC)
  }
}

/// An assessment is stale if it never happened or is older than `window`.
pub fn is_stale(
  last_assessed: Option<DateTime<Utc>>,
  window: StalenessWindow,
  now: DateTime<Utc>,
) -> bool {
  match last_assessed {
    None => true,
    Some(at) => at < window.cutoff(now),
  }
}

/// Skills due for reassessment, ordered by name.
pub fn stale_skills(
  skills: &[Skill],
  window: StalenessWindow,
  now: DateTime<Utc>,
) -> Vec<Skill> {
  let mut stale: Vec<Skill> = skills
    .iter()
    .filter(|s| s.needs_assessment(window, now))
    .cloned()
    .collect();
  stale.sort_by(|a, b| {
    compare_names(&a.name, &b.name).then_with(|| a.skill_id.cmp(&b.skill_id))
  });
  stale
}

// ─── Overall score ───────────────────────────────────────────────────────────

/// Unweighted mean of each skill's percentage of target, rounded half away
/// from zero. Zero when there are no skills.
pub fn overall_score(skills: &[Skill]) -> i32 {
  overall_score_of(skills.iter().map(|s| (s.score, s.target_score)))
}

/// [`overall_score`] over raw `(score, target)` pairs, for callers that hold
/// rows rather than decoded skills. Pairs with a non-positive target are
/// ignored.
pub fn overall_score_of<I>(parts: I) -> i32
where
  I: IntoIterator<Item = (i32, i32)>,
{
  let (sum, count) = parts
    .into_iter()
    .filter(|&(_, target)| target > 0)
    .fold((0.0_f64, 0_u32), |(sum, count), (score, target)| {
      let percent = f64::from(score) * 100.0 / f64::from(target);
      (sum + percent, count + 1)
    });

  if count == 0 {
    0
  } else {
    (sum / f64::from(count)).round() as i32
  }
}

// ─── Category rollup ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRollup {
  pub category:   Category,
  pub count:      usize,
  /// Mean raw score; `None` for an empty category.
  pub mean_score: Option<f64>,
}

/// One entry per category, in category order, including empty ones.
pub fn category_rollup(skills: &[Skill]) -> Vec<CategoryRollup> {
  Category::iter()
    .map(|category| {
      let (total, count) = skills
        .iter()
        .filter(|s| s.category == category)
        .fold((0_i64, 0_usize), |(total, count), s| {
          (total + i64::from(s.score), count + 1)
        });
      CategoryRollup {
        category,
        count,
        mean_score: (count > 0).then(|| total as f64 / count as f64),
      }
    })
    .collect()
}

// ─── Development areas ───────────────────────────────────────────────────────

/// A skill still short of its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevelopmentArea {
  pub skill:              Skill,
  pub gap:                i32,
  /// The priority the gap alone would suggest.
  pub suggested_priority: Priority,
}

/// Skills with `score < target`, largest gap first, then by name.
pub fn development_areas(skills: &[Skill]) -> Vec<DevelopmentArea> {
  let mut areas: Vec<DevelopmentArea> = skills
    .iter()
    .filter(|s| s.score < s.target_score)
    .map(|s| DevelopmentArea {
      skill:              s.clone(),
      gap:                s.gap(),
      suggested_priority: infer_priority(s.score, s.target_score),
    })
    .collect();

  areas.sort_by(|a, b| {
    b.gap
      .cmp(&a.gap)
      .then_with(|| compare_names(&a.skill.name, &b.skill.name))
      .then_with(|| a.skill.skill_id.cmp(&b.skill.skill_id))
  });
  areas
}

/// Priority implied by the distance to target.
pub fn infer_priority(score: i32, target: i32) -> Priority {
  match target - score {
    gap if gap >= 30 => Priority::High,
    gap if gap >= 15 => Priority::Medium,
    _ => Priority::Low,
  }
}

// ─── Progress ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProgress {
  pub total:            usize,
  /// Skills at or above target.
  pub achieved:         usize,
  /// Mean percentage of target, unrounded.
  pub average_progress: f64,
}

pub fn skill_progress(skills: &[Skill]) -> SkillProgress {
  let achieved = skills.iter().filter(|s| s.is_target_achieved()).count();
  let average_progress = if skills.is_empty() {
    0.0
  } else {
    skills
      .iter()
      .filter(|s| s.target_score > 0)
      .map(|s| f64::from(s.score) * 100.0 / f64::from(s.target_score))
      .sum::<f64>()
      / skills.len() as f64
  };
  SkillProgress { total: skills.len(), achieved, average_progress }
}

/// Share of skills at target, as a percentage.
pub fn completion_percentage(skills: &[Skill]) -> f64 {
  if skills.is_empty() {
    return 0.0;
  }
  let achieved = skills.iter().filter(|s| s.is_target_achieved()).count();
  achieved as f64 / skills.len() as f64 * 100.0
}

// ─── Units ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitAverage {
  pub unit:          String,
  pub employees:     usize,
  pub average_score: f64,
}

/// Mean overall score per organisational unit, ordered by unit name.
/// Employees without a unit are left out.
pub fn unit_averages(employees: &[Employee]) -> Vec<UnitAverage> {
  let mut units: Vec<UnitAverage> = Vec::new();
  for employee in employees {
    let Some(unit) = employee.unit.as_deref() else { continue };
    let score = f64::from(employee.overall_score);
    match units.iter_mut().find(|u| u.unit == unit) {
      Some(entry) => {
        // Running mean.
        entry.employees += 1;
        entry.average_score +=
          (score - entry.average_score) / entry.employees as f64;
      }
      None => units.push(UnitAverage {
        unit:          unit.to_owned(),
        employees:     1,
        average_score: score,
      }),
    }
  }
  units.sort_by(|a, b| a.unit.cmp(&b.unit));
  units
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::{
    id::{EmployeeId, SkillId},
    skill::NewSkill,
  };

  fn owner() -> EmployeeId { EmployeeId::parse("199901010001").unwrap() }

  fn skill(name: &str, score: i32, target: i32, category: Category) -> Skill {
    let mut input = NewSkill::new(owner(), name, score, category);
    input.target_score = target;
    input.into_skill(SkillId::generate())
  }

  fn scenario() -> Vec<Skill> {
    vec![
      skill("Java", 80, 100, Category::Basic),
      skill("Android", 75, 100, Category::Technical),
      skill("Kotlin", 60, 100, Category::Emerging),
    ]
  }

  #[test]
  fn overall_score_of_scenario() {
    let mut skills = scenario();
    assert_eq!(overall_score(&skills), 72);

    skills.retain(|s| s.name != "Kotlin");
    assert_eq!(overall_score(&skills), 78);
  }

  #[test]
  fn overall_score_is_zero_without_skills() {
    assert_eq!(overall_score(&[]), 0);
  }

  #[test]
  fn overall_score_uses_percentage_of_each_target() {
    let skills = vec![
      skill("A", 40, 50, Category::Basic),
      skill("B", 30, 60, Category::Basic),
    ];
    // (80 + 50) / 2
    assert_eq!(overall_score(&skills), 65);
  }

  #[test]
  fn overall_score_ignores_non_positive_targets() {
    assert_eq!(overall_score_of([(50, 100), (10, 0)]), 50);
  }

  #[test]
  fn rollup_covers_every_category() {
    let mut skills = scenario();
    skills.push(skill("Git", 90, 100, Category::Basic));
    let rollup = category_rollup(&skills);

    assert_eq!(rollup.len(), 4);
    assert_eq!(rollup[0].category, Category::Basic);
    assert_eq!(rollup[0].count, 2);
    assert_eq!(rollup[0].mean_score, Some(85.0));
    assert_eq!(rollup[3].category, Category::Potential);
    assert_eq!(rollup[3].count, 0);
    assert_eq!(rollup[3].mean_score, None);
  }

  #[test]
  fn development_areas_order_by_gap_then_name() {
    let skills = vec![
      skill("Delta", 90, 100, Category::Basic),
      skill("Zulu", 70, 100, Category::Basic),
      skill("Alpha", 70, 100, Category::Technical),
      skill("Echo", 95, 100, Category::Basic),
      skill("Done", 100, 100, Category::Basic),
    ];
    let areas = development_areas(&skills);
    let names: Vec<&str> =
      areas.iter().map(|a| a.skill.name.as_str()).collect();
    assert_eq!(names, ["Alpha", "Zulu", "Delta", "Echo"]);
    let gaps: Vec<i32> = areas.iter().map(|a| a.gap).collect();
    assert_eq!(gaps, [30, 30, 10, 5]);
    assert_eq!(areas[0].suggested_priority, Priority::High);
    assert_eq!(areas[3].suggested_priority, Priority::Low);
  }

  #[test]
  fn development_areas_leave_input_untouched() {
    let skills = scenario();
    let before = skills.clone();
    let _ = development_areas(&skills);
    assert_eq!(skills, before);
  }

  #[test]
  fn priority_thresholds() {
    assert_eq!(infer_priority(70, 100), Priority::High);
    assert_eq!(infer_priority(71, 100), Priority::Medium);
    assert_eq!(infer_priority(85, 100), Priority::Medium);
    assert_eq!(infer_priority(86, 100), Priority::Low);
    assert_eq!(infer_priority(120, 100), Priority::Low);
  }

  #[test]
  fn staleness_uses_calendar_months() {
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    let window = StalenessWindow::SKILL_DEFAULT;

    let four_months_ago = Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap();
    assert!(is_stale(Some(four_months_ago), window, now));

    let yesterday = now - Duration::days(1);
    assert!(!is_stale(Some(yesterday), window, now));

    let exactly_three = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
    assert!(!is_stale(Some(exactly_three), window, now));

    assert!(is_stale(None, window, now));
  }

  #[test]
  fn employee_window_is_six_months() {
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
    let mut employee = Employee::new(owner(), "Ani");
    employee.last_assessment =
      Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    assert!(!employee.needs_assessment(StalenessWindow::EMPLOYEE_DEFAULT, now));
    assert!(employee.needs_assessment(StalenessWindow::SKILL_DEFAULT, now));

    employee.last_assessment =
      Some(Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
    assert!(employee.needs_assessment(StalenessWindow::EMPLOYEE_DEFAULT, now));
  }

  #[test]
  fn stale_skills_are_sorted_by_name() {
    let now = Utc::now();
    let mut skills = scenario();
    skills[0].last_assessed = Some(now);
    let stale = stale_skills(&skills, StalenessWindow::SKILL_DEFAULT, now);
    let names: Vec<&str> = stale.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Android", "Kotlin"]);
  }

  #[test]
  fn progress_counts_achieved_skills() {
    let mut skills = scenario();
    skills.push(skill("Git", 100, 100, Category::Basic));
    let progress = skill_progress(&skills);
    assert_eq!(progress.total, 4);
    assert_eq!(progress.achieved, 1);
    assert!((progress.average_progress - 78.75).abs() < 1e-9);
    assert!((completion_percentage(&skills) - 25.0).abs() < 1e-9);
  }

  #[test]
  fn unit_averages_skip_employees_without_unit() {
    let mut a = Employee::new(EmployeeId::parse("1").unwrap(), "A");
    a.unit = Some("IT".into());
    a.overall_score = 80;
    let mut b = Employee::new(EmployeeId::parse("2").unwrap(), "B");
    b.unit = Some("IT".into());
    b.overall_score = 60;
    let mut c = Employee::new(EmployeeId::parse("3").unwrap(), "C");
    c.unit = Some("Finance".into());
    c.overall_score = 50;
    let d = Employee::new(EmployeeId::parse("4").unwrap(), "D");

    let units = unit_averages(&[a, b, c, d]);
    assert_eq!(units.len(), 2);
    assert_eq!(units[0].unit, "Finance");
    assert_eq!(units[1].unit, "IT");
    assert_eq!(units[1].employees, 2);
    assert!((units[1].average_score - 70.0).abs() < 1e-9);
  }
}
