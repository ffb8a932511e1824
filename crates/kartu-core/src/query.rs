//! Query descriptors and their pure evaluation.
//!
//! A [`QueryDescriptor`] names a result set. Evaluation is split in two: the
//! descriptor reports which rows it needs ([`Source`]), a store fetches them
//! into a [`Snapshot`], and [`QueryDescriptor::evaluate`] filters, orders and
//! aggregates the snapshot without further I/O.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  aggregate::{
    self, DevelopmentArea, SkillProgress, StalenessWindow, UnitAverage,
  },
  employee::{Employee, EmployeeStatus},
  id::EmployeeId,
  skill::{Category, Priority, Skill},
};

// ─── Ordering ────────────────────────────────────────────────────────────────

/// Case-insensitive name order, falling back to the exact string so distinct
/// names never compare equal.
///
/// This is not locale collation: letters are compared by lowercased code
/// point, so accented letters sort after `z` (`"Émile"` follows `"Zainal"`).
/// Names in this domain are Indonesian, which needs no diacritic rules.
pub fn compare_names(a: &str, b: &str) -> Ordering {
  a.chars()
    .flat_map(char::to_lowercase)
    .cmp(b.chars().flat_map(char::to_lowercase))
    .then_with(|| a.cmp(b))
}

/// Name ascending, then key.
pub fn sort_employees_by_name(employees: &mut [Employee]) {
  employees.sort_by(|a, b| {
    compare_names(&a.name, &b.name)
      .then_with(|| a.employee_id.cmp(&b.employee_id))
  });
}

/// Category, then name, then key.
pub fn sort_skills(skills: &mut [Skill]) {
  skills.sort_by(|a, b| {
    a.category
      .cmp(&b.category)
      .then_with(|| compare_names(&a.name, &b.name))
      .then_with(|| a.skill_id.cmp(&b.skill_id))
  });
}

fn sort_skills_by_name(skills: &mut [Skill]) {
  skills.sort_by(|a, b| {
    compare_names(&a.name, &b.name).then_with(|| a.skill_id.cmp(&b.skill_id))
  });
}

// ─── Descriptor ──────────────────────────────────────────────────────────────

/// The record table a write touched or a query reads.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Table {
  Employees,
  Skills,
}

/// A named, parameterised result set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryDescriptor {
  /// A single employee; `None` when absent.
  Employee(EmployeeId),
  AllEmployees,
  /// Employees with status `Active`.
  ActiveEmployees,
  EmployeesByStatus(EmployeeStatus),
  EmployeesByUnit(String),
  /// Employees whose supervisor is the given id.
  DirectReports(EmployeeId),
  /// Case-insensitive substring match over name, or substring of the key.
  SearchEmployees(String),
  EmployeesBelowTarget,
  EmployeesNeedingAssessment,
  /// Employees never assessed or last assessed before the instant.
  EmployeesAssessedBefore(DateTime<Utc>),
  /// The `n` best active employees by overall score.
  TopEmployees(usize),
  /// Active employees scoring under the threshold, weakest first.
  EmployeesNeedingDevelopment(i32),
  /// Employees assessed at or after the instant, most recent first.
  RecentlyAssessedEmployees(DateTime<Utc>),
  UnitAverages,
  /// Distinct unit names, ascending.
  AllUnits,
  EmployeeCount,
  EmployeeCountByStatus(EmployeeStatus),
  Skills(EmployeeId),
  SkillsByCategory(EmployeeId, Category),
  DevelopmentAreas(EmployeeId),
  HighPrioritySkills(EmployeeId),
  SkillsNeedingAssessment(EmployeeId),
  /// Case-insensitive substring match over skill names.
  SearchSkills(EmployeeId, String),
  /// The `n` highest-scoring skills.
  TopSkills(EmployeeId, usize),
  /// Skills carrying a non-blank recommendation.
  SkillsWithRecommendations(EmployeeId),
  /// Skills assessed at or after the instant, most recent first.
  RecentlyAssessedSkills(EmployeeId, DateTime<Utc>),
  /// The aggregated score, computed from the skills rather than read back.
  OverallScore(EmployeeId),
  Progress(EmployeeId),
}

/// The rows a descriptor needs fetched before evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
  Employee(EmployeeId),
  Employees,
  SkillsOf(EmployeeId),
}

impl Source {
  pub fn table(&self) -> Table {
    match self {
      Self::Employee(_) | Self::Employees => Table::Employees,
      Self::SkillsOf(_) => Table::Skills,
    }
  }
}

/// Rows fetched for a [`Source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
  Employee(Option<Employee>),
  Employees(Vec<Employee>),
  Skills(Vec<Skill>),
}

/// Wall-clock inputs to evaluation.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext {
  pub now:             DateTime<Utc>,
  pub skill_window:    StalenessWindow,
  pub employee_window: StalenessWindow,
}

impl QueryContext {
  /// Default windows, evaluated at the current instant.
  pub fn now() -> Self {
    Self {
      now:             Utc::now(),
      skill_window:    StalenessWindow::SKILL_DEFAULT,
      employee_window: StalenessWindow::EMPLOYEE_DEFAULT,
    }
  }
}

/// An evaluated result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum QueryResult {
  Employee(Option<Employee>),
  Employees(Vec<Employee>),
  Skills(Vec<Skill>),
  DevelopmentAreas(Vec<DevelopmentArea>),
  Score(i32),
  Progress(SkillProgress),
  Units(Vec<UnitAverage>),
  UnitNames(Vec<String>),
  Count(usize),
}

impl QueryResult {
  pub fn employees(&self) -> Option<&[Employee]> {
    match self {
      Self::Employees(e) => Some(e),
      _ => None,
    }
  }

  pub fn skills(&self) -> Option<&[Skill]> {
    match self {
      Self::Skills(s) => Some(s),
      _ => None,
    }
  }

  pub fn score(&self) -> Option<i32> {
    match self {
      Self::Score(s) => Some(*s),
      _ => None,
    }
  }

  pub fn count(&self) -> Option<usize> {
    match self {
      Self::Count(n) => Some(*n),
      _ => None,
    }
  }
}

impl QueryDescriptor {
  pub fn source(&self) -> Source {
    match self {
      Self::Employee(id) => Source::Employee(id.clone()),
      Self::AllEmployees
      | Self::ActiveEmployees
      | Self::EmployeesByStatus(_)
      | Self::EmployeesByUnit(_)
      | Self::DirectReports(_)
      | Self::SearchEmployees(_)
      | Self::EmployeesBelowTarget
      | Self::EmployeesNeedingAssessment
      | Self::EmployeesAssessedBefore(_)
      | Self::TopEmployees(_)
      | Self::EmployeesNeedingDevelopment(_)
      | Self::RecentlyAssessedEmployees(_)
      | Self::UnitAverages
      | Self::AllUnits
      | Self::EmployeeCount
      | Self::EmployeeCountByStatus(_) => Source::Employees,
      Self::Skills(id)
      | Self::SkillsByCategory(id, _)
      | Self::DevelopmentAreas(id)
      | Self::HighPrioritySkills(id)
      | Self::SkillsNeedingAssessment(id)
      | Self::SearchSkills(id, _)
      | Self::TopSkills(id, _)
      | Self::SkillsWithRecommendations(id)
      | Self::RecentlyAssessedSkills(id, _)
      | Self::OverallScore(id)
      | Self::Progress(id) => Source::SkillsOf(id.clone()),
    }
  }

  /// Whether a write to `table` could change this result.
  pub fn depends_on(&self, table: Table) -> bool {
    self.source().table() == table
  }

  /// Whether the result depends on the time of evaluation.
  pub fn is_time_sensitive(&self) -> bool {
    matches!(
      self,
      Self::EmployeesNeedingAssessment | Self::SkillsNeedingAssessment(_)
    )
  }

  /// Evaluate against rows fetched for [`Self::source`]. A snapshot of the
  /// wrong shape evaluates as if it were empty.
  pub fn evaluate(&self, snapshot: Snapshot, cx: &QueryContext) -> QueryResult {
    match snapshot {
      Snapshot::Employee(employee) => match self {
        Self::Employee(_) => QueryResult::Employee(employee),
        _ => self.evaluate_employees(Vec::from_iter(employee), cx),
      },
      Snapshot::Employees(employees) => self.evaluate_employees(employees, cx),
      Snapshot::Skills(skills) => self.evaluate_skills(skills, cx),
    }
  }

  fn evaluate_employees(
    &self,
    mut employees: Vec<Employee>,
    cx: &QueryContext,
  ) -> QueryResult {
    match self {
      Self::Employee(id) => QueryResult::Employee(
        employees.into_iter().find(|e| &e.employee_id == id),
      ),
      Self::UnitAverages => {
        QueryResult::Units(aggregate::unit_averages(&employees))
      }
      Self::AllUnits => {
        let mut units: Vec<String> =
          employees.into_iter().filter_map(|e| e.unit).collect();
        units.sort();
        units.dedup();
        QueryResult::UnitNames(units)
      }
      Self::EmployeeCount => QueryResult::Count(employees.len()),
      Self::EmployeeCountByStatus(status) => QueryResult::Count(
        employees.iter().filter(|e| e.status == *status).count(),
      ),
      Self::EmployeesNeedingDevelopment(threshold) => {
        employees
          .retain(|e| e.status.is_active() && e.overall_score < *threshold);
        employees.sort_by(|a, b| {
          a.overall_score
            .cmp(&b.overall_score)
            .then_with(|| a.employee_id.cmp(&b.employee_id))
        });
        QueryResult::Employees(employees)
      }
      Self::RecentlyAssessedEmployees(cutoff) => {
        employees.retain(|e| e.last_assessment.is_some_and(|at| at >= *cutoff));
        employees.sort_by(|a, b| {
          b.last_assessment
            .cmp(&a.last_assessment)
            .then_with(|| a.employee_id.cmp(&b.employee_id))
        });
        QueryResult::Employees(employees)
      }
      Self::EmployeesBelowTarget => {
        employees.retain(Employee::is_below_target);
        employees.sort_by(|a, b| {
          b.gap().cmp(&a.gap()).then_with(|| a.employee_id.cmp(&b.employee_id))
        });
        QueryResult::Employees(employees)
      }
      Self::TopEmployees(n) => {
        employees.retain(|e| e.status.is_active());
        employees.sort_by(|a, b| {
          b.overall_score
            .cmp(&a.overall_score)
            .then_with(|| a.employee_id.cmp(&b.employee_id))
        });
        employees.truncate(*n);
        QueryResult::Employees(employees)
      }
      filter => {
        employees.retain(|e| filter.matches_employee(e, cx));
        sort_employees_by_name(&mut employees);
        QueryResult::Employees(employees)
      }
    }
  }

  fn matches_employee(&self, e: &Employee, cx: &QueryContext) -> bool {
    match self {
      Self::ActiveEmployees => e.status.is_active(),
      Self::EmployeesByStatus(status) => e.status == *status,
      Self::EmployeesByUnit(unit) => e.unit.as_deref() == Some(unit.as_str()),
      Self::DirectReports(id) => e.supervisor_id.as_ref() == Some(id),
      Self::SearchEmployees(text) => {
        let needle = text.to_lowercase();
        e.name.to_lowercase().contains(&needle)
          || e.employee_id.as_str().contains(text.trim())
      }
      Self::EmployeesNeedingAssessment => {
        e.needs_assessment(cx.employee_window, cx.now)
      }
      Self::EmployeesAssessedBefore(cutoff) => {
        e.last_assessment.is_none_or(|at| at < *cutoff)
      }
      _ => true,
    }
  }

  fn evaluate_skills(
    &self,
    mut skills: Vec<Skill>,
    cx: &QueryContext,
  ) -> QueryResult {
    match self {
      Self::OverallScore(_) => {
        QueryResult::Score(aggregate::overall_score(&skills))
      }
      Self::Progress(_) => {
        QueryResult::Progress(aggregate::skill_progress(&skills))
      }
      Self::DevelopmentAreas(_) => {
        QueryResult::DevelopmentAreas(aggregate::development_areas(&skills))
      }
      Self::SkillsNeedingAssessment(_) => QueryResult::Skills(
        aggregate::stale_skills(&skills, cx.skill_window, cx.now),
      ),
      Self::SkillsByCategory(_, category) => {
        skills.retain(|s| s.category == *category);
        sort_skills_by_name(&mut skills);
        QueryResult::Skills(skills)
      }
      Self::HighPrioritySkills(_) => {
        skills.retain(|s| s.priority == Priority::High);
        sort_skills_by_name(&mut skills);
        QueryResult::Skills(skills)
      }
      Self::SearchSkills(_, text) => {
        let needle = text.trim().to_lowercase();
        skills.retain(|s| s.name.to_lowercase().contains(&needle));
        sort_skills_by_name(&mut skills);
        QueryResult::Skills(skills)
      }
      Self::TopSkills(_, n) => {
        skills.sort_by(|a, b| {
          b.score
            .cmp(&a.score)
            .then_with(|| compare_names(&a.name, &b.name))
            .then_with(|| a.skill_id.cmp(&b.skill_id))
        });
        skills.truncate(*n);
        QueryResult::Skills(skills)
      }
      Self::SkillsWithRecommendations(_) => {
        skills.retain(|s| {
          s.recommendation.as_deref().is_some_and(|r| !r.trim().is_empty())
        });
        sort_skills_by_name(&mut skills);
        QueryResult::Skills(skills)
      }
      Self::RecentlyAssessedSkills(_, cutoff) => {
        skills.retain(|s| s.last_assessed.is_some_and(|at| at >= *cutoff));
        skills.sort_by(|a, b| {
          b.last_assessed
            .cmp(&a.last_assessed)
            .then_with(|| compare_names(&a.name, &b.name))
            .then_with(|| a.skill_id.cmp(&b.skill_id))
        });
        QueryResult::Skills(skills)
      }
      _ => {
        sort_skills(&mut skills);
        QueryResult::Skills(skills)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;
  use crate::{
    id::SkillId,
    skill::NewSkill,
  };

  fn id(raw: &str) -> EmployeeId { EmployeeId::parse(raw).unwrap() }

  fn employee(key: &str, name: &str, score: i32) -> Employee {
    let mut e = Employee::new(id(key), name);
    e.overall_score = score;
    e
  }

  fn skill(name: &str, score: i32, category: Category) -> Skill {
    NewSkill::new(id("1"), name, score, category)
      .into_skill(SkillId::generate())
  }

  fn names(result: &QueryResult) -> Vec<String> {
    match result {
      QueryResult::Employees(e) => e.iter().map(|e| e.name.clone()).collect(),
      QueryResult::Skills(s) => s.iter().map(|s| s.name.clone()).collect(),
      other => panic!("unexpected result {other:?}"),
    }
  }

  #[test]
  fn names_sort_case_insensitively() {
    let mut employees = vec![
      employee("3", "citra", 0),
      employee("1", "Budi", 0),
      employee("2", "ani", 0),
    ];
    sort_employees_by_name(&mut employees);
    let sorted: Vec<&str> = employees.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(sorted, ["ani", "Budi", "citra"]);
  }

  #[test]
  fn equal_names_fall_back_to_key() {
    let result = QueryDescriptor::AllEmployees.evaluate(
      Snapshot::Employees(vec![employee("9", "Ani", 0), employee("2", "Ani", 0)]),
      &QueryContext::now(),
    );
    let keys: Vec<&str> = result
      .employees()
      .unwrap()
      .iter()
      .map(|e| e.employee_id.as_str())
      .collect();
    assert_eq!(keys, ["2", "9"]);
  }

  #[test]
  fn below_target_orders_by_descending_gap_then_key() {
    let employees = vec![
      employee("1", "A", 90),
      employee("3", "C", 50),
      employee("2", "B", 50),
      employee("4", "D", 100),
    ];
    let result = QueryDescriptor::EmployeesBelowTarget
      .evaluate(Snapshot::Employees(employees), &QueryContext::now());
    let keys: Vec<&str> = result
      .employees()
      .unwrap()
      .iter()
      .map(|e| e.employee_id.as_str())
      .collect();
    assert_eq!(keys, ["2", "3", "1"]);
  }

  #[test]
  fn top_employees_only_counts_active() {
    let mut away = employee("1", "Away", 99);
    away.status = EmployeeStatus::OnLeave;
    let employees = vec![
      away,
      employee("2", "B", 70),
      employee("3", "C", 80),
      employee("4", "D", 60),
    ];
    let result = QueryDescriptor::TopEmployees(2)
      .evaluate(Snapshot::Employees(employees), &QueryContext::now());
    assert_eq!(names(&result), ["C", "B"]);
  }

  #[test]
  fn skills_order_by_category_then_name() {
    let skills = vec![
      skill("kotlin", 60, Category::Emerging),
      skill("Java", 80, Category::Basic),
      skill("Android", 75, Category::Technical),
      skill("Git", 90, Category::Basic),
    ];
    let result = QueryDescriptor::Skills(id("1"))
      .evaluate(Snapshot::Skills(skills), &QueryContext::now());
    assert_eq!(names(&result), ["Git", "Java", "Android", "kotlin"]);
  }

  #[test]
  fn search_matches_name_or_key() {
    let employees = vec![
      employee("199901010001", "Budi Santoso", 0),
      employee("200002020002", "Ani", 0),
    ];
    let by_name = QueryDescriptor::SearchEmployees("santo".into())
      .evaluate(Snapshot::Employees(employees.clone()), &QueryContext::now());
    assert_eq!(names(&by_name), ["Budi Santoso"]);

    let by_key = QueryDescriptor::SearchEmployees("20000".into())
      .evaluate(Snapshot::Employees(employees), &QueryContext::now());
    assert_eq!(names(&by_key), ["Ani"]);
  }

  #[test]
  fn assessed_before_includes_never_assessed() {
    let cx = QueryContext::now();
    let mut recent = employee("1", "Recent", 0);
    recent.last_assessment = Some(cx.now);
    let mut old = employee("2", "Old", 0);
    old.last_assessment = Some(cx.now - Duration::days(400));
    let never = employee("3", "Never", 0);

    let cutoff = cx.now - Duration::days(30);
    let result = QueryDescriptor::EmployeesAssessedBefore(cutoff)
      .evaluate(Snapshot::Employees(vec![recent, old, never]), &cx);
    assert_eq!(names(&result), ["Never", "Old"]);
  }

  #[test]
  fn score_is_computed_from_skills() {
    let skills = vec![
      skill("Java", 80, Category::Basic),
      skill("Android", 75, Category::Technical),
      skill("Kotlin", 60, Category::Emerging),
    ];
    let result = QueryDescriptor::OverallScore(id("1"))
      .evaluate(Snapshot::Skills(skills), &QueryContext::now());
    assert_eq!(result.score(), Some(72));
  }

  #[test]
  fn needing_development_lists_weakest_active_first() {
    let mut away = employee("1", "Away", 10);
    away.status = EmployeeStatus::OnLeave;
    let employees = vec![
      away,
      employee("2", "B", 55),
      employee("3", "C", 40),
      employee("4", "D", 70),
    ];
    let result = QueryDescriptor::EmployeesNeedingDevelopment(60)
      .evaluate(Snapshot::Employees(employees), &QueryContext::now());
    assert_eq!(names(&result), ["C", "B"]);
  }

  #[test]
  fn recently_assessed_employees_newest_first() {
    let cx = QueryContext::now();
    let mut fresh = employee("1", "Fresh", 0);
    fresh.last_assessment = Some(cx.now - Duration::days(1));
    let mut week = employee("2", "Week", 0);
    week.last_assessment = Some(cx.now - Duration::days(7));
    let mut old = employee("3", "Old", 0);
    old.last_assessment = Some(cx.now - Duration::days(90));
    let never = employee("4", "Never", 0);

    let result = QueryDescriptor::RecentlyAssessedEmployees(
      cx.now - Duration::days(30),
    )
    .evaluate(Snapshot::Employees(vec![old, week, never, fresh]), &cx);
    assert_eq!(names(&result), ["Fresh", "Week"]);
  }

  #[test]
  fn units_are_distinct_and_sorted() {
    let mut a = employee("1", "A", 0);
    a.unit = Some("Keuangan".into());
    let mut b = employee("2", "B", 0);
    b.unit = Some("Hukum".into());
    let mut c = employee("3", "C", 0);
    c.unit = Some("Keuangan".into());
    let d = employee("4", "D", 0);

    let result = QueryDescriptor::AllUnits
      .evaluate(Snapshot::Employees(vec![a, b, c, d]), &QueryContext::now());
    assert_eq!(
      result,
      QueryResult::UnitNames(vec!["Hukum".into(), "Keuangan".into()])
    );
  }

  #[test]
  fn counts_total_and_by_status() {
    let mut away = employee("1", "Away", 0);
    away.status = EmployeeStatus::OnLeave;
    let employees = vec![away, employee("2", "B", 0), employee("3", "C", 0)];
    let cx = QueryContext::now();

    let total = QueryDescriptor::EmployeeCount
      .evaluate(Snapshot::Employees(employees.clone()), &cx);
    assert_eq!(total.count(), Some(3));

    let on_leave = QueryDescriptor::EmployeeCountByStatus(EmployeeStatus::OnLeave)
      .evaluate(Snapshot::Employees(employees), &cx);
    assert_eq!(on_leave.count(), Some(1));
  }

  #[test]
  fn skill_search_ignores_case() {
    let skills = vec![
      skill("Java", 80, Category::Basic),
      skill("JavaScript", 70, Category::Technical),
      skill("Kotlin", 60, Category::Emerging),
    ];
    let result = QueryDescriptor::SearchSkills(id("1"), " JAVA".into())
      .evaluate(Snapshot::Skills(skills), &QueryContext::now());
    assert_eq!(names(&result), ["Java", "JavaScript"]);
  }

  #[test]
  fn top_skills_by_score_then_name() {
    let skills = vec![
      skill("Kotlin", 60, Category::Emerging),
      skill("Java", 80, Category::Basic),
      skill("Git", 80, Category::Basic),
      skill("Android", 75, Category::Technical),
    ];
    let result = QueryDescriptor::TopSkills(id("1"), 3)
      .evaluate(Snapshot::Skills(skills), &QueryContext::now());
    assert_eq!(names(&result), ["Git", "Java", "Android"]);
  }

  #[test]
  fn recommendations_skip_blank_text() {
    let mut coached = skill("Java", 80, Category::Basic);
    coached.recommendation = Some("Pair on code review".into());
    let mut blank = skill("Git", 90, Category::Basic);
    blank.recommendation = Some("  ".into());
    let none = skill("Kotlin", 60, Category::Emerging);

    let result = QueryDescriptor::SkillsWithRecommendations(id("1"))
      .evaluate(Snapshot::Skills(vec![none, blank, coached]), &QueryContext::now());
    assert_eq!(names(&result), ["Java"]);
  }

  #[test]
  fn recently_assessed_skills_newest_first() {
    let cx = QueryContext::now();
    let mut fresh = skill("Java", 80, Category::Basic);
    fresh.last_assessed = Some(cx.now - Duration::days(2));
    let mut older = skill("Git", 90, Category::Basic);
    older.last_assessed = Some(cx.now - Duration::days(20));
    let mut stale = skill("Kotlin", 60, Category::Emerging);
    stale.last_assessed = Some(cx.now - Duration::days(200));

    let result = QueryDescriptor::RecentlyAssessedSkills(
      id("1"),
      cx.now - Duration::days(30),
    )
    .evaluate(Snapshot::Skills(vec![stale, older, fresh]), &cx);
    assert_eq!(names(&result), ["Java", "Git"]);
  }

  #[test]
  fn names_compare_by_code_point_not_locale() {
    assert_eq!(compare_names("Émile", "Zainal"), Ordering::Greater);
    assert_eq!(compare_names("ani", "Ani"), Ordering::Greater);
  }

  #[test]
  fn sources_map_to_tables() {
    assert!(QueryDescriptor::AllEmployees.depends_on(Table::Employees));
    assert!(!QueryDescriptor::AllEmployees.depends_on(Table::Skills));
    assert!(QueryDescriptor::OverallScore(id("1")).depends_on(Table::Skills));
    assert_eq!(
      QueryDescriptor::SkillsByCategory(id("7"), Category::Basic).source(),
      Source::SkillsOf(id("7"))
    );
  }
}
