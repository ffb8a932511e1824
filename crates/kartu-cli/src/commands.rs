//! Subcommand handlers. Reads go through the query layer, writes through the
//! mutation gateway.

use anyhow::{Context, bail};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use kartu_core::{
  aggregate::{DevelopmentArea, SkillProgress, UnitAverage},
  employee::Employee,
  id::{EmployeeId, SkillId},
  query::{QueryDescriptor, QueryResult},
  skill::{Category, NewSkill, Skill},
  store::{CompetencyStore, SkillWrite},
};
use kartu_live::{CompetencyCard, LiveStore};
use serde::Serialize;

use crate::{
  EmployeeCommand, EmployeeFields, EmployeeFilter, ReportCommand,
  SkillCommand, SkillFields, SkillFilter,
};

// ─── Output ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Output {
  pub json: bool,
}

impl Output {
  /// Print `value` as pretty JSON, or hand it to `human` for text output.
  fn emit<T: Serialize + ?Sized>(
    self,
    value: &T,
    human: impl FnOnce(&T),
  ) -> anyhow::Result<()> {
    if self.json {
      println!("{}", serde_json::to_string_pretty(value)?);
    } else {
      human(value);
    }
    Ok(())
  }
}

fn print_employees(employees: &[Employee]) {
  if employees.is_empty() {
    println!("no employees");
    return;
  }
  println!(
    "{:<18}  {:<28}  {:<16}  {:<11}  {:>9}",
    "ID", "NAME", "UNIT", "STATUS", "SCORE"
  );
  for e in employees {
    println!(
      "{:<18}  {:<28}  {:<16}  {:<11}  {:>4}/{:<4}",
      e.employee_id,
      e.name,
      e.unit.as_deref().unwrap_or("-"),
      e.status,
      e.overall_score,
      e.target_score,
    );
  }
}

fn print_employee(e: &Employee) {
  println!("{} ({})", e.name, e.employee_id);
  let rows = [
    ("unit", e.unit.clone()),
    ("position", e.position.clone()),
    ("grade", e.grade.clone()),
    ("email", e.email.clone()),
    ("phone", e.phone.clone()),
    ("joined", e.join_date.map(|d| d.to_string())),
    ("supervisor", e.supervisor_id.as_ref().map(ToString::to_string)),
    ("status", Some(e.status.to_string())),
    (
      "score",
      Some(format!(
        "{}/{} ({}%)",
        e.overall_score,
        e.target_score,
        e.completion_percentage()
      )),
    ),
    ("assessed", e.last_assessment.map(|t| t.date_naive().to_string())),
    ("notes", e.notes.clone()),
  ];
  for (label, value) in rows {
    if let Some(value) = value {
      println!("  {label:<11} {value}");
    }
  }
}

fn print_skills(skills: &[Skill]) {
  if skills.is_empty() {
    println!("no skills");
    return;
  }
  println!(
    "{:<36}  {:<10}  {:<28}  {:>9}  {:<6}  {}",
    "ID", "CATEGORY", "NAME", "SCORE", "PRIO", "ASSESSED"
  );
  for s in skills {
    println!(
      "{:<36}  {:<10}  {:<28}  {:>4}/{:<4}  {:<6}  {}",
      s.skill_id,
      s.category,
      s.name,
      s.score,
      s.target_score,
      s.priority,
      s.last_assessed
        .map_or_else(|| "never".to_owned(), |t| t.date_naive().to_string()),
    );
  }
}

fn print_development_areas(areas: &[DevelopmentArea]) {
  if areas.is_empty() {
    println!("every skill is at target");
    return;
  }
  for area in areas {
    println!(
      "{:<28}  gap {:>3}  ({} -> {}, suggested priority {})",
      area.skill.name,
      area.gap,
      area.skill.score,
      area.skill.target_score,
      area.suggested_priority,
    );
  }
}

fn print_progress(progress: &SkillProgress) {
  println!(
    "{} of {} skills at target, average progress {:.1}%",
    progress.achieved, progress.total, progress.average_progress
  );
}

fn print_units(units: &[UnitAverage]) {
  for u in units {
    println!(
      "{:<24}  {:>4} employees  average {:.1}",
      u.unit, u.employees, u.average_score
    );
  }
}

fn print_write(write: &SkillWrite) {
  if !write.changed {
    println!("skill {} unchanged", write.skill.skill_id);
    return;
  }
  println!("skill {} ({})", write.skill.skill_id, write.skill.name);
  if write.rescore.changed() {
    println!(
      "overall score {} -> {}",
      write.rescore.previous, write.rescore.current
    );
  }
}

fn print_card(card: &Option<CompetencyCard>) {
  let Some(card) = card else { return };
  println!(
    "[{}] {} ({})  {}/{}  {}%{}",
    card.initials,
    card.name,
    card.employee_id,
    card.overall_score,
    card.target_score,
    card.completion_percentage,
    if card.needs_assessment { "  needs assessment" } else { "" },
  );
  println!(
    "  {} skills, {} at target, {} to develop, {} stale",
    card.skill_count,
    card.skills_achieved,
    card.development_area_count,
    card.stale_skill_count,
  );
  if let Some(focus) = &card.focus {
    println!("  focus: {focus}");
  }
  for rollup in card.rollup.iter().filter(|r| r.count > 0) {
    println!(
      "  {:<24} {:>3} skills  mean {:.1}",
      rollup.category.label(),
      rollup.count,
      rollup.mean_score.unwrap_or_default(),
    );
  }
}

// ─── Parsing ──────────────────────────────────────────────────────────────────

fn parse_employee_id(raw: &str) -> anyhow::Result<EmployeeId> {
  EmployeeId::parse(raw).with_context(|| format!("invalid employee id {raw:?}"))
}

fn parse_skill_id(raw: &str) -> anyhow::Result<SkillId> {
  raw.parse().with_context(|| format!("invalid skill id {raw:?}"))
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .with_context(|| format!("invalid date {raw:?}, expected YYYY-MM-DD"))
}

/// Midnight UTC on the given day.
fn parse_instant(raw: &str) -> anyhow::Result<DateTime<Utc>> {
  Ok(parse_date(raw)?.and_time(NaiveTime::MIN).and_utc())
}

impl EmployeeFields {
  fn apply(self, e: &mut Employee) -> anyhow::Result<()> {
    if let Some(unit) = self.unit {
      e.unit = Some(unit);
    }
    if let Some(position) = self.position {
      e.position = Some(position);
    }
    if let Some(grade) = self.grade {
      e.grade = Some(grade);
    }
    if let Some(email) = self.email {
      e.email = Some(email);
    }
    if let Some(phone) = self.phone {
      e.phone = Some(phone);
    }
    if let Some(date) = self.join_date {
      e.join_date = Some(parse_date(&date)?);
    }
    if let Some(supervisor) = self.supervisor {
      e.supervisor_id = Some(parse_employee_id(&supervisor)?);
    }
    if let Some(target) = self.target {
      e.target_score = target;
    }
    if let Some(status) = self.status {
      e.status = status;
    }
    if let Some(notes) = self.notes {
      e.notes = Some(notes);
    }
    Ok(())
  }
}

impl SkillFields {
  fn apply(self, s: &mut Skill) -> anyhow::Result<()> {
    if let Some(target) = self.target {
      s.target_score = target;
    }
    if let Some(category) = self.category {
      s.category = category;
    }
    if let Some(priority) = self.priority {
      s.priority = priority;
    }
    if let Some(description) = self.description {
      s.description = Some(description);
    }
    if let Some(assessed) = self.assessed {
      s.last_assessed = Some(parse_instant(&assessed)?);
    }
    if let Some(recommendation) = self.recommendation {
      s.recommendation = Some(recommendation);
    }
    if let Some(assessor) = self.assessor {
      s.assessor = Some(assessor);
    }
    if let Some(notes) = self.notes {
      s.notes = Some(notes);
    }
    Ok(())
  }
}

impl EmployeeFilter {
  fn descriptor(self) -> anyhow::Result<QueryDescriptor> {
    Ok(if let Some(status) = self.status {
      QueryDescriptor::EmployeesByStatus(status)
    } else if let Some(unit) = self.unit {
      QueryDescriptor::EmployeesByUnit(unit)
    } else if let Some(text) = self.search {
      QueryDescriptor::SearchEmployees(text)
    } else if let Some(supervisor) = self.reports_to {
      QueryDescriptor::DirectReports(parse_employee_id(&supervisor)?)
    } else {
      QueryDescriptor::AllEmployees
    })
  }
}

impl SkillFilter {
  fn descriptor(self, id: EmployeeId) -> anyhow::Result<QueryDescriptor> {
    Ok(if let Some(category) = self.category {
      QueryDescriptor::SkillsByCategory(id, category)
    } else if self.high_priority {
      QueryDescriptor::HighPrioritySkills(id)
    } else if self.stale {
      QueryDescriptor::SkillsNeedingAssessment(id)
    } else if self.development {
      QueryDescriptor::DevelopmentAreas(id)
    } else if let Some(text) = self.search {
      QueryDescriptor::SearchSkills(id, text)
    } else if let Some(n) = self.top {
      QueryDescriptor::TopSkills(id, n)
    } else if self.recommended {
      QueryDescriptor::SkillsWithRecommendations(id)
    } else if let Some(since) = self.assessed_since {
      QueryDescriptor::RecentlyAssessedSkills(id, parse_instant(&since)?)
    } else {
      QueryDescriptor::Skills(id)
    })
  }
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

async fn require_employee<S>(
  live: &LiveStore<S>,
  id: &EmployeeId,
) -> anyhow::Result<Employee>
where
  S: CompetencyStore + 'static,
{
  match live.queries().get(&QueryDescriptor::Employee(id.clone())).await? {
    QueryResult::Employee(Some(employee)) => Ok(employee),
    _ => bail!("employee {id} not found"),
  }
}

fn emit_result(out: Output, result: &QueryResult) -> anyhow::Result<()> {
  match result {
    QueryResult::Employee(employee) => out.emit(employee, |e| match e {
      Some(e) => print_employee(e),
      None => println!("not found"),
    }),
    QueryResult::Employees(employees) => {
      out.emit(employees.as_slice(), print_employees)
    }
    QueryResult::Skills(skills) => out.emit(skills.as_slice(), print_skills),
    QueryResult::DevelopmentAreas(areas) => {
      out.emit(areas.as_slice(), print_development_areas)
    }
    QueryResult::Score(score) => out.emit(score, |s| println!("{s}")),
    QueryResult::Progress(progress) => out.emit(progress, print_progress),
    QueryResult::Units(units) => out.emit(units.as_slice(), print_units),
    QueryResult::UnitNames(names) => out.emit(names.as_slice(), |names| {
      for name in names {
        println!("{name}");
      }
    }),
    QueryResult::Count(n) => out.emit(n, |n| println!("{n}")),
  }
}

pub async fn employee<S>(
  live: &LiveStore<S>,
  out: Output,
  cmd: EmployeeCommand,
) -> anyhow::Result<()>
where
  S: CompetencyStore + 'static,
{
  let gateway = live.gateway();
  match cmd {
    EmployeeCommand::Add { id, name, fields } => {
      let mut employee = Employee::new(parse_employee_id(&id)?, name);
      fields.apply(&mut employee)?;
      let stored = gateway.insert_employee(employee)?.await?;
      out.emit(&stored, |e| println!("added {} ({})", e.name, e.employee_id))
    }
    EmployeeCommand::Update { id, name, fields } => {
      let id = parse_employee_id(&id)?;
      let mut employee = require_employee(live, &id).await?;
      if let Some(name) = name {
        employee.name = name;
      }
      fields.apply(&mut employee)?;
      let stored = gateway.update_employee(employee)?.await?;
      out.emit(&stored, print_employee)
    }
    EmployeeCommand::Show { id } => {
      let id = parse_employee_id(&id)?;
      let employee = require_employee(live, &id).await?;
      let skills = live.queries().get(&QueryDescriptor::Skills(id)).await?;
      let skills = skills.skills().unwrap_or_default();

      #[derive(Serialize)]
      struct Profile<'a> {
        employee: &'a Employee,
        skills:   &'a [Skill],
      }
      out.emit(&Profile { employee: &employee, skills }, |p| {
        print_employee(p.employee);
        println!();
        print_skills(p.skills);
      })
    }
    EmployeeCommand::List { filter } => {
      let result = live.queries().get(&filter.descriptor()?).await?;
      emit_result(out, &result)
    }
    EmployeeCommand::Delete { id } => {
      let id = parse_employee_id(&id)?;
      let removed = gateway.delete_employee(id.clone())?.await?;
      out.emit(&removed, |n| println!("deleted {id} and {n} skill(s)"))
    }
    EmployeeCommand::CorrectScore { id, score } => {
      let change = gateway
        .correct_overall_score(parse_employee_id(&id)?, score)?
        .await?;
      out.emit(&change, |c| {
        println!("{}: overall score {} -> {}", c.employee_id, c.previous, c.current)
      })
    }
  }
}

pub async fn skill<S>(
  live: &LiveStore<S>,
  out: Output,
  cmd: SkillCommand,
) -> anyhow::Result<()>
where
  S: CompetencyStore + 'static,
{
  let gateway = live.gateway();
  match cmd {
    SkillCommand::Add { employee, name, score, fields } => {
      let employee_id = parse_employee_id(&employee)?;
      let mut input = NewSkill::new(
        employee_id,
        name,
        score,
        fields.category.unwrap_or(Category::Basic),
      );
      if let Some(target) = fields.target {
        input.target_score = target;
      }
      input.priority = fields.priority;
      input.description = fields.description;
      input.last_assessed = Some(match fields.assessed {
        Some(raw) => parse_instant(&raw)?,
        None => Utc::now(),
      });
      input.recommendation = fields.recommendation;
      input.assessor = fields.assessor;
      input.notes = fields.notes;

      let write = gateway.insert_skill(input)?.await?;
      out.emit(&write, print_write)
    }
    SkillCommand::Update { skill, name, score, fields } => {
      let id = parse_skill_id(&skill)?;
      let Some(mut current) = live.store().get_skill(id).await? else {
        bail!("skill {id} not found");
      };
      if let Some(name) = name {
        current.name = name;
      }
      if let Some(score) = score {
        current.score = score;
        // A new score is a new assessment unless a date was given.
        current.last_assessed = Some(Utc::now());
      }
      fields.apply(&mut current)?;
      let write = gateway.update_skill(current)?.await?;
      out.emit(&write, print_write)
    }
    SkillCommand::Delete { skill } => {
      let write = gateway.delete_skill(parse_skill_id(&skill)?)?.await?;
      out.emit(&write, |w| {
        println!("deleted {} ({})", w.skill.skill_id, w.skill.name);
        if w.rescore.changed() {
          println!(
            "overall score {} -> {}",
            w.rescore.previous, w.rescore.current
          );
        }
      })
    }
    SkillCommand::List { employee, filter } => {
      let id = parse_employee_id(&employee)?;
      require_employee(live, &id).await?;
      let result = live.queries().get(&filter.descriptor(id)?).await?;
      emit_result(out, &result)
    }
  }
}

pub async fn report<S>(
  live: &LiveStore<S>,
  out: Output,
  cmd: ReportCommand,
) -> anyhow::Result<()>
where
  S: CompetencyStore + 'static,
{
  let descriptor = match cmd {
    ReportCommand::BelowTarget => QueryDescriptor::EmployeesBelowTarget,
    ReportCommand::NeedsAssessment => {
      QueryDescriptor::EmployeesNeedingAssessment
    }
    ReportCommand::Top { n } => QueryDescriptor::TopEmployees(n),
    ReportCommand::NeedsDevelopment { threshold } => {
      QueryDescriptor::EmployeesNeedingDevelopment(threshold)
    }
    ReportCommand::Recent { since } => {
      QueryDescriptor::RecentlyAssessedEmployees(parse_instant(&since)?)
    }
    ReportCommand::Units => QueryDescriptor::UnitAverages,
    ReportCommand::UnitNames => QueryDescriptor::AllUnits,
    ReportCommand::Count { status: None } => QueryDescriptor::EmployeeCount,
    ReportCommand::Count { status: Some(status) } => {
      QueryDescriptor::EmployeeCountByStatus(status)
    }
    ReportCommand::Progress { employee } => {
      let id = parse_employee_id(&employee)?;
      require_employee(live, &id).await?;
      QueryDescriptor::Progress(id)
    }
    ReportCommand::Integrity => {
      let defaulted = live.store().defaulted_values().await?;
      return out.emit(defaulted.as_slice(), |rows| {
        if rows.is_empty() {
          println!("all stored values decode cleanly");
        }
        for row in rows {
          println!(
            "{}/{}: {} {:?} read as default",
            row.table, row.key, row.column, row.raw
          );
        }
      });
    }
  };
  let result = live.queries().get(&descriptor).await?;
  emit_result(out, &result)
}

pub async fn watch<S>(
  live: &LiveStore<S>,
  out: Output,
  employee: &str,
) -> anyhow::Result<()>
where
  S: CompetencyStore + 'static,
{
  let id = parse_employee_id(employee)?;
  require_employee(live, &id).await?;

  let graph = live.view_graph();
  let mut cards = graph.card().await;
  graph.select(id);

  loop {
    tokio::select! {
      _ = tokio::signal::ctrl_c() => break,
      card = cards.next() => match card {
        Some(card @ Some(_)) => out.emit(&card, print_card)?,
        Some(None) => continue,
        None => break,
      },
    }
  }
  Ok(())
}
