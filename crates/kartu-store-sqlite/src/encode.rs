//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, and
//! enums are their snake_case names. Enum columns decode tolerantly: an
//! unknown string reads as the default variant and is logged.

use chrono::{DateTime, NaiveDate, Utc};
use kartu_core::{
  decode::{Decoded, decode_or_default},
  employee::{Employee, EmployeeStatus},
  id::{EmployeeId, SkillId},
  query::Table,
  skill::{Category, Priority, Skill},
  store::DefaultedValue,
};
use tracing::warn;

use crate::{Error, Result};

// ─── Column lists ────────────────────────────────────────────────────────────

pub const EMPLOYEE_COLUMNS: &str = "employee_id, name, unit, position, grade, \
  email, phone, join_date, supervisor_id, overall_score, target_score, \
  last_assessment, status, notes";

pub const SKILL_COLUMNS: &str = "skill_id, employee_id, name, description, \
  score, target_score, category, priority, last_assessed, recommendation, \
  assessor, notes";

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_skill_id(id: SkillId) -> String { id.to_string() }

pub fn decode_employee_id(table: &'static str, s: &str) -> Result<EmployeeId> {
  EmployeeId::parse(s).map_err(|e| Error::Corrupt {
    table,
    reason: e.to_string(),
  })
}

fn log_defaulted<T: std::fmt::Debug>(
  decoded: &Decoded<T>,
  table: Table,
  key: &str,
  column: &'static str,
) {
  if let Decoded::Defaulted { value, raw } = decoded {
    warn!(
      %table,
      key,
      column,
      raw = raw.as_str(),
      fallback = ?value,
      "unrecognised enum value, using default"
    );
  }
}

fn defaulted<T>(
  decoded: Decoded<T>,
  table: Table,
  key: &str,
  column: &'static str,
) -> Option<DefaultedValue> {
  match decoded {
    Decoded::Valid(_) => None,
    Decoded::Defaulted { raw, .. } => Some(DefaultedValue {
      table,
      key: key.to_owned(),
      column,
      raw,
    }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values of an `employees` row, as read or about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEmployee {
  pub employee_id:     String,
  pub name:            String,
  pub unit:            Option<String>,
  pub position:        Option<String>,
  pub grade:           Option<String>,
  pub email:           Option<String>,
  pub phone:           Option<String>,
  pub join_date:       Option<String>,
  pub supervisor_id:   Option<String>,
  pub overall_score:   i32,
  pub target_score:    i32,
  pub last_assessment: Option<String>,
  pub status:          String,
  pub notes:           Option<String>,
}

impl RawEmployee {
  /// Map a row selected with [`EMPLOYEE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      employee_id:     row.get(0)?,
      name:            row.get(1)?,
      unit:            row.get(2)?,
      position:        row.get(3)?,
      grade:           row.get(4)?,
      email:           row.get(5)?,
      phone:           row.get(6)?,
      join_date:       row.get(7)?,
      supervisor_id:   row.get(8)?,
      overall_score:   row.get(9)?,
      target_score:    row.get(10)?,
      last_assessment: row.get(11)?,
      status:          row.get(12)?,
      notes:           row.get(13)?,
    })
  }

  pub fn defaulted(&self) -> Option<DefaultedValue> {
    defaulted(
      decode_or_default::<EmployeeStatus>(&self.status),
      Table::Employees,
      &self.employee_id,
      "status",
    )
  }

  pub fn into_employee(self) -> Result<Employee> {
    let status = decode_or_default::<EmployeeStatus>(&self.status);
    log_defaulted(&status, Table::Employees, &self.employee_id, "status");

    // A malformed supervisor is dropped rather than failing the whole row.
    let supervisor_id = self
      .supervisor_id
      .as_deref()
      .and_then(|s| EmployeeId::parse(s).ok());

    Ok(Employee {
      employee_id: decode_employee_id("employees", &self.employee_id)?,
      name: self.name,
      unit: self.unit,
      position: self.position,
      grade: self.grade,
      email: self.email,
      phone: self.phone,
      join_date: self.join_date.as_deref().map(decode_date).transpose()?,
      supervisor_id,
      overall_score: self.overall_score,
      target_score: self.target_score,
      last_assessment: self
        .last_assessment
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      status: status.into_value(),
      notes: self.notes,
    })
  }
}

impl From<&Employee> for RawEmployee {
  fn from(e: &Employee) -> Self {
    Self {
      employee_id:     e.employee_id.to_string(),
      name:            e.name.clone(),
      unit:            e.unit.clone(),
      position:        e.position.clone(),
      grade:           e.grade.clone(),
      email:           e.email.clone(),
      phone:           e.phone.clone(),
      join_date:       e.join_date.map(encode_date),
      supervisor_id:   e.supervisor_id.as_ref().map(ToString::to_string),
      overall_score:   e.overall_score,
      target_score:    e.target_score,
      last_assessment: e.last_assessment.map(encode_dt),
      status:          e.status.as_ref().to_owned(),
      notes:           e.notes.clone(),
    }
  }
}

/// Raw values of a `skills` row, as read or about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSkill {
  pub skill_id:       String,
  pub employee_id:    String,
  pub name:           String,
  pub description:    Option<String>,
  pub score:          i32,
  pub target_score:   i32,
  pub category:       String,
  pub priority:       String,
  pub last_assessed:  Option<String>,
  pub recommendation: Option<String>,
  pub assessor:       Option<String>,
  pub notes:          Option<String>,
}

impl RawSkill {
  /// Map a row selected with [`SKILL_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      skill_id:       row.get(0)?,
      employee_id:    row.get(1)?,
      name:           row.get(2)?,
      description:    row.get(3)?,
      score:          row.get(4)?,
      target_score:   row.get(5)?,
      category:       row.get(6)?,
      priority:       row.get(7)?,
      last_assessed:  row.get(8)?,
      recommendation: row.get(9)?,
      assessor:       row.get(10)?,
      notes:          row.get(11)?,
    })
  }

  pub fn defaulted(&self) -> Vec<DefaultedValue> {
    [
      defaulted(
        decode_or_default::<Category>(&self.category),
        Table::Skills,
        &self.skill_id,
        "category",
      ),
      defaulted(
        decode_or_default::<Priority>(&self.priority),
        Table::Skills,
        &self.skill_id,
        "priority",
      ),
    ]
    .into_iter()
    .flatten()
    .collect()
  }

  pub fn into_skill(self) -> Result<Skill> {
    let category = decode_or_default::<Category>(&self.category);
    log_defaulted(&category, Table::Skills, &self.skill_id, "category");
    let priority = decode_or_default::<Priority>(&self.priority);
    log_defaulted(&priority, Table::Skills, &self.skill_id, "priority");

    Ok(Skill {
      skill_id:       self.skill_id.parse()?,
      employee_id:    decode_employee_id("skills", &self.employee_id)?,
      name:           self.name,
      description:    self.description,
      score:          self.score,
      target_score:   self.target_score,
      category:       category.into_value(),
      priority:       priority.into_value(),
      last_assessed:  self.last_assessed.as_deref().map(decode_dt).transpose()?,
      recommendation: self.recommendation,
      assessor:       self.assessor,
      notes:          self.notes,
    })
  }
}

impl From<&Skill> for RawSkill {
  fn from(s: &Skill) -> Self {
    Self {
      skill_id:       encode_skill_id(s.skill_id),
      employee_id:    s.employee_id.to_string(),
      name:           s.name.clone(),
      description:    s.description.clone(),
      score:          s.score,
      target_score:   s.target_score,
      category:       s.category.as_ref().to_owned(),
      priority:       s.priority.as_ref().to_owned(),
      last_assessed:  s.last_assessed.map(encode_dt),
      recommendation: s.recommendation.clone(),
      assessor:       s.assessor.clone(),
      notes:          s.notes.clone(),
    }
  }
}
