//! [`SqliteStore`], the SQLite implementation of [`CompetencyStore`].

use std::path::Path;

use chrono::Utc;
use kartu_core::{
  aggregate::overall_score_of,
  employee::Employee,
  id::{EmployeeId, SkillId},
  skill::{NewSkill, Skill},
  store::{CompetencyStore, DefaultedValue, ScoreChange, SkillWrite},
  validate::clamp_score,
};
use rusqlite::OptionalExtension as _;
use tracing::debug;

use crate::{
  Error, Result,
  encode::{
    EMPLOYEE_COLUMNS, RawEmployee, RawSkill, SKILL_COLUMNS, encode_dt,
    encode_skill_id,
  },
  schema::SCHEMA,
};

// ─── Row helpers ─────────────────────────────────────────────────────────────
//
// These run on the connection thread, inside whatever transaction the caller
// opened.

fn employee_row(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawEmployee>> {
  conn
    .query_row(
      &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?1"),
      [id],
      RawEmployee::from_row,
    )
    .optional()
}

fn skill_row(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawSkill>> {
  conn
    .query_row(
      &format!("SELECT {SKILL_COLUMNS} FROM skills WHERE skill_id = ?1"),
      [id],
      RawSkill::from_row,
    )
    .optional()
}

fn employee_exists(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM employees WHERE employee_id = ?1", [id], |_| {
        Ok(())
      })
      .optional()?
      .is_some(),
  )
}

fn current_score(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<i32>> {
  conn
    .query_row(
      "SELECT overall_score FROM employees WHERE employee_id = ?1",
      [id],
      |r| r.get(0),
    )
    .optional()
}

/// Recompute an employee's overall score from its remaining skills, clamped
/// into the employee's own target, and stamp the assessment time. Returns
/// `(previous, current)`, or `None` if the employee is gone.
fn rescore(
  conn: &rusqlite::Connection,
  employee_id: &str,
  now: &str,
) -> rusqlite::Result<Option<(i32, i32)>> {
  let Some((previous, target)) = conn
    .query_row(
      "SELECT overall_score, target_score FROM employees WHERE employee_id = ?1",
      [employee_id],
      |r| Ok((r.get::<_, i32>(0)?, r.get::<_, i32>(1)?)),
    )
    .optional()?
  else {
    return Ok(None);
  };

  let parts: Vec<(i32, i32)> = {
    let mut stmt = conn
      .prepare("SELECT score, target_score FROM skills WHERE employee_id = ?1")?;
    stmt
      .query_map([employee_id], |r| Ok((r.get(0)?, r.get(1)?)))?
      .collect::<rusqlite::Result<_>>()?
  };
  let current = clamp_score(overall_score_of(parts), target);

  conn.execute(
    "UPDATE employees SET overall_score = ?2, last_assessment = ?3
     WHERE employee_id = ?1",
    rusqlite::params![employee_id, current, now],
  )?;
  Ok(Some((previous, current)))
}

fn write_skill(
  conn: &rusqlite::Connection,
  raw: &RawSkill,
) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO skills ({SKILL_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
       ON CONFLICT(skill_id) DO UPDATE SET
         name           = excluded.name,
         description    = excluded.description,
         score          = excluded.score,
         target_score   = excluded.target_score,
         category       = excluded.category,
         priority       = excluded.priority,
         last_assessed  = excluded.last_assessed,
         recommendation = excluded.recommendation,
         assessor       = excluded.assessor,
         notes          = excluded.notes"
    ),
    rusqlite::params![
      raw.skill_id,
      raw.employee_id,
      raw.name,
      raw.description,
      raw.score,
      raw.target_score,
      raw.category,
      raw.priority,
      raw.last_assessed,
      raw.recommendation,
      raw.assessor,
      raw.notes,
    ],
  )?;
  Ok(())
}

fn corrupt_owner(skill_id: &str) -> Error {
  Error::Corrupt {
    table:  "skills",
    reason: format!("owner of skill {skill_id} vanished during rescore"),
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A competency store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL against the connection. Test-only backdoor for seeding
  /// rows the typed API refuses to write.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── CompetencyStore impl ────────────────────────────────────────────────────

impl CompetencyStore for SqliteStore {
  type Error = Error;

  // ── Employees ─────────────────────────────────────────────────────────────

  async fn put_employee(&self, employee: Employee) -> Result<Employee> {
    let raw = RawEmployee::from(&employee);

    let stored: RawEmployee = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // A fresh row starts at zero; an existing row keeps its score.
        tx.execute(
          &format!(
            "INSERT INTO employees ({EMPLOYEE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10, ?11, ?12, ?13)
             ON CONFLICT(employee_id) DO UPDATE SET
               name            = excluded.name,
               unit            = excluded.unit,
               position        = excluded.position,
               grade           = excluded.grade,
               email           = excluded.email,
               phone           = excluded.phone,
               join_date       = excluded.join_date,
               supervisor_id   = excluded.supervisor_id,
               target_score    = excluded.target_score,
               last_assessment = excluded.last_assessment,
               status          = excluded.status,
               notes           = excluded.notes"
          ),
          rusqlite::params![
            raw.employee_id,
            raw.name,
            raw.unit,
            raw.position,
            raw.grade,
            raw.email,
            raw.phone,
            raw.join_date,
            raw.supervisor_id,
            raw.target_score,
            raw.last_assessment,
            raw.status,
            raw.notes,
          ],
        )?;
        let stored = tx.query_row(
          &format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?1"
          ),
          [&raw.employee_id],
          RawEmployee::from_row,
        )?;
        tx.commit()?;
        Ok(stored)
      })
      .await?;

    debug!(employee_id = %employee.employee_id, "employee written");
    stored.into_employee()
  }

  async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>> {
    let key = id.to_string();
    let raw = self
      .conn
      .call(move |conn| Ok(employee_row(conn, &key)?))
      .await?;
    raw.map(RawEmployee::into_employee).transpose()
  }

  async fn list_employees(&self) -> Result<Vec<Employee>> {
    let raws: Vec<RawEmployee> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY employee_id"
        ))?;
        let rows = stmt
          .query_map([], RawEmployee::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawEmployee::into_employee).collect()
  }

  async fn delete_employee(&self, id: EmployeeId) -> Result<usize> {
    let key = id.to_string();

    let removed: Result<usize> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let skills =
          tx.execute("DELETE FROM skills WHERE employee_id = ?1", [&key])?;
        let employees =
          tx.execute("DELETE FROM employees WHERE employee_id = ?1", [&key])?;
        if employees == 0 {
          return Ok(Err(kartu_core::Error::EmployeeNotFound(id).into()));
        }
        tx.commit()?;
        Ok(Ok(skills))
      })
      .await?;
    removed
  }

  async fn set_overall_score(
    &self,
    id: EmployeeId,
    score: i32,
  ) -> Result<ScoreChange> {
    let key = id.to_string();
    let employee_id = id.clone();

    let change: Result<(i32, i32)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some((previous, target)) = tx
          .query_row(
            "SELECT overall_score, target_score FROM employees
             WHERE employee_id = ?1",
            [&key],
            |r| Ok((r.get::<_, i32>(0)?, r.get::<_, i32>(1)?)),
          )
          .optional()?
        else {
          return Ok(Err(kartu_core::Error::EmployeeNotFound(employee_id).into()));
        };
        let current = clamp_score(score, target);
        tx.execute(
          "UPDATE employees SET overall_score = ?2 WHERE employee_id = ?1",
          rusqlite::params![key, current],
        )?;
        tx.commit()?;
        Ok(Ok((previous, current)))
      })
      .await?;

    let (previous, current) = change?;
    Ok(ScoreChange { employee_id: id, previous, current })
  }

  // ── Skills ────────────────────────────────────────────────────────────────

  async fn insert_skill(&self, input: NewSkill) -> Result<SkillWrite> {
    let skill = input.into_skill(SkillId::generate());
    let raw = RawSkill::from(&skill);
    let owner = skill.employee_id.clone();
    let now = encode_dt(Utc::now());

    let scores: Result<(i32, i32)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !employee_exists(&tx, &raw.employee_id)? {
          return Ok(Err(kartu_core::Error::UnknownOwner(owner).into()));
        }
        write_skill(&tx, &raw)?;
        let Some(scores) = rescore(&tx, &raw.employee_id, &now)? else {
          return Ok(Err(corrupt_owner(&raw.skill_id)));
        };
        tx.commit()?;
        Ok(Ok(scores))
      })
      .await?;

    let (previous, current) = scores?;
    debug!(skill_id = %skill.skill_id, previous, current, "skill inserted");
    Ok(SkillWrite {
      rescore: ScoreChange {
        employee_id: skill.employee_id.clone(),
        previous,
        current,
      },
      skill,
      changed: true,
    })
  }

  async fn put_skill(&self, skill: Skill) -> Result<SkillWrite> {
    let raw = RawSkill::from(&skill);
    let skill_id = skill.skill_id;
    let requested = skill.employee_id.clone();
    let now = encode_dt(Utc::now());

    let outcome: Result<(bool, i32, i32)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(stored) = skill_row(&tx, &raw.skill_id)? else {
          return Ok(Err(kartu_core::Error::SkillNotFound(skill_id).into()));
        };
        if stored.employee_id != raw.employee_id {
          let owner = match EmployeeId::parse(&stored.employee_id) {
            Ok(owner) => owner,
            Err(e) => {
              return Ok(Err(Error::Corrupt {
                table:  "skills",
                reason: e.to_string(),
              }));
            }
          };
          return Ok(Err(
            kartu_core::Error::OwnerChanged {
              skill: skill_id,
              owner,
              requested,
            }
            .into(),
          ));
        }
        if stored == raw {
          let score = current_score(&tx, &raw.employee_id)?.unwrap_or_default();
          return Ok(Ok((false, score, score)));
        }

        write_skill(&tx, &raw)?;
        let Some((previous, current)) = rescore(&tx, &raw.employee_id, &now)?
        else {
          return Ok(Err(corrupt_owner(&raw.skill_id)));
        };
        tx.commit()?;
        Ok(Ok((true, previous, current)))
      })
      .await?;

    let (changed, previous, current) = outcome?;
    debug!(%skill_id, changed, previous, current, "skill replaced");
    Ok(SkillWrite {
      rescore: ScoreChange {
        employee_id: skill.employee_id.clone(),
        previous,
        current,
      },
      skill,
      changed,
    })
  }

  async fn delete_skill(&self, id: SkillId) -> Result<SkillWrite> {
    let key = encode_skill_id(id);
    let now = encode_dt(Utc::now());

    let outcome: Result<(RawSkill, i32, i32)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(stored) = skill_row(&tx, &key)? else {
          return Ok(Err(kartu_core::Error::SkillNotFound(id).into()));
        };
        tx.execute("DELETE FROM skills WHERE skill_id = ?1", [&key])?;
        let Some((previous, current)) =
          rescore(&tx, &stored.employee_id, &now)?
        else {
          return Ok(Err(corrupt_owner(&key)));
        };
        tx.commit()?;
        Ok(Ok((stored, previous, current)))
      })
      .await?;

    let (stored, previous, current) = outcome?;
    let skill = stored.into_skill()?;
    debug!(skill_id = %id, previous, current, "skill deleted");
    Ok(SkillWrite {
      rescore: ScoreChange {
        employee_id: skill.employee_id.clone(),
        previous,
        current,
      },
      skill,
      changed: true,
    })
  }

  async fn get_skill(&self, id: SkillId) -> Result<Option<Skill>> {
    let key = encode_skill_id(id);
    let raw = self
      .conn
      .call(move |conn| Ok(skill_row(conn, &key)?))
      .await?;
    raw.map(RawSkill::into_skill).transpose()
  }

  async fn skills_of(&self, id: EmployeeId) -> Result<Vec<Skill>> {
    let key = id.to_string();
    let raws: Vec<RawSkill> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SKILL_COLUMNS} FROM skills WHERE employee_id = ?1"
        ))?;
        let rows = stmt
          .query_map([&key], RawSkill::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawSkill::into_skill).collect()
  }

  async fn list_skills(&self) -> Result<Vec<Skill>> {
    let raws: Vec<RawSkill> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SKILL_COLUMNS} FROM skills ORDER BY employee_id, skill_id"
        ))?;
        let rows = stmt
          .query_map([], RawSkill::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawSkill::into_skill).collect()
  }

  // ── Integrity ─────────────────────────────────────────────────────────────

  async fn defaulted_values(&self) -> Result<Vec<DefaultedValue>> {
    let (employees, skills): (Vec<RawEmployee>, Vec<RawSkill>) = self
      .conn
      .call(|conn| {
        let employees = {
          let mut stmt = conn.prepare(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY employee_id"
          ))?;
          stmt
            .query_map([], RawEmployee::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        let skills = {
          let mut stmt = conn.prepare(&format!(
            "SELECT {SKILL_COLUMNS} FROM skills ORDER BY skill_id"
          ))?;
          stmt
            .query_map([], RawSkill::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok((employees, skills))
      })
      .await?;

    Ok(
      employees
        .iter()
        .filter_map(RawEmployee::defaulted)
        .chain(skills.iter().flat_map(RawSkill::defaulted))
        .collect(),
    )
  }
}
