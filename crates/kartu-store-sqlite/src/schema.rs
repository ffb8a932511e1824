//! SQL schema for the Kartu SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS employees (
    employee_id     TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    unit            TEXT,
    position        TEXT,
    grade           TEXT,
    email           TEXT,
    phone           TEXT,
    join_date       TEXT,             -- YYYY-MM-DD
    supervisor_id   TEXT,             -- weak reference, no foreign key
    overall_score   INTEGER NOT NULL DEFAULT 0,
    target_score    INTEGER NOT NULL DEFAULT 100,
    last_assessment TEXT,             -- RFC 3339 UTC
    status          TEXT NOT NULL DEFAULT 'active',
    notes           TEXT
);

-- Deleting an employee removes its skills in the same statement.
CREATE TABLE IF NOT EXISTS skills (
    skill_id       TEXT PRIMARY KEY,
    employee_id    TEXT NOT NULL
                   REFERENCES employees(employee_id) ON DELETE CASCADE,
    name           TEXT NOT NULL,
    description    TEXT,
    score          INTEGER NOT NULL DEFAULT 0,
    target_score   INTEGER NOT NULL DEFAULT 100 CHECK (target_score > 0),
    category       TEXT NOT NULL DEFAULT 'basic',
    priority       TEXT NOT NULL DEFAULT 'medium',
    last_assessed  TEXT,
    recommendation TEXT,
    assessor       TEXT,
    notes          TEXT
);

CREATE INDEX IF NOT EXISTS skills_employee_idx ON skills(employee_id);
CREATE INDEX IF NOT EXISTS employees_unit_idx  ON employees(unit);

PRAGMA user_version = 1;
";
