//! `kartu`: command-line front end for the competency store.
//!
//! # Usage
//!
//! ```
//! kartu employee add 1001 "Ayu Lestari" --unit Finance
//! kartu skill add 1001 "Budgeting" 72 --category technical
//! kartu --json report below-target
//! kartu watch 1001
//! ```

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use kartu_core::{
  employee::EmployeeStatus,
  skill::{Category, Priority},
};
use kartu_live::LiveStore;
use kartu_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, expand_tilde};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Employee competency tracking")]
struct Cli {
  /// Path to the TOML config file.
  #[arg(short, long, default_value = "kartu.toml", value_name = "FILE")]
  config: PathBuf,

  /// Database file; overrides `store_path` from the config file.
  #[arg(long, env = "KARTU_STORE", value_name = "FILE")]
  store: Option<PathBuf>,

  /// Print results as JSON instead of tables.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Manage employees.
  #[command(subcommand)]
  Employee(EmployeeCommand),
  /// Manage an employee's skills.
  #[command(subcommand)]
  Skill(SkillCommand),
  /// Organisation-wide reports.
  #[command(subcommand)]
  Report(ReportCommand),
  /// Follow an employee's competency card as it changes. Ctrl-C to stop.
  Watch { employee: String },
}

#[derive(Subcommand, Debug)]
enum EmployeeCommand {
  Add {
    id:     String,
    name:   String,
    #[command(flatten)]
    fields: EmployeeFields,
  },
  /// Change attributes; unspecified ones are kept.
  Update {
    id:     String,
    #[arg(long)]
    name:   Option<String>,
    #[command(flatten)]
    fields: EmployeeFields,
  },
  Show { id: String },
  List {
    #[command(flatten)]
    filter: EmployeeFilter,
  },
  /// Delete an employee together with all of their skills.
  Delete { id: String },
  /// Overwrite the stored overall score.
  CorrectScore { id: String, score: i32 },
}

#[derive(Args, Debug, Default)]
#[group(multiple = false)]
struct EmployeeFilter {
  #[arg(long)]
  status:     Option<EmployeeStatus>,
  #[arg(long)]
  unit:       Option<String>,
  /// Match against name or id.
  #[arg(long)]
  search:     Option<String>,
  /// Direct reports of this supervisor.
  #[arg(long, value_name = "ID")]
  reports_to: Option<String>,
}

#[derive(Args, Debug, Default)]
struct EmployeeFields {
  #[arg(long)]
  unit:       Option<String>,
  #[arg(long)]
  position:   Option<String>,
  #[arg(long)]
  grade:      Option<String>,
  #[arg(long)]
  email:      Option<String>,
  #[arg(long)]
  phone:      Option<String>,
  /// YYYY-MM-DD.
  #[arg(long)]
  join_date:  Option<String>,
  #[arg(long, value_name = "ID")]
  supervisor: Option<String>,
  #[arg(long)]
  target:     Option<i32>,
  #[arg(long)]
  status:     Option<EmployeeStatus>,
  #[arg(long)]
  notes:      Option<String>,
}

#[derive(Subcommand, Debug)]
enum SkillCommand {
  Add {
    employee: String,
    name:     String,
    score:    i32,
    #[command(flatten)]
    fields:   SkillFields,
  },
  /// Change a skill; unspecified attributes are kept.
  Update {
    skill:  String,
    #[arg(long)]
    name:   Option<String>,
    #[arg(long)]
    score:  Option<i32>,
    #[command(flatten)]
    fields: SkillFields,
  },
  Delete { skill: String },
  List {
    employee: String,
    #[command(flatten)]
    filter:   SkillFilter,
  },
}

#[derive(Args, Debug, Default)]
#[group(multiple = false)]
struct SkillFilter {
  #[arg(long)]
  category:       Option<Category>,
  #[arg(long)]
  high_priority:  bool,
  /// Only skills due for reassessment.
  #[arg(long)]
  stale:          bool,
  /// Skills below target, widest gap first.
  #[arg(long)]
  development:    bool,
  /// Match against the skill name.
  #[arg(long)]
  search:         Option<String>,
  /// The N highest-scoring skills.
  #[arg(long, value_name = "N")]
  top:            Option<usize>,
  /// Skills with a recommendation attached.
  #[arg(long)]
  recommended:    bool,
  /// Skills assessed on or after this date, YYYY-MM-DD.
  #[arg(long, value_name = "DATE")]
  assessed_since: Option<String>,
}

#[derive(Args, Debug, Default)]
struct SkillFields {
  #[arg(long)]
  target:         Option<i32>,
  #[arg(long)]
  category:       Option<Category>,
  /// Inferred from the score gap when omitted on add.
  #[arg(long)]
  priority:       Option<Priority>,
  #[arg(long)]
  description:    Option<String>,
  /// Assessment date, YYYY-MM-DD. Defaults to today on add.
  #[arg(long)]
  assessed:       Option<String>,
  #[arg(long)]
  recommendation: Option<String>,
  #[arg(long)]
  assessor:       Option<String>,
  #[arg(long)]
  notes:          Option<String>,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
  /// Employees whose overall score is under target.
  BelowTarget,
  /// Employees due for reassessment.
  NeedsAssessment,
  /// Highest-scoring active employees.
  Top {
    #[arg(short, default_value_t = 10)]
    n: usize,
  },
  /// Active employees scoring under a threshold, weakest first.
  NeedsDevelopment {
    #[arg(default_value_t = 70)]
    threshold: i32,
  },
  /// Employees assessed on or after a date, YYYY-MM-DD.
  Recent { since: String },
  /// Average overall score per unit.
  Units,
  /// Distinct unit names.
  UnitNames,
  /// Number of employees, optionally with one status.
  Count {
    #[arg(long)]
    status: Option<EmployeeStatus>,
  },
  /// Stored values that could not be decoded and were defaulted.
  Integrity,
  /// Skill progress summary for one employee.
  Progress { employee: String },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so they never mix with command output.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let config = AppConfig::load(&expand_tilde(&cli.config))?;
  let store_path = expand_tilde(cli.store.as_ref().unwrap_or(&config.store_path));

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {}", store_path.display()))?;
  let live = LiveStore::new(store, config.live);

  let out = commands::Output { json: cli.json };
  match cli.command {
    Command::Employee(cmd) => commands::employee(&live, out, cmd).await,
    Command::Skill(cmd) => commands::skill(&live, out, cmd).await,
    Command::Report(cmd) => commands::report(&live, out, cmd).await,
    Command::Watch { employee } => commands::watch(&live, out, &employee).await,
  }
}
