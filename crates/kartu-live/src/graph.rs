//! The reactive view graph for one selected employee.
//!
//! ```text
//!   selected ─┬─> employee ───────────────────────────┐
//!             └─> skills ─┬─> score                   ├─> card
//!                         ├─> rollup                  │
//!                         ├─> development_areas ──────┤
//!                         ├─> progress                │
//!                         └─> stale_skills (+clock) ──┘
//! ```
//!
//! A single driver task owns recomputation. Each pass publishes nodes in
//! the order above, and a node is only recomputed when one of its inputs
//! was republished with a different value during that pass. Subscribing to
//! a node first asks the driver for a full pass, so a new subscriber starts
//! from the store's state at the time of the call.

use std::sync::Arc;

use chrono::Utc;
use kartu_core::{
  aggregate::{self, CategoryRollup, DevelopmentArea, SkillProgress},
  employee::{Employee, EmployeeStatus},
  id::EmployeeId,
  query::{QueryContext, sort_skills},
  skill::Skill,
  store::CompetencyStore,
};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  config::LiveConfig,
  invalidation::{Invalidation, InvalidationStream, Invalidator},
  subscription::{Subscription, publish_if_changed},
};

// ─── Node ────────────────────────────────────────────────────────────────────

/// One derived value in the graph.
pub struct Node<T> {
  tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Node<T> {
  fn clone(&self) -> Self { Self { tx: self.tx.clone() } }
}

impl<T: Clone + PartialEq> Node<T> {
  fn new(initial: T) -> Self {
    let (tx, _) = watch::channel(initial);
    Self { tx: Arc::new(tx) }
  }

  pub fn subscribe(&self) -> Subscription<T> {
    Subscription::new(self.tx.subscribe())
  }

  pub fn current(&self) -> T { self.tx.borrow().clone() }

  fn publish(&self, value: T) -> bool { publish_if_changed(&self.tx, value) }
}

// ─── View model ──────────────────────────────────────────────────────────────

/// Everything a profile card shows for the selected employee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetencyCard {
  pub employee_id:            EmployeeId,
  pub name:                   String,
  pub initials:               String,
  pub unit:                   Option<String>,
  pub position:               Option<String>,
  pub status:                 EmployeeStatus,
  pub overall_score:          i32,
  pub target_score:           i32,
  pub completion_percentage:  i32,
  pub needs_assessment:       bool,
  pub skill_count:            usize,
  pub skills_achieved:        usize,
  pub development_area_count: usize,
  pub stale_skill_count:      usize,
  /// Name of the widest-gap development area.
  pub focus:                  Option<String>,
  pub rollup:                 Vec<CategoryRollup>,
}

impl CompetencyCard {
  fn build(
    employee: &Employee,
    progress: &SkillProgress,
    rollup: &[CategoryRollup],
    areas: &[DevelopmentArea],
    stale: &[Skill],
    cx: &QueryContext,
  ) -> Self {
    Self {
      employee_id:            employee.employee_id.clone(),
      name:                   employee.name.clone(),
      initials:               employee.initials(),
      unit:                   employee.unit.clone(),
      position:               employee.position.clone(),
      status:                 employee.status,
      overall_score:          employee.overall_score,
      target_score:           employee.target_score,
      completion_percentage:  employee.completion_percentage(),
      needs_assessment:       employee
        .needs_assessment(cx.employee_window, cx.now),
      skill_count:            progress.total,
      skills_achieved:        progress.achieved,
      development_area_count: areas.len(),
      stale_skill_count:      stale.len(),
      focus:                  areas.first().map(|a| a.skill.name.clone()),
      rollup:                 rollup.to_vec(),
    }
  }
}

// ─── Graph ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct Nodes {
  employee:          Node<Option<Employee>>,
  skills:            Node<Vec<Skill>>,
  score:             Node<i32>,
  rollup:            Node<Vec<CategoryRollup>>,
  development_areas: Node<Vec<DevelopmentArea>>,
  progress:          Node<SkillProgress>,
  stale_skills:      Node<Vec<Skill>>,
  card:              Node<Option<CompetencyCard>>,
}

impl Nodes {
  fn new() -> Self {
    Self {
      employee:          Node::new(None),
      skills:            Node::new(Vec::new()),
      score:             Node::new(0),
      rollup:            Node::new(aggregate::category_rollup(&[])),
      development_areas: Node::new(Vec::new()),
      progress:          Node::new(aggregate::skill_progress(&[])),
      stale_skills:      Node::new(Vec::new()),
      card:              Node::new(None),
    }
  }
}

/// The derived views of one selected employee, kept current by a driver
/// task. Dropping the graph stops the driver; live subscriptions then see
/// their stream end.
pub struct ViewGraph {
  selected: watch::Sender<Option<EmployeeId>>,
  syncs:    mpsc::UnboundedSender<oneshot::Sender<()>>,
  nodes:    Nodes,
}

impl ViewGraph {
  pub fn spawn<S>(store: Arc<S>, invalidator: &Invalidator, config: LiveConfig) -> Self
  where
    S: CompetencyStore + 'static,
  {
    let (selected, selection) = watch::channel(None);
    let (syncs, sync_requests) = mpsc::unbounded_channel();
    let nodes = Nodes::new();
    let driver = Driver {
      store,
      config,
      nodes: nodes.clone(),
      selection,
      sync_requests,
      invalidations: invalidator.subscribe(),
    };
    tokio::spawn(driver.run());
    Self { selected, syncs, nodes }
  }

  /// Wait for the driver to run a full pass against the store. Returns
  /// immediately if the driver has stopped.
  async fn sync(&self) {
    let (done, synced) = oneshot::channel();
    if self.syncs.send(done).is_ok() {
      let _ = synced.await;
    }
  }

  /// Point the graph at `id`. Re-selecting the current employee is a no-op.
  pub fn select(&self, id: EmployeeId) -> bool {
    self.selected.send_if_modified(|current| {
      if current.as_ref() == Some(&id) {
        false
      } else {
        *current = Some(id);
        true
      }
    })
  }

  pub fn clear(&self) -> bool {
    self.selected.send_if_modified(|current| current.take().is_some())
  }

  pub fn selected(&self) -> Option<EmployeeId> {
    self.selected.borrow().clone()
  }

  pub async fn employee(&self) -> Subscription<Option<Employee>> {
    self.sync().await;
    self.nodes.employee.subscribe()
  }

  /// The selected employee's skills, ordered by category then name.
  pub async fn skills(&self) -> Subscription<Vec<Skill>> {
    self.sync().await;
    self.nodes.skills.subscribe()
  }

  /// The overall score aggregated from the current skills.
  pub async fn score(&self) -> Subscription<i32> {
    self.sync().await;
    self.nodes.score.subscribe()
  }

  pub async fn rollup(&self) -> Subscription<Vec<CategoryRollup>> {
    self.sync().await;
    self.nodes.rollup.subscribe()
  }

  pub async fn development_areas(&self) -> Subscription<Vec<DevelopmentArea>> {
    self.sync().await;
    self.nodes.development_areas.subscribe()
  }

  pub async fn progress(&self) -> Subscription<SkillProgress> {
    self.sync().await;
    self.nodes.progress.subscribe()
  }

  pub async fn stale_skills(&self) -> Subscription<Vec<Skill>> {
    self.sync().await;
    self.nodes.stale_skills.subscribe()
  }

  pub async fn card(&self) -> Subscription<Option<CompetencyCard>> {
    self.sync().await;
    self.nodes.card.subscribe()
  }
}

// ─── Driver ──────────────────────────────────────────────────────────────────

/// What a single recomputation pass must refetch.
#[derive(Debug, Clone, Copy)]
struct Pass {
  employee: bool,
  skills:   bool,
  clock:    bool,
}

impl Pass {
  const RESELECT: Self = Self { employee: true, skills: true, clock: true };

  fn from_signal(signal: Invalidation) -> Self {
    Self {
      employee: signal.employees,
      skills:   signal.skills,
      clock:    signal.clock,
    }
  }
}

struct Driver<S> {
  store:         Arc<S>,
  config:        LiveConfig,
  nodes:         Nodes,
  selection:     watch::Receiver<Option<EmployeeId>>,
  sync_requests: mpsc::UnboundedReceiver<oneshot::Sender<()>>,
  invalidations: InvalidationStream,
}

impl<S: CompetencyStore> Driver<S> {
  async fn run(mut self) {
    loop {
      let (pass, done) = tokio::select! {
        changed = self.selection.changed() => {
          if changed.is_err() {
            break;
          }
          (Pass::RESELECT, None)
        }
        signal = self.invalidations.recv() => match signal {
          Some(signal) => (Pass::from_signal(signal), None),
          None => break,
        },
        Some(done) = self.sync_requests.recv() => (Pass::RESELECT, Some(done)),
      };

      let selected = self.selection.borrow_and_update().clone();
      if let Err(err) = self.recompute(selected.as_ref(), pass).await {
        warn!(%err, "view graph refresh failed, keeping last values");
      }
      if let Some(done) = done {
        let _ = done.send(());
      }
    }
    debug!("view graph driver stopped");
  }

  async fn recompute(&self, selected: Option<&EmployeeId>, pass: Pass) -> Result<()> {
    let nodes = &self.nodes;
    let cx = self.config.query_context(Utc::now());

    let Some(id) = selected else {
      nodes.employee.publish(None);
      let skills_changed = nodes.skills.publish(Vec::new());
      if skills_changed {
        self.derive(&[]);
      }
      nodes.stale_skills.publish(Vec::new());
      nodes.card.publish(None);
      return Ok(());
    };

    // Fetch both inputs before publishing anything so a failed read leaves
    // the whole graph at its previous state.
    let employee = if pass.employee {
      Some(
        self
          .store
          .get_employee(id.clone())
          .await
          .map_err(Error::from_store)?,
      )
    } else {
      None
    };
    let skills = if pass.skills {
      let mut skills =
        self.store.skills_of(id.clone()).await.map_err(Error::from_store)?;
      sort_skills(&mut skills);
      Some(skills)
    } else {
      None
    };

    let employee_changed =
      employee.is_some_and(|employee| nodes.employee.publish(employee));
    let skills_changed =
      skills.is_some_and(|skills| nodes.skills.publish(skills));

    let skills = nodes.skills.current();
    let derived_changed = skills_changed && self.derive(&skills);
    let stale_changed = (skills_changed || pass.clock)
      && nodes.stale_skills.publish(aggregate::stale_skills(
        &skills,
        cx.skill_window,
        cx.now,
      ));

    if employee_changed || derived_changed || stale_changed || pass.clock {
      let card = nodes.employee.current().map(|employee| {
        CompetencyCard::build(
          &employee,
          &nodes.progress.current(),
          &nodes.rollup.current(),
          &nodes.development_areas.current(),
          &nodes.stale_skills.current(),
          &cx,
        )
      });
      nodes.card.publish(card);
    }

    debug!(
      employee_id = %id,
      employee_changed,
      skills_changed,
      derived_changed,
      "view graph recomputed"
    );
    Ok(())
  }

  /// Recompute the skill-derived nodes. Returns whether any of them changed.
  fn derive(&self, skills: &[Skill]) -> bool {
    let nodes = &self.nodes;
    let score = nodes.score.publish(aggregate::overall_score(skills));
    let rollup = nodes.rollup.publish(aggregate::category_rollup(skills));
    let areas = nodes
      .development_areas
      .publish(aggregate::development_areas(skills));
    let progress = nodes.progress.publish(aggregate::skill_progress(skills));
    score || rollup || areas || progress
  }
}
