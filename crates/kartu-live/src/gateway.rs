//! The mutation gateway: every write goes through one serial worker.
//!
//! Callers validate synchronously and get back a [`MutationHandle`]. The
//! worker takes jobs off an `mpsc` queue in submission order, applies each to
//! the store, publishes the resulting [`Invalidation`] once the store call
//! has returned, and only then answers the handle.

use std::{
  future::{Future, IntoFuture},
  pin::Pin,
  sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
  },
};

use kartu_core::{
  employee::Employee,
  id::{EmployeeId, SkillId},
  skill::{NewSkill, Skill},
  store::{CompetencyStore, ScoreChange, SkillWrite},
  validate::{self, IdPolicy},
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::{
  Error, Result,
  invalidation::{Invalidation, Invalidator},
};

const QUEUED: u8 = 0;
const STARTED: u8 = 1;
const CANCELLED: u8 = 2;

type Reply<T> = oneshot::Sender<Result<T>>;

enum Op {
  InsertEmployee(Employee, Reply<Employee>),
  UpdateEmployee(Employee, Reply<Employee>),
  DeleteEmployee(EmployeeId, Reply<usize>),
  CorrectScore(EmployeeId, i32, Reply<ScoreChange>),
  InsertSkill(NewSkill, Reply<SkillWrite>),
  UpdateSkill(Skill, Reply<SkillWrite>),
  DeleteSkill(SkillId, Reply<SkillWrite>),
}

struct Job {
  state: Arc<AtomicU8>,
  op:    Op,
}

// ─── Handle ──────────────────────────────────────────────────────────────────

/// A pending mutation. Await it for the outcome.
///
/// Dropping the handle does not cancel the mutation.
pub struct MutationHandle<T> {
  state: Arc<AtomicU8>,
  rx:    oneshot::Receiver<Result<T>>,
}

impl<T> MutationHandle<T> {
  /// Withdraw the mutation if the worker has not picked it up yet. Returns
  /// `false` once it has started; a started mutation always completes.
  pub fn cancel(&self) -> bool {
    self
      .state
      .compare_exchange(QUEUED, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }

  pub fn is_started(&self) -> bool {
    self.state.load(Ordering::Acquire) == STARTED
  }
}

impl<T: Send + 'static> IntoFuture for MutationHandle<T> {
  type IntoFuture = Pin<Box<dyn Future<Output = Result<T>> + Send>>;
  type Output = Result<T>;

  fn into_future(self) -> Self::IntoFuture {
    Box::pin(async move {
      match self.rx.await {
        Ok(result) => result,
        Err(_) if self.state.load(Ordering::Acquire) == CANCELLED => {
          Err(Error::Cancelled)
        }
        Err(_) => Err(Error::Closed),
      }
    })
  }
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

/// Cloneable front of the serial write worker. The worker stops once every
/// clone is dropped and its queue has drained.
#[derive(Clone)]
pub struct MutationGateway {
  tx:     mpsc::UnboundedSender<Job>,
  policy: IdPolicy,
}

impl MutationGateway {
  /// Start the worker on the current tokio runtime.
  pub fn spawn<S>(
    store: Arc<S>,
    invalidator: Invalidator,
    policy: IdPolicy,
  ) -> Self
  where
    S: CompetencyStore + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run(store, invalidator, rx));
    Self { tx, policy }
  }

  fn submit<T>(&self, op: impl FnOnce(Reply<T>) -> Op) -> Result<MutationHandle<T>> {
    let (reply, rx) = oneshot::channel();
    let state = Arc::new(AtomicU8::new(QUEUED));
    self
      .tx
      .send(Job { state: state.clone(), op: op(reply) })
      .map_err(|_| Error::Closed)?;
    Ok(MutationHandle { state, rx })
  }

  // ── Employees ─────────────────────────────────────────────────────────

  /// Insert a new employee. Fails with a constraint violation if the key is
  /// taken. The supplied overall score is ignored.
  pub fn insert_employee(
    &self,
    employee: Employee,
  ) -> Result<MutationHandle<Employee>> {
    let employee = validate::employee(employee, self.policy)?;
    self.submit(|reply| Op::InsertEmployee(employee, reply))
  }

  /// Replace an existing employee's attributes, keeping its stored score
  /// and assessment time. Both are owned by skill writes.
  pub fn update_employee(
    &self,
    employee: Employee,
  ) -> Result<MutationHandle<Employee>> {
    let employee = validate::employee(employee, IdPolicy::Lenient)?;
    self.submit(|reply| Op::UpdateEmployee(employee, reply))
  }

  /// Delete an employee and its skills; resolves to the skill count removed.
  pub fn delete_employee(&self, id: EmployeeId) -> Result<MutationHandle<usize>> {
    self.submit(|reply| Op::DeleteEmployee(id, reply))
  }

  /// Overwrite the stored overall score, clamped into `0..=target`.
  pub fn correct_overall_score(
    &self,
    id: EmployeeId,
    score: i32,
  ) -> Result<MutationHandle<ScoreChange>> {
    self.submit(|reply| Op::CorrectScore(id, score, reply))
  }

  // ── Skills ────────────────────────────────────────────────────────────

  /// Insert a skill; the resolved write carries the assigned id.
  pub fn insert_skill(
    &self,
    input: NewSkill,
  ) -> Result<MutationHandle<SkillWrite>> {
    let input = validate::new_skill(input)?;
    self.submit(|reply| Op::InsertSkill(input, reply))
  }

  pub fn update_skill(&self, skill: Skill) -> Result<MutationHandle<SkillWrite>> {
    let skill = validate::skill(skill)?;
    self.submit(|reply| Op::UpdateSkill(skill, reply))
  }

  pub fn delete_skill(&self, id: SkillId) -> Result<MutationHandle<SkillWrite>> {
    self.submit(|reply| Op::DeleteSkill(id, reply))
  }
}

// ─── Worker ──────────────────────────────────────────────────────────────────

async fn run<S: CompetencyStore>(
  store: Arc<S>,
  invalidator: Invalidator,
  mut rx: mpsc::UnboundedReceiver<Job>,
) {
  info!("mutation gateway started");
  while let Some(job) = rx.recv().await {
    let started = job.state.compare_exchange(
      QUEUED,
      STARTED,
      Ordering::AcqRel,
      Ordering::Acquire,
    );
    if started.is_err() {
      debug!("skipping cancelled mutation");
      continue;
    }
    apply(&*store, &invalidator, job.op).await;
  }
  info!("mutation gateway stopped");
}

/// Publish on success, then answer the caller. A caller that stopped
/// listening is not an error.
fn settle<T>(
  invalidator: &Invalidator,
  reply: Reply<T>,
  outcome: Result<(T, Invalidation)>,
) {
  let outcome = outcome.map(|(value, signal)| {
    invalidator.publish(signal);
    value
  });
  let _ = reply.send(outcome);
}

async fn apply<S: CompetencyStore>(
  store: &S,
  invalidator: &Invalidator,
  op: Op,
) {
  match op {
    Op::InsertEmployee(employee, reply) => {
      settle(invalidator, reply, insert_employee(store, employee).await)
    }
    Op::UpdateEmployee(employee, reply) => {
      settle(invalidator, reply, update_employee(store, employee).await)
    }
    Op::DeleteEmployee(id, reply) => {
      let outcome = store
        .delete_employee(id.clone())
        .await
        .map_err(Error::from_store)
        .map(|removed| {
          debug!(%id, removed, "employee deleted");
          (removed, Invalidation::SKILLS)
        });
      settle(invalidator, reply, outcome)
    }
    Op::CorrectScore(id, score, reply) => {
      let outcome = store
        .set_overall_score(id, score)
        .await
        .map_err(Error::from_store)
        .map(|change| {
          let signal = if change.changed() {
            Invalidation::EMPLOYEES
          } else {
            Invalidation::NONE
          };
          (change, signal)
        });
      settle(invalidator, reply, outcome)
    }
    Op::InsertSkill(input, reply) => {
      let outcome = store
        .insert_skill(input)
        .await
        .map_err(Error::from_store)
        .map(|write| (write, Invalidation::SKILLS));
      settle(invalidator, reply, outcome)
    }
    Op::UpdateSkill(skill, reply) => {
      let outcome = store
        .put_skill(skill)
        .await
        .map_err(Error::from_store)
        .map(|write| {
          let signal = if write.changed {
            Invalidation::SKILLS
          } else {
            Invalidation::NONE
          };
          (write, signal)
        });
      settle(invalidator, reply, outcome)
    }
    Op::DeleteSkill(id, reply) => {
      let outcome = store
        .delete_skill(id)
        .await
        .map_err(Error::from_store)
        .map(|write| (write, Invalidation::SKILLS));
      settle(invalidator, reply, outcome)
    }
  }
}

async fn insert_employee<S: CompetencyStore>(
  store: &S,
  employee: Employee,
) -> Result<(Employee, Invalidation)> {
  let id = employee.employee_id.clone();
  // The worker is the only writer, so nothing can slip in between.
  if store
    .get_employee(id.clone())
    .await
    .map_err(Error::from_store)?
    .is_some()
  {
    return Err(kartu_core::Error::DuplicateEmployee(id).into());
  }
  let stored = store.put_employee(employee).await.map_err(Error::from_store)?;
  debug!(%id, "employee inserted");
  Ok((stored, Invalidation::EMPLOYEES))
}

async fn update_employee<S: CompetencyStore>(
  store: &S,
  mut employee: Employee,
) -> Result<(Employee, Invalidation)> {
  let id = employee.employee_id.clone();
  let Some(stored) = store
    .get_employee(id.clone())
    .await
    .map_err(Error::from_store)?
  else {
    return Err(kartu_core::Error::EmployeeNotFound(id).into());
  };

  employee.overall_score = stored.overall_score;
  employee.last_assessment = stored.last_assessment;
  if employee == stored {
    debug!(%id, "employee unchanged");
    return Ok((stored, Invalidation::NONE));
  }
  let stored = store.put_employee(employee).await.map_err(Error::from_store)?;
  debug!(%id, "employee updated");
  Ok((stored, Invalidation::EMPLOYEES))
}
