//! End-to-end tests of the live layer over an in-memory SQLite store.

use std::time::Duration;

use kartu_core::{
  ErrorKind,
  employee::Employee,
  id::EmployeeId,
  query::{QueryDescriptor, QueryResult},
  skill::{Category, NewSkill, Skill},
  store::CompetencyStore as _,
};
use kartu_store_sqlite::SqliteStore;
use tokio::time::timeout;

use crate::{Error, LiveConfig, LiveStore, Subscription};

async fn live() -> LiveStore<SqliteStore> {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  LiveStore::new(store, LiveConfig::default())
}

fn budi() -> EmployeeId { EmployeeId::parse("199901010001").unwrap() }

/// Wait for the first published value satisfying `pred`.
async fn until<T: Clone>(
  sub: &mut Subscription<T>,
  pred: impl Fn(&T) -> bool,
) -> T {
  timeout(Duration::from_secs(2), async {
    loop {
      let value = sub.next().await.expect("publisher alive");
      if pred(&value) {
        return value;
      }
    }
  })
  .await
  .expect("condition reached in time")
}

/// Whether nothing further is published within a short grace period.
async fn stays_quiet<T: Clone>(sub: &mut Subscription<T>) -> bool {
  timeout(Duration::from_millis(150), sub.next()).await.is_err()
}

fn skill_names(result: &QueryResult) -> Vec<String> {
  result
    .skills()
    .expect("skill result")
    .iter()
    .map(|s| s.name.clone())
    .collect()
}

async fn seed_scenario(live: &LiveStore<SqliteStore>) -> Vec<Skill> {
  let gateway = live.gateway();
  gateway
    .insert_employee(Employee::new(budi(), "Budi Santoso"))
    .unwrap()
    .await
    .unwrap();

  let mut skills = Vec::new();
  for (name, score, category) in [
    ("Java", 80, Category::Basic),
    ("Android", 75, Category::Technical),
    ("Kotlin", 60, Category::Emerging),
  ] {
    let write = gateway
      .insert_skill(NewSkill::new(budi(), name, score, category))
      .unwrap()
      .await
      .unwrap();
    skills.push(write.skill);
  }
  skills
}

// ─── Query layer ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn subscriber_sees_pre_insert_set_then_new_skill() {
  let live = live().await;
  live
    .gateway()
    .insert_employee(Employee::new(budi(), "Budi"))
    .unwrap()
    .await
    .unwrap();

  let mut sub = live
    .queries()
    .subscribe(QueryDescriptor::Skills(budi()))
    .await
    .unwrap();
  let before = sub.next().await.unwrap();
  assert!(skill_names(&before).is_empty());

  live
    .gateway()
    .insert_skill(NewSkill::new(budi(), "Java", 80, Category::Basic))
    .unwrap()
    .await
    .unwrap();

  // Read-after-write: the completed insert is visible to a fresh read.
  let fresh = live.queries().get(&QueryDescriptor::Skills(budi())).await.unwrap();
  assert_eq!(skill_names(&fresh), ["Java"]);

  let after = until(&mut sub, |r| !skill_names(r).is_empty()).await;
  assert_eq!(skill_names(&after), ["Java"]);
}

#[tokio::test]
async fn scenario_scores_and_views_follow_deletes() {
  let live = live().await;
  let skills = seed_scenario(&live).await;
  let kotlin = skills.iter().find(|s| s.name == "Kotlin").unwrap();

  let mut score = live
    .queries()
    .subscribe(QueryDescriptor::OverallScore(budi()))
    .await
    .unwrap();
  assert_eq!(score.next().await.unwrap().score(), Some(72));

  let mut listed = live
    .queries()
    .subscribe(QueryDescriptor::Skills(budi()))
    .await
    .unwrap();
  assert_eq!(skill_names(&listed.next().await.unwrap()), [
    "Java", "Android", "Kotlin"
  ]);

  let graph = live.view_graph();
  let mut card = graph.card().await;
  assert!(graph.select(budi()));
  until(&mut card, |c| c.as_ref().is_some_and(|c| c.overall_score == 72)).await;

  live
    .gateway()
    .delete_skill(kotlin.skill_id)
    .unwrap()
    .await
    .unwrap();

  until(&mut score, |r| r.score() == Some(78)).await;
  let listed = until(&mut listed, |r| skill_names(r).len() == 2).await;
  assert_eq!(skill_names(&listed), ["Java", "Android"]);

  let mut graph_skills = graph.skills().await;
  let graph_skills =
    until(&mut graph_skills, |s| s.iter().all(|s| s.name != "Kotlin")).await;
  assert_eq!(graph_skills.len(), 2);
  let card = until(&mut card, |c| c.as_ref().is_some_and(|c| c.overall_score == 78))
    .await
    .unwrap();
  assert_eq!(card.skill_count, 2);

  let employee = live.queries().get(&QueryDescriptor::Employee(budi())).await.unwrap();
  let QueryResult::Employee(Some(employee)) = employee else {
    panic!("employee missing");
  };
  assert_eq!(employee.overall_score, 78);
}

#[tokio::test]
async fn joining_an_open_query_starts_from_the_latest_write() {
  let live = live().await;
  live
    .gateway()
    .insert_employee(Employee::new(budi(), "Budi"))
    .unwrap()
    .await
    .unwrap();

  let mut first = live
    .queries()
    .subscribe(QueryDescriptor::Skills(budi()))
    .await
    .unwrap();
  assert!(skill_names(&first.next().await.unwrap()).is_empty());

  live
    .gateway()
    .insert_skill(NewSkill::new(budi(), "Java", 80, Category::Basic))
    .unwrap()
    .await
    .unwrap();

  // No yield between the acknowledged insert and the join, so the shared
  // refresher has not necessarily run yet.
  let mut second = live
    .queries()
    .subscribe(QueryDescriptor::Skills(budi()))
    .await
    .unwrap();
  assert_eq!(skill_names(&second.next().await.unwrap()), ["Java"]);
  assert_eq!(live.queries().open_queries(), 1);

  // The earlier subscriber sees the same value exactly once.
  let caught_up = until(&mut first, |r| !skill_names(r).is_empty()).await;
  assert_eq!(skill_names(&caught_up), ["Java"]);
  assert!(stays_quiet(&mut first).await);
}

#[tokio::test]
async fn subscribers_to_one_descriptor_share_a_refresher() {
  let live = live().await;
  let a = live
    .queries()
    .subscribe(QueryDescriptor::AllEmployees)
    .await
    .unwrap();
  let b = live
    .queries()
    .subscribe(QueryDescriptor::AllEmployees)
    .await
    .unwrap();
  assert_eq!(live.queries().open_queries(), 1);

  drop(a);
  drop(b);
  timeout(Duration::from_secs(2), async {
    while live.queries().open_queries() > 0 {
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
  })
  .await
  .expect("refresher released");
}

#[tokio::test]
async fn employee_list_stays_sorted_by_name() {
  let live = live().await;
  let mut sub = live
    .queries()
    .subscribe(QueryDescriptor::AllEmployees)
    .await
    .unwrap();
  assert_eq!(sub.next().await.unwrap(), QueryResult::Employees(Vec::new()));

  for (id, name) in [("3", "citra"), ("1", "Budi"), ("2", "ani")] {
    live
      .gateway()
      .insert_employee(Employee::new(EmployeeId::parse(id).unwrap(), name))
      .unwrap()
      .await
      .unwrap();
  }

  let all = until(&mut sub, |r| r.employees().is_some_and(|e| e.len() == 3)).await;
  let names: Vec<&str> =
    all.employees().unwrap().iter().map(|e| e.name.as_str()).collect();
  assert_eq!(names, ["ani", "Budi", "citra"]);
}

// ─── Mutation gateway ────────────────────────────────────────────────────────

#[tokio::test]
async fn validation_fails_before_anything_is_queued() {
  let live = live().await;
  let err = live
    .gateway()
    .insert_skill(NewSkill::new(budi(), "   ", 50, Category::Basic))
    .err()
    .expect("rejected synchronously");
  assert_eq!(err.kind(), Some(ErrorKind::Validation));
}

#[tokio::test]
async fn strict_ids_reject_short_keys() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let live = LiveStore::new(store, LiveConfig {
    strict_employee_ids: true,
    ..LiveConfig::default()
  });
  let err = live
    .gateway()
    .insert_employee(Employee::new(budi(), "Budi"))
    .err()
    .expect("rejected synchronously");
  assert_eq!(err.kind(), Some(ErrorKind::Validation));
}

#[tokio::test]
async fn missing_and_duplicate_keys_are_reported() {
  let live = live().await;
  let gateway = live.gateway();

  let err = gateway
    .update_employee(Employee::new(budi(), "Nobody"))
    .unwrap()
    .await
    .unwrap_err();
  assert_eq!(err.kind(), Some(ErrorKind::NotFound));

  gateway
    .insert_employee(Employee::new(budi(), "Budi"))
    .unwrap()
    .await
    .unwrap();
  let err = gateway
    .insert_employee(Employee::new(budi(), "Budi again"))
    .unwrap()
    .await
    .unwrap_err();
  assert_eq!(err.kind(), Some(ErrorKind::ConstraintViolation));

  let err = gateway
    .insert_skill(NewSkill::new(
      EmployeeId::parse("404").unwrap(),
      "Java",
      50,
      Category::Basic,
    ))
    .unwrap()
    .await
    .unwrap_err();
  assert_eq!(err.kind(), Some(ErrorKind::Validation));
}

#[tokio::test]
async fn queued_mutation_can_be_cancelled() {
  let live = live().await;
  let gateway = live.gateway();

  // The worker cannot run until this test yields, so both jobs are queued.
  let first = gateway.insert_employee(Employee::new(budi(), "Budi")).unwrap();
  let second = gateway
    .insert_employee(Employee::new(EmployeeId::parse("2").unwrap(), "Ani"))
    .unwrap();
  assert!(second.cancel());
  assert!(!second.cancel());

  first.await.unwrap();
  assert!(matches!(second.await, Err(Error::Cancelled)));
  let ani = live
    .queries()
    .get(&QueryDescriptor::Employee(EmployeeId::parse("2").unwrap()))
    .await
    .unwrap();
  assert_eq!(ani, QueryResult::Employee(None));
}

#[tokio::test]
async fn identical_skill_update_recomputes_once() {
  let live = live().await;
  let skills = seed_scenario(&live).await;
  let mut java = skills.into_iter().find(|s| s.name == "Java").unwrap();
  java.score = 90;

  let mut score = live
    .queries()
    .subscribe(QueryDescriptor::OverallScore(budi()))
    .await
    .unwrap();
  assert_eq!(score.next().await.unwrap().score(), Some(72));

  let first = live.gateway().update_skill(java.clone()).unwrap().await.unwrap();
  assert!(first.changed);
  until(&mut score, |r| r.score() == Some(75)).await;

  let second = live.gateway().update_skill(java.clone()).unwrap().await.unwrap();
  assert!(!second.changed);
  assert_eq!(second.rescore.current, 75);
  assert!(stays_quiet(&mut score).await);

  let stored = live.store().get_skill(java.skill_id).await.unwrap();
  assert_eq!(stored, Some(java));
}

#[tokio::test]
async fn employee_update_keeps_derived_score() {
  let live = live().await;
  seed_scenario(&live).await;

  let mut renamed = Employee::new(budi(), "Budi S.");
  renamed.overall_score = 0;
  let stored = live
    .gateway()
    .update_employee(renamed)
    .unwrap()
    .await
    .unwrap();
  assert_eq!(stored.name, "Budi S.");
  assert_eq!(stored.overall_score, 72);
}

#[tokio::test]
async fn employee_update_keeps_assessment_time() {
  let live = live().await;
  seed_scenario(&live).await;
  let assessed = live
    .store()
    .get_employee(budi())
    .await
    .unwrap()
    .unwrap()
    .last_assessment;
  assert!(assessed.is_some());

  // A copy that predates any skill write carries no assessment time.
  let mut renamed = Employee::new(budi(), "Budi S.");
  renamed.last_assessment = None;
  let stored = live
    .gateway()
    .update_employee(renamed)
    .unwrap()
    .await
    .unwrap();
  assert_eq!(stored.name, "Budi S.");
  assert_eq!(stored.last_assessment, assessed);

  let reread = live.store().get_employee(budi()).await.unwrap().unwrap();
  assert_eq!(reread.last_assessment, assessed);
}

// ─── View graph ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn new_graph_subscriber_sees_an_acknowledged_delete() {
  let live = live().await;
  let skills = seed_scenario(&live).await;
  let kotlin = skills.iter().find(|s| s.name == "Kotlin").unwrap();

  let graph = live.view_graph();
  graph.select(budi());
  let mut score = graph.score().await;
  assert_eq!(score.next().await, Some(72));

  live
    .gateway()
    .delete_skill(kotlin.skill_id)
    .unwrap()
    .await
    .unwrap();

  let mut late = graph.score().await;
  assert_eq!(late.next().await, Some(78));
  let mut card = graph.card().await;
  let card = card.next().await.unwrap().unwrap();
  assert_eq!(card.overall_score, 78);
  assert_eq!(card.skill_count, 2);
}

#[tokio::test]
async fn reselecting_the_same_employee_is_a_no_op() {
  let live = live().await;
  seed_scenario(&live).await;
  let graph = live.view_graph();

  let mut score = graph.score().await;
  assert_eq!(score.next().await, Some(0));
  assert!(graph.select(budi()));
  until(&mut score, |s| *s == 72).await;

  assert!(!graph.select(budi()));
  assert!(stays_quiet(&mut score).await);

  assert!(graph.clear());
  until(&mut score, |s| *s == 0).await;
  assert_eq!(graph.selected(), None);
}

#[tokio::test]
async fn employee_only_change_leaves_skill_nodes_alone() {
  let live = live().await;
  seed_scenario(&live).await;
  let graph = live.view_graph();
  graph.select(budi());

  let mut card = graph.card().await;
  until(&mut card, |c| c.as_ref().is_some_and(|c| c.skill_count == 3)).await;
  let mut areas = graph.development_areas().await;
  let current = areas.next().await.unwrap();
  assert_eq!(current.len(), 3);

  let mut renamed = Employee::new(budi(), "Budi S.");
  renamed.unit = Some("IT".into());
  live.gateway().update_employee(renamed).unwrap().await.unwrap();

  let card = until(&mut card, |c| c.as_ref().is_some_and(|c| c.name == "Budi S."))
    .await
    .unwrap();
  assert_eq!(card.initials, "BS");
  assert_eq!(card.focus.as_deref(), Some("Kotlin"));
  assert!(stays_quiet(&mut areas).await);
}

#[tokio::test]
async fn dropping_the_graph_ends_its_streams() {
  let live = live().await;
  let graph = live.view_graph();
  let mut score = graph.score().await;
  assert_eq!(score.next().await, Some(0));

  drop(graph);
  let ended = timeout(Duration::from_secs(2), score.next())
    .await
    .expect("stream closes");
  assert_eq!(ended, None);
}

// ─── Config ──────────────────────────────────────────────────────────────────

#[test]
fn zero_refresh_interval_disables_ticker() {
  let config = LiveConfig { refresh_interval_secs: Some(0), ..LiveConfig::default() };
  assert!(config.refresh_interval().is_none());
  let config = LiveConfig { refresh_interval_secs: Some(30), ..LiveConfig::default() };
  assert_eq!(config.refresh_interval(), Some(Duration::from_secs(30)));
}
