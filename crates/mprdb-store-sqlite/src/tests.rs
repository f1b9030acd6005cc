//! Integration tests for `SqliteStore` against an in-memory database.

use mprdb_core::{
  aggregate::{ScoreQuery, ScoreTable},
  assertion::Assertion,
  source::{NewSource, TrustLevel},
  store::{AggregateStore, LocalLedger, TrustRegistry},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_source(name: &str, level: i64) -> NewSource {
  NewSource {
    source_id:    Uuid::new_v4(),
    display_name: name.into(),
    public_key:   format!("-----BEGIN PGP PUBLIC KEY BLOCK-----\n\n{name}\n-----END PGP PUBLIC KEY BLOCK-----\n"),
    trust_level:  TrustLevel::new(level).unwrap(),
  }
}

// ─── Trust registry ──────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_list_source() {
  let s = store().await;
  let input = new_source("lobby", 3);
  let id = input.source_id;

  let added = s.add_source(input).await.unwrap();
  assert_eq!(added.source_id, id);
  assert_eq!(added.trust_level.get(), 3);

  let all = s.list_sources().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].source_id, id);
  assert_eq!(all[0].display_name, "lobby");
  assert_eq!(all[0].public_key, added.public_key);
  assert_eq!(all[0].registered_at, added.registered_at);
}

#[tokio::test]
async fn duplicate_source_is_rejected() {
  let s = store().await;
  let input = new_source("lobby", 3);
  let again = NewSource { display_name: "lobby again".into(), ..input.clone() };

  s.add_source(input).await.unwrap();
  let r = s.add_source(again).await;
  assert!(matches!(r, Err(Error::DuplicateSource(_))));
  assert_eq!(s.list_sources().await.unwrap().len(), 1);
}

#[tokio::test]
async fn sources_listed_in_registration_order() {
  let s = store().await;
  let mut ids = Vec::new();
  for (name, level) in [("c", 1), ("a", 5), ("b", 2)] {
    ids.push(s.add_source(new_source(name, level)).await.unwrap().source_id);
  }

  let listed: Vec<Uuid> =
    s.list_sources().await.unwrap().into_iter().map(|s| s.source_id).collect();
  assert_eq!(listed, ids);
}

#[tokio::test]
async fn empty_registry_lists_nothing() {
  let s = store().await;
  assert!(s.list_sources().await.unwrap().is_empty());
}

// ─── Local ledger ────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_and_read_back() {
  let s = store().await;
  let a = Assertion::author(Uuid::new_v4(), -1.5, "x-ray mining").unwrap();

  s.record_assertion(a.clone()).await.unwrap();

  let all = s.read_all().await.unwrap();
  assert_eq!(all, vec![a]);
}

#[tokio::test]
async fn duplicate_operation_id_is_rejected() {
  let s = store().await;
  let a = Assertion::author(Uuid::new_v4(), 1.0, "helpful").unwrap();

  s.record_assertion(a.clone()).await.unwrap();
  let r = s.record_assertion(a).await;
  assert!(matches!(r, Err(Error::DuplicateAssertion(_))));
}

#[tokio::test]
async fn invalid_assertion_is_not_recorded() {
  let s = store().await;
  let mut a = Assertion::author(Uuid::new_v4(), 1.0, "helpful").unwrap();
  a.justification = "two\nlines".into();

  let r = s.record_assertion(a).await;
  assert!(matches!(r, Err(Error::Core(mprdb_core::Error::InvalidJustification))));
  assert!(s.read_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn remove_assertion_deletes_only_that_row() {
  let s = store().await;
  let keep = Assertion::author(Uuid::new_v4(), 1.0, "kept").unwrap();
  let gone = Assertion::author(Uuid::new_v4(), -3.0, "retracted").unwrap();
  s.record_assertion(keep.clone()).await.unwrap();
  s.record_assertion(gone.clone()).await.unwrap();

  s.remove_assertion(gone.operation_id).await.unwrap();

  assert_eq!(s.read_all().await.unwrap(), vec![keep]);
}

#[tokio::test]
async fn remove_unknown_assertion_fails() {
  let s = store().await;
  let id = Uuid::new_v4();
  let r = s.remove_assertion(id).await;
  assert!(matches!(r, Err(Error::AssertionNotFound(x)) if x == id));
}

// ─── Aggregate table ─────────────────────────────────────────────────────────

fn table(rows: &[(Uuid, f64)]) -> ScoreTable { rows.iter().copied().collect() }

#[tokio::test]
async fn replace_aggregate_discards_previous_rows() {
  let s = store().await;
  let (p, q, r) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

  s.replace_aggregate(table(&[(p, 1.0), (q, 2.0)])).await.unwrap();
  s.replace_aggregate(table(&[(r, -0.5)])).await.unwrap();

  let rows = s.list_scores(&ScoreQuery::default()).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].subject_id, r);
  assert_eq!(rows[0].score, -0.5);
}

#[tokio::test]
async fn clear_aggregate_empties_the_table() {
  let s = store().await;
  s.replace_aggregate(table(&[(Uuid::new_v4(), 4.0)])).await.unwrap();

  s.clear_aggregate().await.unwrap();

  assert!(s.list_scores(&ScoreQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn clearing_does_not_touch_the_ledger() {
  let s = store().await;
  let a = Assertion::author(Uuid::new_v4(), 1.0, "helpful").unwrap();
  s.record_assertion(a.clone()).await.unwrap();

  s.clear_aggregate().await.unwrap();

  assert_eq!(s.read_all().await.unwrap(), vec![a]);
}

#[tokio::test]
async fn list_scores_orders_by_score_then_subject() {
  let s = store().await;
  let mut tied = [Uuid::new_v4(), Uuid::new_v4()];
  tied.sort();
  let low = Uuid::new_v4();
  let high = Uuid::new_v4();

  s.replace_aggregate(table(&[
    (high, 3.0),
    (tied[1], 0.5),
    (low, -2.0),
    (tied[0], 0.5),
  ]))
  .await
  .unwrap();

  let order: Vec<Uuid> = s
    .list_scores(&ScoreQuery::default())
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.subject_id)
    .collect();
  assert_eq!(order, vec![low, tied[0], tied[1], high]);
}

#[tokio::test]
async fn list_scores_at_most_is_inclusive() {
  let s = store().await;
  let (bad, edge, good) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
  s.replace_aggregate(table(&[(bad, -4.0), (edge, -1.0), (good, 2.0)]))
    .await
    .unwrap();

  let rows = s
    .list_scores(&ScoreQuery { at_most: Some(-1.0) })
    .await
    .unwrap();
  let ids: Vec<Uuid> = rows.iter().map(|r| r.subject_id).collect();
  assert_eq!(ids, vec![bad, edge]);
  assert!(rows.iter().all(|r| ScoreQuery { at_most: Some(-1.0) }.matches(r.score)));
}

#[tokio::test]
async fn reopening_a_file_keeps_state() {
  let path = std::env::temp_dir().join(format!("mprdb-store-{}.db", Uuid::new_v4()));
  let source = new_source("lobby", 4);
  let id = source.source_id;

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.add_source(source).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  let all = s.list_sources().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].source_id, id);

  drop(s);
  std::fs::remove_file(&path).ok();
}
