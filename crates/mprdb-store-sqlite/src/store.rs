//! [`SqliteStore`], the SQLite implementation of the mprdb storage traits.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use mprdb_core::{
  aggregate::{AggregateScore, ScoreQuery, ScoreTable},
  assertion::Assertion,
  source::{NewSource, TrustedSource},
  store::{AggregateStore, LocalLedger, TrustRegistry},
};

use crate::{
  encode::{RawAssertion, RawScore, RawSource, encode_dt, encode_uuid},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An mprdb node store backed by a single SQLite file.
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

  /// Open an in-memory store, for tests.
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
}

// ─── TrustRegistry impl ──────────────────────────────────────────────────────

impl TrustRegistry for SqliteStore {
  type Error = Error;

  async fn add_source(&self, input: NewSource) -> Result<TrustedSource> {
    let source = TrustedSource {
      source_id:     input.source_id,
      display_name:  input.display_name,
      public_key:    input.public_key,
      trust_level:   input.trust_level,
      registered_at: Utc::now(),
    };

    let id_str = encode_uuid(source.source_id);
    let name   = source.display_name.clone();
    let key    = source.public_key.clone();
    let level  = i64::from(source.trust_level);
    let at_str = encode_dt(source.registered_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM sources WHERE source_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if exists {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO sources (source_id, display_name, public_key, trust_level, registered_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, key, level, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateSource(source.source_id));
    }
    Ok(source)
  }

  async fn list_sources(&self) -> Result<Vec<TrustedSource>> {
    let raws: Vec<RawSource> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT source_id, display_name, public_key, trust_level, registered_at
           FROM sources ORDER BY seq",
        )?;
        let rows = stmt
          .query_map([], RawSource::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSource::into_source).collect()
  }
}

// ─── LocalLedger impl ────────────────────────────────────────────────────────

impl LocalLedger for SqliteStore {
  type Error = Error;

  async fn record_assertion(&self, assertion: Assertion) -> Result<()> {
    assertion.validate()?;

    let op_str      = encode_uuid(assertion.operation_id);
    let subject_str = encode_uuid(assertion.subject_id);
    let score       = assertion.score;
    let reason      = assertion.justification;
    let at_str      = encode_dt(assertion.issued_at);

    let inserted: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO submissions
             (operation_id, subject_id, score, justification, issued_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![op_str, subject_str, score, reason, at_str],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Err(Error::DuplicateAssertion(assertion.operation_id));
    }
    Ok(())
  }

  async fn remove_assertion(&self, operation_id: Uuid) -> Result<()> {
    let op_str = encode_uuid(operation_id);

    let removed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM submissions WHERE operation_id = ?1",
          rusqlite::params![op_str],
        )?)
      })
      .await?;

    if removed == 0 {
      return Err(Error::AssertionNotFound(operation_id));
    }
    Ok(())
  }

  async fn read_all(&self) -> Result<Vec<Assertion>> {
    let raws: Vec<RawAssertion> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT operation_id, subject_id, score, justification, issued_at
           FROM submissions ORDER BY issued_at, rowid",
        )?;
        let rows = stmt
          .query_map([], RawAssertion::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAssertion::into_assertion).collect()
  }
}

// ─── AggregateStore impl ─────────────────────────────────────────────────────

impl AggregateStore for SqliteStore {
  type Error = Error;

  async fn clear_aggregate(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute("DELETE FROM reputation", [])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn replace_aggregate(&self, scores: ScoreTable) -> Result<()> {
    let rows: Vec<(String, f64)> = scores
      .into_iter()
      .map(|(subject_id, score)| (encode_uuid(subject_id), score))
      .collect();
    let count = rows.len();

    // One transaction, so readers never observe a half-written table.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM reputation", [])?;
        {
          let mut stmt =
            tx.prepare("INSERT INTO reputation (subject_id, score) VALUES (?1, ?2)")?;
          for (subject_id, score) in &rows {
            stmt.execute(rusqlite::params![subject_id, score])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(rows = count, "aggregate table replaced");
    Ok(())
  }

  async fn list_scores(&self, query: &ScoreQuery) -> Result<Vec<AggregateScore>> {
    let at_most = query.at_most;

    let raws: Vec<RawScore> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT subject_id, score FROM reputation
           WHERE ?1 IS NULL OR score <= ?1
           ORDER BY score ASC, subject_id ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![at_most], |row| {
            Ok(RawScore { subject_id: row.get(0)?, score: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawScore::into_score).collect()
  }
}
