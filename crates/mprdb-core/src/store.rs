//! Storage traits consumed by the aggregation engine and the CLI.
//!
//! Implemented by storage backends (e.g. `mprdb-store-sqlite`). Higher layers
//! (`mprdb-engine`, `mprdb-cli`) depend on these abstractions, not on any
//! concrete backend, so every collaborator can be replaced by a test double.
//!
//! All methods return `Send` futures so the traits can be used from tasks
//! spawned on a multi-threaded tokio runtime.

use std::future::Future;

use uuid::Uuid;

use crate::{
  aggregate::{AggregateScore, ScoreQuery, ScoreTable},
  assertion::Assertion,
  source::{NewSource, TrustedSource},
};

// ─── Trust registry ──────────────────────────────────────────────────────────

/// Durable mapping from remote source id to its key and trust level.
///
/// Sources are only ever added; there is no update or removal.
pub trait TrustRegistry: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Register a new trusted source.
  ///
  /// Returns an error if `source_id` is already registered.
  fn add_source(
    &self,
    input: NewSource,
  ) -> impl Future<Output = Result<TrustedSource, Self::Error>> + Send + '_;

  /// All registered sources in registration order. May be called any number
  /// of times.
  fn list_sources(
    &self,
  ) -> impl Future<Output = Result<Vec<TrustedSource>, Self::Error>> + Send + '_;
}

// ─── Local ledger ────────────────────────────────────────────────────────────

/// Assertions authored by this node.
pub trait LocalLedger: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist an assertion this node has just published.
  fn record_assertion(
    &self,
    assertion: Assertion,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove a previously recorded assertion after it has been retracted.
  ///
  /// Returns an error if no assertion has this operation id.
  fn remove_assertion(
    &self,
    operation_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Every assertion in the ledger, oldest first.
  fn read_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Assertion>, Self::Error>> + Send + '_;
}

// ─── Aggregate table ─────────────────────────────────────────────────────────

/// The persisted aggregate score table.
pub trait AggregateStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Delete every aggregate row.
  fn clear_aggregate(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace the whole table with `scores`.
  ///
  /// Must be atomic: a concurrent reader sees either the previous table or
  /// the new one, never a mixture.
  fn replace_aggregate(
    &self,
    scores: ScoreTable,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Rows matching `query`, ordered by ascending score then subject id.
  fn list_scores<'a>(
    &'a self,
    query: &'a ScoreQuery,
  ) -> impl Future<Output = Result<Vec<AggregateScore>, Self::Error>> + Send + 'a;
}
