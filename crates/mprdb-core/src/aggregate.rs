//! The derived, per-subject aggregate score table.
//!
//! Aggregate rows are never authoritative: they are recomputed wholesale from
//! every visible assertion by the aggregation engine and replaced in one step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Accumulated trust-weighted score per subject, ordered by subject id.
pub type ScoreTable = BTreeMap<Uuid, f64>;

/// One row of the aggregate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateScore {
  pub subject_id: Uuid,
  pub score:      f64,
}

/// Parameters for [`crate::store::AggregateStore::list_scores`].
#[derive(Debug, Clone, Default)]
pub struct ScoreQuery {
  /// Only return subjects whose score is less than or equal to this value.
  pub at_most: Option<f64>,
}

impl ScoreQuery {
  pub fn matches(&self, score: f64) -> bool {
    self.at_most.is_none_or(|limit| score <= limit)
  }
}
