//! What a successful rebuild produced.

use mprdb_core::{aggregate::ScoreTable, source::TrustLevel};
use uuid::Uuid;

use crate::FetchError;

/// Result of a completed rebuild.
#[derive(Debug)]
pub struct RebuildReport {
  /// The table that replaced the stored aggregate.
  pub scores:           ScoreTable,
  pub local_assertions: usize,
  /// One entry per registered source, in registration order.
  pub sources:          Vec<SourceReport>,
  /// Fingerprint of the key this node signs with.
  pub key_fingerprint:  String,
}

impl RebuildReport {
  /// Sources that were skipped this cycle, with the reason.
  pub fn warnings(&self) -> impl Iterator<Item = (&SourceReport, &FetchError)> {
    self.sources.iter().filter_map(|s| match &s.outcome {
      SourceOutcome::Failed(e) => Some((s, e)),
      SourceOutcome::Accepted(_) => None,
    })
  }

  /// Total remote assertions folded into the table.
  pub fn remote_assertions(&self) -> usize {
    self
      .sources
      .iter()
      .map(|s| match s.outcome {
        SourceOutcome::Accepted(n) => n,
        SourceOutcome::Failed(_) => 0,
      })
      .sum()
  }
}

#[derive(Debug)]
pub struct SourceReport {
  pub source_id:    Uuid,
  pub display_name: String,
  pub trust_level:  TrustLevel,
  pub outcome:      SourceOutcome,
}

#[derive(Debug)]
pub enum SourceOutcome {
  /// Every record verified; this many assertions were counted.
  Accepted(usize),
  /// Nothing from this source was counted.
  Failed(FetchError),
}

impl SourceOutcome {
  pub fn is_accepted(&self) -> bool { matches!(self, Self::Accepted(_)) }
}
