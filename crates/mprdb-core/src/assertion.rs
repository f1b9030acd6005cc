//! Assertions, the atomic unit of reputation evidence.
//!
//! An assertion is an immutable, signed claim that a player deserves a given
//! score, authored by exactly one source. Assertions are never edited; a
//! revision is a retraction followed by a new assertion.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, source::TrustLevel};

// ─── Assertion ───────────────────────────────────────────────────────────────

/// One reputation claim about a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
  /// Globally unique, assigned when the assertion is authored.
  pub operation_id:  Uuid,
  /// The player being scored.
  pub subject_id:    Uuid,
  /// Source-defined magnitude; always finite.
  pub score:         f64,
  /// Free-text audit reason. Never empty, never spans lines.
  pub justification: String,
  /// Authoring time. Only part of the signed text; aggregation ignores it.
  pub issued_at:     DateTime<Utc>,
}

impl Assertion {
  /// Author a fresh assertion with a new operation id, stamped now.
  ///
  /// `issued_at` is truncated to whole seconds because that is all the signed
  /// text carries.
  pub fn author(
    subject_id: Uuid,
    score: f64,
    justification: impl Into<String>,
  ) -> Result<Self> {
    let assertion = Self {
      operation_id: Uuid::new_v4(),
      subject_id,
      score,
      justification: justification.into(),
      issued_at: Utc::now().trunc_subsecs(0),
    };
    assertion.validate()?;
    Ok(assertion)
  }

  /// Check the field invariants that every stored or signed assertion holds.
  pub fn validate(&self) -> Result<()> {
    if !self.score.is_finite() {
      return Err(Error::NonFiniteScore(self.score));
    }
    if !is_valid_justification(&self.justification) {
      return Err(Error::InvalidJustification);
    }
    Ok(())
  }
}

/// A justification must be non-empty and fit on one line of signed text.
/// Trailing spaces and tabs are not allowed since cleartext signatures drop
/// them.
pub fn is_valid_justification(text: &str) -> bool {
  !text.trim().is_empty() && !text.contains(['\n', '\r']) && !text.ends_with([' ', '\t'])
}

// ─── Origin ──────────────────────────────────────────────────────────────────

/// Where an assertion came from, as seen by the aggregation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "source_id", rename_all = "snake_case")]
pub enum Origin {
  /// Authored by this node; always fully trusted.
  Local,
  /// Published by a registered remote source.
  Remote(Uuid),
}

/// A verified assertion paired with the trust its origin carries.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedAssertion {
  pub origin:    Origin,
  pub trust:     TrustLevel,
  pub assertion: Assertion,
}

impl WeightedAssertion {
  /// Wrap a locally-authored assertion at full trust.
  pub fn local(assertion: Assertion) -> Self {
    Self { origin: Origin::Local, trust: TrustLevel::FULL, assertion }
  }

  /// This assertion's additive term in its subject's aggregate.
  pub fn contribution(&self) -> f64 {
    self.assertion.score * self.trust.weight()
  }
}
