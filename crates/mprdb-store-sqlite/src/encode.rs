//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Scores are stored as REAL.

use chrono::{DateTime, Utc};
use mprdb_core::{
  aggregate::AggregateScore,
  assertion::Assertion,
  source::{TrustLevel, TrustedSource},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `sources` row.
pub struct RawSource {
  pub source_id:     String,
  pub display_name:  String,
  pub public_key:    String,
  pub trust_level:   i64,
  pub registered_at: String,
}

impl RawSource {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      source_id:     row.get(0)?,
      display_name:  row.get(1)?,
      public_key:    row.get(2)?,
      trust_level:   row.get(3)?,
      registered_at: row.get(4)?,
    })
  }

  pub fn into_source(self) -> Result<TrustedSource> {
    Ok(TrustedSource {
      source_id:     decode_uuid(&self.source_id)?,
      display_name:  self.display_name,
      public_key:    self.public_key,
      trust_level:   TrustLevel::new(self.trust_level)?,
      registered_at: decode_dt(&self.registered_at)?,
    })
  }
}

/// Raw values read directly from a `submissions` row.
pub struct RawAssertion {
  pub operation_id:  String,
  pub subject_id:    String,
  pub score:         f64,
  pub justification: String,
  pub issued_at:     String,
}

impl RawAssertion {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      operation_id:  row.get(0)?,
      subject_id:    row.get(1)?,
      score:         row.get(2)?,
      justification: row.get(3)?,
      issued_at:     row.get(4)?,
    })
  }

  pub fn into_assertion(self) -> Result<Assertion> {
    Ok(Assertion {
      operation_id:  decode_uuid(&self.operation_id)?,
      subject_id:    decode_uuid(&self.subject_id)?,
      score:         self.score,
      justification: self.justification,
      issued_at:     decode_dt(&self.issued_at)?,
    })
  }
}

/// Raw values read directly from a `reputation` row.
pub struct RawScore {
  pub subject_id: String,
  pub score:      f64,
}

impl RawScore {
  pub fn into_score(self) -> Result<AggregateScore> {
    Ok(AggregateScore { subject_id: decode_uuid(&self.subject_id)?, score: self.score })
  }
}
