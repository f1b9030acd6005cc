//! Trusted sources and trust levels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── TrustLevel ──────────────────────────────────────────────────────────────

/// How much a source is trusted, from 1 (barely) to 5 (fully).
///
/// Contributions are discounted linearly: `weight = level / 5`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct TrustLevel(u8);

impl TrustLevel {
  pub const MIN: Self = Self(1);
  /// The level of the local node and of fully-trusted peers.
  pub const FULL: Self = Self(5);

  pub fn new(level: i64) -> Result<Self> {
    if (i64::from(Self::MIN.0)..=i64::from(Self::FULL.0)).contains(&level) {
      Ok(Self(level as u8))
    } else {
      Err(Error::InvalidTrustLevel(level))
    }
  }

  pub fn get(self) -> u8 { self.0 }

  /// Multiplier applied to every score from a source at this level.
  pub fn weight(self) -> f64 { f64::from(self.0) / f64::from(Self::FULL.0) }
}

impl TryFrom<i64> for TrustLevel {
  type Error = Error;

  fn try_from(level: i64) -> Result<Self> { Self::new(level) }
}

impl From<TrustLevel> for i64 {
  fn from(level: TrustLevel) -> Self { i64::from(level.0) }
}

impl std::fmt::Display for TrustLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── TrustedSource ───────────────────────────────────────────────────────────

/// A remote node whose published assertions this node folds into its
/// aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustedSource {
  pub source_id:     Uuid,
  /// Human label; never used in computation.
  pub display_name:  String,
  /// Armored public key every assertion from this source must verify
  /// against.
  pub public_key:    String,
  pub trust_level:   TrustLevel,
  /// Set by the registry when the source is added.
  pub registered_at: DateTime<Utc>,
}

/// Input to [`crate::store::TrustRegistry::add_source`].
/// `registered_at` is always set by the registry.
#[derive(Debug, Clone)]
pub struct NewSource {
  pub source_id:    Uuid,
  pub display_name: String,
  pub public_key:   String,
  pub trust_level:  TrustLevel,
}
