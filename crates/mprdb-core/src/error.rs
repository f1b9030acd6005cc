//! Error types for `mprdb-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid trust level {0}: must be between 1 and 5")]
  InvalidTrustLevel(i64),

  #[error("score must be a finite number, got {0}")]
  NonFiniteScore(f64),

  #[error("justification must be a non-empty single line")]
  InvalidJustification,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
