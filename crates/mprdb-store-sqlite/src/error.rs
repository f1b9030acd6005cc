//! Error type for `mprdb-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] mprdb_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("source {0} is already trusted")]
  DuplicateSource(uuid::Uuid),

  #[error("assertion {0} is already recorded")]
  DuplicateAssertion(uuid::Uuid),

  #[error("assertion not found: {0}")]
  AssertionNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
