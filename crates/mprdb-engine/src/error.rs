//! Error types for `mprdb-engine`.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

/// A collaborator error with its concrete type erased.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fatal rebuild errors.
#[derive(Debug, Error)]
pub enum Error {
  #[error("local key unavailable: {0}")]
  KeyUnavailable(#[source] mprdb_sign::Error),

  #[error("storage unavailable: {0}")]
  StorageUnavailable(#[source] BoxError),

  #[error("an aggregate rebuild is already in progress")]
  RebuildInProgress,
}

impl Error {
  pub(crate) fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StorageUnavailable(Box::new(e))
  }
}

/// Why one source contributed nothing to a rebuild.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("directory: {0}")]
  Directory(#[source] BoxError),

  #[error("record {operation_id}: {source}")]
  Signature {
    operation_id: Uuid,
    #[source]
    source:       mprdb_sign::Error,
  },

  #[error("record {operation_id}: envelope does not match the signed content")]
  RecordMismatch { operation_id: Uuid },

  #[error("no response within {0:?}")]
  Timeout(Duration),

  #[error("fetch aborted")]
  Aborted,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
