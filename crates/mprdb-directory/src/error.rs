//! Error type for `mprdb-directory`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("network error: {0}")]
  Network(#[from] reqwest::Error),

  #[error("{what} → HTTP {status}")]
  Status {
    what:   &'static str,
    status: reqwest::StatusCode,
  },

  #[error("decoding {what}: {source}")]
  Decode {
    what:   &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error("directory returned a malformed record: {0}")]
  MalformedRecord(String),

  #[error("directory rejected the request: {0}")]
  Rejected(String),
}

impl Error {
  /// `true` when the directory answered and refused, as opposed to the
  /// request never completing.
  pub fn is_rejected(&self) -> bool { matches!(self, Self::Rejected(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
