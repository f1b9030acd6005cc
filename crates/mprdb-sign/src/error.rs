//! Error types for the mprdb-sign codec.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("key unavailable: {0}")]
  KeyUnavailable(String),

  #[error("signing failed: {0}")]
  SigningFailure(String),

  #[error("signature invalid: {0}")]
  SignatureInvalid(#[from] Invalid),

  #[error("signing key expired at {0}")]
  SignatureExpired(DateTime<Utc>),

  #[error("malformed key: {0}")]
  MalformedKey(String),

  #[error("key file {0} already exists")]
  KeyExists(PathBuf),

  #[error("cannot write key file {path}: {source}")]
  KeyWrite {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Why a signed block was rejected. Every variant surfaces as
/// [`Error::SignatureInvalid`].
#[derive(Debug, Error)]
pub enum Invalid {
  #[error("not an OpenPGP cleartext-signed message: {0}")]
  Envelope(String),

  #[error("signature does not match the claimed key and text")]
  Mismatch,

  #[error("claimed public key is unusable: {0}")]
  Key(String),

  #[error("signed text does not follow the assertion grammar: {0}")]
  Grammar(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
