//! JSON bodies exchanged with the directory.

use mprdb_core::directory::RawRecord;
use serde::Deserialize;
use uuid::Uuid;

use crate::{Error, Result};

/// The `status` value the directory uses to refuse a request.
const STATUS_REJECTED: &str = "NG";

/// Every directory response: a status flag, an optional reason, and the
/// endpoint-specific fields alongside.
#[derive(Debug, Deserialize)]
pub struct Reply<T> {
  pub status: String,
  #[serde(default)]
  pub reason: String,
  #[serde(flatten)]
  pub body:   T,
}

impl<T> Reply<T> {
  /// Turn an `NG` status into [`Error::Rejected`].
  pub fn into_body(self) -> Result<T> {
    if self.status == STATUS_REJECTED {
      return Err(Error::Rejected(self.reason));
    }
    Ok(self.body)
  }
}

/// Body of a submit or retract acknowledgement.
#[derive(Debug, Default, Deserialize)]
pub struct Ack {
  /// Operation id the directory filed the submission under.
  #[serde(default)]
  pub uuid: Option<String>,
}

/// Body of `GET /v1/submit/server/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitList {
  #[serde(default)]
  pub submits: Option<Vec<WireSubmit>>,
}

/// One stored submission.
#[derive(Debug, Deserialize)]
pub struct WireSubmit {
  /// Directory-internal row number; ignored.
  #[serde(default)]
  #[allow(dead_code)]
  pub id:          i64,
  pub uuid:        String,
  pub server_uuid: String,
  pub content:     String,
}

impl WireSubmit {
  pub fn into_record(self) -> Result<RawRecord> {
    let operation_id = Uuid::parse_str(&self.uuid)
      .map_err(|e| Error::MalformedRecord(format!("uuid {:?}: {e}", self.uuid)))?;
    let source_id = Uuid::parse_str(&self.server_uuid).map_err(|e| {
      Error::MalformedRecord(format!("server_uuid {:?}: {e}", self.server_uuid))
    })?;

    Ok(RawRecord {
      operation_id,
      subject_id: None,
      source_id,
      content: self.content,
    })
  }
}
