//! The central directory, as seen by the aggregation engine.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One submission as published by the directory, before verification.
///
/// Nothing in here is trusted: `content` is the signed block the author
/// uploaded, and the envelope fields are whatever the directory claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
  pub operation_id: Uuid,
  /// The subject, when the directory reports it alongside the content.
  pub subject_id:   Option<Uuid>,
  pub source_id:    Uuid,
  /// Armored cleartext-signed assertion text.
  pub content:      String,
}

/// Read access to the assertions each source has published.
pub trait Directory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every record the directory holds for `source_id`, in one read.
  fn fetch_source_assertions(
    &self,
    source_id: Uuid,
  ) -> impl Future<Output = Result<Vec<RawRecord>, Self::Error>> + Send + '_;
}
