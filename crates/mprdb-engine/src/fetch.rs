//! The remote fetcher: one directory read per source, every record verified
//! against the source's registered key.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use mprdb_core::{
  assertion::{Origin, WeightedAssertion},
  directory::{Directory, RawRecord},
  source::TrustedSource,
};
use tokio::sync::mpsc;

use crate::FetchError;

/// Read `source`'s published assertions and verify each one as of `at`.
///
/// Fails on the first record that does not verify: one forged record
/// discards the whole batch.
pub async fn fetch_verified<D>(
  directory: &D,
  source: &TrustedSource,
  at: DateTime<Utc>,
) -> Result<Vec<WeightedAssertion>, FetchError>
where
  D: Directory,
{
  let records = directory
    .fetch_source_assertions(source.source_id)
    .await
    .map_err(|e| FetchError::Directory(Box::new(e)))?;

  records
    .into_iter()
    .map(|record| verify_record(source, record, at))
    .collect()
}

fn verify_record(
  source: &TrustedSource,
  record: RawRecord,
  at: DateTime<Utc>,
) -> Result<WeightedAssertion, FetchError> {
  let operation_id = record.operation_id;
  let assertion = mprdb_sign::verify_assertion(&record.content, &source.public_key, at)
    .map_err(|source| FetchError::Signature { operation_id, source })?;

  // The envelope is unsigned; it must agree with what the source signed.
  let consistent = assertion.operation_id == operation_id
    && record.source_id == source.source_id
    && record.subject_id.is_none_or(|s| s == assertion.subject_id);
  if !consistent {
    return Err(FetchError::RecordMismatch { operation_id });
  }

  tracing::debug!(
    source_id = %source.source_id,
    %operation_id,
    subject_id = %assertion.subject_id,
    "verified remote assertion"
  );

  Ok(WeightedAssertion {
    origin: Origin::Remote(source.source_id),
    trust: source.trust_level,
    assertion,
  })
}

/// Body of one spawned fetcher task: fetch under `timeout`, then forward
/// the verified batch. Returns how many assertions were forwarded.
pub(crate) async fn run_fetcher<D>(
  directory: Arc<D>,
  source: TrustedSource,
  timeout: Duration,
  tx: mpsc::Sender<WeightedAssertion>,
) -> Result<usize, FetchError>
where
  D: Directory + 'static,
{
  let verified = tokio::time::timeout(timeout, fetch_verified(&*directory, &source, Utc::now()))
    .await
    .map_err(|_| FetchError::Timeout(timeout))??;

  let count = verified.len();
  for weighted in verified {
    if tx.send(weighted).await.is_err() {
      return Err(FetchError::Aborted);
    }
  }
  Ok(count)
}
