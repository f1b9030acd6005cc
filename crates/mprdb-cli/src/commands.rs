//! One function per subcommand.

use std::{path::Path, sync::Arc};

use anyhow::{Context as _, Result, bail};
use chrono::{SubsecRound as _, Utc};
use mprdb_core::{
  aggregate::{AggregateScore, ScoreQuery},
  assertion::{Assertion, is_valid_justification},
  source::{NewSource, TrustLevel},
  store::{AggregateStore, LocalLedger, TrustRegistry},
};
use mprdb_directory::DirectoryClient;
use mprdb_engine::AggregationEngine;
use mprdb_sign::{PublicKey, RetractionNotice};
use mprdb_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{export, settings::NodeConfig};

async fn open_store(cfg: &NodeConfig) -> Result<SqliteStore> {
  let path = cfg.database_path();
  SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}

fn open_directory(cfg: &NodeConfig) -> Result<DirectoryClient> {
  DirectoryClient::new(cfg.directory()?).context("failed to build HTTP client")
}

// ─── Keys and sources ────────────────────────────────────────────────────────

pub fn keygen(cfg: &NodeConfig, force: bool) -> Result<()> {
  let keys = cfg.key_store();
  let public = keys.generate(force).context("key generation failed")?;

  println!("fingerprint  {}", public.fingerprint());
  println!("public key   {}", keys.public_path().display());
  Ok(())
}

pub async fn trust(
  cfg: &NodeConfig,
  source_id: Uuid,
  pubkey: &Path,
  level: i64,
  name: Option<String>,
) -> Result<()> {
  let armored = std::fs::read_to_string(pubkey)
    .with_context(|| format!("failed to read {}", pubkey.display()))?;
  let key = PublicKey::from_armored(&armored)
    .with_context(|| format!("{} is not an OpenPGP public key", pubkey.display()))?;
  let trust_level = TrustLevel::new(level)?;

  let store = open_store(cfg).await?;
  let source = store
    .add_source(NewSource {
      source_id,
      display_name: name.unwrap_or_else(|| source_id.to_string()),
      public_key: key.to_armored()?,
      trust_level,
    })
    .await
    .context("failed to trust source")?;

  tracing::info!(
    %source_id,
    level = %source.trust_level,
    fingerprint = %key.fingerprint(),
    expires = ?key.expires_at(),
    "source trusted"
  );
  Ok(())
}

pub async fn sources(cfg: &NodeConfig) -> Result<()> {
  let store = open_store(cfg).await?;
  let sources = store.list_sources().await?;

  println!("{:<36}  {:>5}  {:<40}  name", "source", "level", "fingerprint");
  for source in &sources {
    let fingerprint = PublicKey::from_armored(&source.public_key)
      .map(|k| k.fingerprint())
      .unwrap_or_else(|_| "(unreadable key)".into());
    println!(
      "{}  {:>5}  {:<40}  {}",
      source.source_id,
      source.trust_level.get(),
      fingerprint,
      source.display_name
    );
  }
  Ok(())
}

// ─── Publishing ──────────────────────────────────────────────────────────────

pub async fn submit(cfg: &NodeConfig, player: Uuid, points: f64, comment: String) -> Result<()> {
  let assertion = Assertion::author(player, points, comment.trim()).context("invalid assertion")?;
  let block = mprdb_sign::sign_assertion(&cfg.key_store(), &assertion)
    .context("failed to sign assertion")?;

  let store = open_store(cfg).await?;
  let directory = open_directory(cfg)?;

  let filed = directory
    .submit(block)
    .await
    .context("directory did not accept the submission")?;
  if let Some(id) = filed
    && id != assertion.operation_id
  {
    tracing::warn!(
      signed = %assertion.operation_id,
      filed = %id,
      "directory filed the submission under a different id"
    );
  }

  store
    .record_assertion(assertion.clone())
    .await
    .context("published, but failed to record in the local ledger")?;

  println!("{}", assertion.operation_id);
  Ok(())
}

pub async fn retract(cfg: &NodeConfig, operation_id: Uuid, comment: String) -> Result<()> {
  let comment = comment.trim();
  if !is_valid_justification(comment) {
    bail!("comment must be a single non-empty line");
  }
  let notice = RetractionNotice {
    issued_at: Utc::now().trunc_subsecs(0),
    comment:   comment.to_owned(),
  };
  let block = mprdb_sign::sign_retraction(&cfg.key_store(), &notice)
    .context("failed to sign retraction")?;

  let store = open_store(cfg).await?;
  let directory = open_directory(cfg)?;

  directory
    .retract(operation_id, block)
    .await
    .context("directory did not accept the retraction")?;
  store
    .remove_assertion(operation_id)
    .await
    .context("retracted from the directory, but not removed from the local ledger")?;

  tracing::info!(%operation_id, "assertion retracted");
  Ok(())
}

pub async fn submissions(cfg: &NodeConfig) -> Result<()> {
  let store = open_store(cfg).await?;
  let assertions = store.read_all().await?;

  println!("{:<36}  {:<36}  {:>8}  comment", "operation", "player", "points");
  for a in &assertions {
    println!(
      "{}  {}  {:>8.2}  {}",
      a.operation_id, a.subject_id, a.score, a.justification
    );
  }
  Ok(())
}

// ─── Aggregate ───────────────────────────────────────────────────────────────

pub async fn update(cfg: &NodeConfig, at_most: Option<f64>, export: Option<&Path>) -> Result<()> {
  let store = Arc::new(open_store(cfg).await?);
  let engine = AggregationEngine::new(
    store.clone(),
    store.clone(),
    store.clone(),
    Arc::new(open_directory(cfg)?),
    Arc::new(cfg.key_store()),
    cfg.engine(),
  );

  let report = engine.rebuild().await.context("aggregate rebuild failed")?;
  for (source, err) in report.warnings() {
    eprintln!(
      "warning: skipped {} ({}): {err}",
      source.display_name, source.source_id
    );
  }

  let rows = engine.read_scores(&ScoreQuery { at_most }).await?;
  print_scores(&rows);
  println!(
    "{} subjects from {} local and {} remote assertions (key {})",
    report.scores.len(),
    report.local_assertions,
    report.remote_assertions(),
    report.key_fingerprint
  );

  if let Some(path) = export {
    let entries = export::write_ban_list(path, &rows)?;
    tracing::info!(path = %path.display(), entries, "ban list exported");
  }
  Ok(())
}

pub async fn report(cfg: &NodeConfig, at_most: Option<f64>) -> Result<()> {
  let store = open_store(cfg).await?;
  let rows = store.list_scores(&ScoreQuery { at_most }).await?;
  print_scores(&rows);
  Ok(())
}

fn print_scores(rows: &[AggregateScore]) {
  println!("{:<36}  {:>8}", "player", "score");
  for row in rows {
    println!("{}  {:>8.2}", row.subject_id, row.score);
  }
}
