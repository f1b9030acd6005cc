//! Ban-list export in the format Minecraft servers read from
//! `banned-players.json`.

use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};
use mprdb_core::aggregate::AggregateScore;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct BanEntry {
  pub uuid:    Uuid,
  pub created: String,
  pub source:  &'static str,
  pub expires: &'static str,
  pub reason:  String,
}

/// One permanent ban per row, all stamped `now`.
pub fn ban_list(rows: &[AggregateScore], now: DateTime<Local>) -> Vec<BanEntry> {
  let created = now.format("%Y-%m-%d %H:%M:%S %z").to_string();
  rows
    .iter()
    .map(|row| BanEntry {
      uuid:    row.subject_id,
      created: created.clone(),
      source:  "mprdb",
      expires: "forever",
      reason:  format!("mprdb reputation {:.1}", row.score),
    })
    .collect()
}

pub fn write_ban_list(path: &Path, rows: &[AggregateScore]) -> Result<usize> {
  let entries = ban_list(rows, Local::now());
  let json = serde_json::to_string_pretty(&entries).context("serialising ban list")?;
  std::fs::write(path, json)
    .with_context(|| format!("failed to write ban list to {}", path.display()))?;
  Ok(entries.len())
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn entries_follow_banned_players_format() {
    let subject = Uuid::new_v4();
    let rows = [AggregateScore { subject_id: subject, score: -3.5 }];
    let now = Local.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();

    let json = serde_json::to_value(ban_list(&rows, now)).unwrap();
    let entry = &json[0];

    assert_eq!(entry["uuid"], subject.to_string());
    assert_eq!(entry["source"], "mprdb");
    assert_eq!(entry["expires"], "forever");
    assert_eq!(entry["reason"], "mprdb reputation -3.5");
    let created = entry["created"].as_str().unwrap();
    assert!(created.starts_with("2026-10-19 08:30:00 "));
    assert_eq!(created.len(), "2026-10-19 08:30:00 +0000".len());
  }

  #[test]
  fn empty_table_exports_empty_array() {
    let path = std::env::temp_dir().join(format!("mprdb-bans-{}.json", Uuid::new_v4()));
    assert_eq!(write_ban_list(&path, &[]).unwrap(), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    std::fs::remove_file(&path).ok();
  }
}
