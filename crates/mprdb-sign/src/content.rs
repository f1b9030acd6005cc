//! The canonical text forms that get signed.
//!
//! An assertion is signed as exactly five `name: value` lines, in this order,
//! each terminated by `\n`:
//!
//! ```text
//! uuid: 6f1c2a9e-3b7d-4c55-9a0e-2d8f41b7c3aa
//! timestamp: 1760892000
//! player_uuid: a5fac3b4-ff62-4c1d-8e3a-0b9d2f6e7c11
//! points: -1.0
//! comment: x-ray mining
//! ```
//!
//! Parsing is all-or-nothing: any deviation rejects the whole text.

use chrono::{DateTime, Utc};
use mprdb_core::assertion::{Assertion, is_valid_justification};
use uuid::Uuid;

use crate::error::Invalid;

const FIELDS: [&str; 5] = ["uuid", "timestamp", "player_uuid", "points", "comment"];

// ─── Assertions ──────────────────────────────────────────────────────────────

/// Render the canonical signed text of `assertion`.
pub fn render_assertion(assertion: &Assertion) -> String {
  format!(
    "uuid: {}\ntimestamp: {}\nplayer_uuid: {}\npoints: {}\ncomment: {}\n",
    assertion.operation_id.hyphenated(),
    assertion.issued_at.timestamp(),
    assertion.subject_id.hyphenated(),
    render_points(assertion.score),
    assertion.justification,
  )
}

/// Parse canonical signed text back into an [`Assertion`].
pub fn parse_assertion(text: &str) -> Result<Assertion, Invalid> {
  let values = split_fields(text, &FIELDS)?;

  let operation_id = parse_uuid("uuid", values[0])?;
  let issued_at = parse_timestamp(values[1])?;
  let subject_id = parse_uuid("player_uuid", values[2])?;
  let score = parse_points(values[3])?;
  let justification = values[4];
  if !is_valid_justification(justification) {
    return Err(grammar("comment must not be empty"));
  }

  Ok(Assertion {
    operation_id,
    subject_id,
    score,
    justification: justification.to_owned(),
    issued_at,
  })
}

/// Scores are written with at least one fractional digit (`2.0`, `-0.5`).
fn render_points(score: f64) -> String {
  let s = score.to_string();
  if s.contains('.') { s } else { format!("{s}.0") }
}

// ─── Retraction notices ──────────────────────────────────────────────────────

/// The signed body of a request to withdraw a published assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct RetractionNotice {
  pub issued_at: DateTime<Utc>,
  pub comment:   String,
}

impl RetractionNotice {
  pub fn render(&self) -> String {
    format!("timestamp: {}\ncomment: {}\n", self.issued_at.timestamp(), self.comment)
  }

  pub fn parse(text: &str) -> Result<Self, Invalid> {
    let values = split_fields(text, &["timestamp", "comment"])?;
    Ok(Self {
      issued_at: parse_timestamp(values[0])?,
      comment:   values[1].to_owned(),
    })
  }
}

// ─── Field helpers ───────────────────────────────────────────────────────────

fn grammar(msg: impl Into<String>) -> Invalid { Invalid::Grammar(msg.into()) }

/// Check that `text` is exactly `names.len()` newline-terminated lines named
/// `names` in order, and return their values.
fn split_fields<'a>(text: &'a str, names: &[&str]) -> Result<Vec<&'a str>, Invalid> {
  let body = text
    .strip_suffix('\n')
    .ok_or_else(|| grammar("text must end with a newline"))?;

  let lines: Vec<&str> = body.split('\n').collect();
  if lines.len() != names.len() {
    return Err(grammar(format!(
      "expected {} lines, found {}",
      names.len(),
      lines.len()
    )));
  }

  lines
    .iter()
    .zip(names)
    .map(|(line, name)| {
      line
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix(": "))
        .ok_or_else(|| grammar(format!("expected `{name}: ` line, found {line:?}")))
    })
    .collect()
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, Invalid> {
  // Only the 36-character hyphenated form is canonical.
  if value.len() != 36 {
    return Err(grammar(format!("{field} is not a hyphenated uuid")));
  }
  Uuid::parse_str(value).map_err(|e| grammar(format!("{field}: {e}")))
}

/// Unix seconds in plain decimal, without sign or leading zeros.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, Invalid> {
  let secs = value
    .parse::<i64>()
    .ok()
    .filter(|secs| *secs >= 0 && secs.to_string() == value)
    .ok_or_else(|| grammar(format!("timestamp {value:?} is not unix seconds")))?;
  DateTime::from_timestamp(secs, 0).ok_or_else(|| grammar("timestamp out of range"))
}

/// Only the spelling [`render_points`] would produce is accepted.
fn parse_points(value: &str) -> Result<f64, Invalid> {
  value
    .parse::<f64>()
    .ok()
    .filter(|p| p.is_finite() && render_points(*p) == value)
    .ok_or_else(|| grammar(format!("points {value:?} is not a canonical decimal")))
}

#[cfg(test)]
mod tests {
  use super::*;

  const OP: &str = "6f1c2a9e-3b7d-4c55-9a0e-2d8f41b7c3aa";
  const PLAYER: &str = "a5fac3b4-ff62-4c1d-8e3a-0b9d2f6e7c11";

  fn canonical(points: &str, comment: &str) -> String {
    format!(
      "uuid: {OP}\ntimestamp: 1760892000\nplayer_uuid: {PLAYER}\npoints: {points}\ncomment: {comment}\n"
    )
  }

  #[test]
  fn parses_canonical_text() {
    let a = parse_assertion(&canonical("-1.0", "x-ray: mining")).unwrap();
    assert_eq!(a.operation_id.to_string(), OP);
    assert_eq!(a.subject_id.to_string(), PLAYER);
    assert_eq!(a.score, -1.0);
    assert_eq!(a.justification, "x-ray: mining");
    assert_eq!(a.issued_at.timestamp(), 1_760_892_000);
  }

  #[test]
  fn render_writes_fields_in_order() {
    let a = parse_assertion(&canonical("2.5", "helped new players")).unwrap();
    assert_eq!(render_assertion(&a), canonical("2.5", "helped new players"));
  }

  #[test]
  fn whole_scores_keep_a_fractional_digit() {
    let mut a = parse_assertion(&canonical("1.0", "ok")).unwrap();
    a.score = 3.0;
    assert!(render_assertion(&a).contains("\npoints: 3.0\n"));
    a.score = -0.25;
    assert!(render_assertion(&a).contains("\npoints: -0.25\n"));
  }

  #[test]
  fn rejects_missing_trailing_newline() {
    let text = canonical("1.0", "ok");
    let r = parse_assertion(text.trim_end());
    assert!(matches!(r, Err(Invalid::Grammar(_))));
  }

  #[test]
  fn rejects_trailing_field() {
    let text = canonical("1.0", "ok") + "extra: field\n";
    assert!(matches!(parse_assertion(&text), Err(Invalid::Grammar(_))));
  }

  #[test]
  fn rejects_reordered_fields() {
    let text = format!(
      "timestamp: 1760892000\nuuid: {OP}\nplayer_uuid: {PLAYER}\npoints: 1.0\ncomment: ok\n"
    );
    assert!(matches!(parse_assertion(&text), Err(Invalid::Grammar(_))));
  }

  #[test]
  fn rejects_bad_values() {
    for bad in ["NaN", "inf", "", "one"] {
      assert!(
        parse_assertion(&canonical(bad, "ok")).is_err(),
        "points {bad:?} should be rejected"
      );
    }
    assert!(parse_assertion(&canonical("1.0", "")).is_err());

    let short_uuid = canonical("1.0", "ok").replace(OP, "6f1c2a9e3b7d4c559a0e2d8f41b7c3aa");
    assert!(parse_assertion(&short_uuid).is_err());

    let negative_ts = canonical("1.0", "ok").replace("1760892000", "-5");
    assert!(parse_assertion(&negative_ts).is_err());
  }

  #[test]
  fn only_canonical_spellings_are_accepted() {
    for bad in ["+1.0", "1e3", ".5", "5.", "1", "01.0", "1.50", "-0.50", " 1.0", "1.0 "] {
      assert!(
        parse_assertion(&canonical(bad, "ok")).is_err(),
        "points {bad:?} should be rejected"
      );
    }
    for good in ["0.0", "-0.5", "12.25", "-3.0"] {
      let a = parse_assertion(&canonical(good, "ok")).unwrap();
      assert_eq!(render_assertion(&a), canonical(good, "ok"));
    }

    for bad in ["01760892000", "+1760892000", "1760892000.0", ""] {
      let text = canonical("1.0", "ok").replace("1760892000", bad);
      assert!(parse_assertion(&text).is_err(), "timestamp {bad:?} should be rejected");
    }
    let epoch = canonical("1.0", "ok").replace("1760892000", "0");
    assert_eq!(parse_assertion(&epoch).unwrap().issued_at.timestamp(), 0);
  }

  #[test]
  fn retraction_notice_round_trips() {
    let notice = RetractionNotice {
      issued_at: DateTime::from_timestamp(1_760_892_000, 0).unwrap(),
      comment:   "appeal accepted".into(),
    };
    assert_eq!(notice.render(), "timestamp: 1760892000\ncomment: appeal accepted\n");
    assert_eq!(RetractionNotice::parse(&notice.render()).unwrap(), notice);
  }
}
