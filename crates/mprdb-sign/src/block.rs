//! OpenPGP cleartext-signed messages.
//!
//! ```text
//! -----BEGIN PGP SIGNED MESSAGE-----
//! Hash: SHA256
//!
//! <text, dash-escaped>
//! -----BEGIN PGP SIGNATURE-----
//!
//! <armored signature packet>
//! -----END PGP SIGNATURE-----
//! ```
//!
//! The line break in front of the signature armor belongs to the framing, so
//! the final newline of a canonical text is not part of the signed bytes.
//! Blocks produced this way match `gpg --clearsign` over the same text.

use chrono::{DateTime, Utc};
use pgp::{ArmorOptions, composed::cleartext::CleartextSignedMessage};
use rand_core::OsRng;

use crate::{
  Error, Result,
  error::Invalid,
  keys::{PublicKey, SecretKey},
};

/// Bring `text` into signable form.
///
/// Every line break becomes `\n`, trailing spaces and tabs are dropped from
/// each line (cleartext verification ignores them), trailing blank lines are
/// removed and a single final newline is added unless the text is empty.
pub(crate) fn canonicalize(text: &str) -> String {
  let unified = text.replace("\r\n", "\n").replace('\r', "\n");
  let mut out = String::with_capacity(unified.len() + 1);
  for line in unified.trim_end_matches('\n').split('\n') {
    out.push_str(line.trim_end_matches([' ', '\t']));
    out.push('\n');
  }
  if out.trim_start_matches('\n').is_empty() {
    out.clear();
  }
  out
}

/// Sign `text` and wrap it in a cleartext block.
pub(crate) fn seal(secret: &SecretKey, text: &str) -> Result<String> {
  let text = canonicalize(text);
  let Some(body) = text.strip_suffix('\n') else {
    return Err(Error::SigningFailure("nothing to sign".into()));
  };

  let message = CleartextSignedMessage::sign(OsRng, body, &secret.key, String::new)
    .map_err(|e| Error::SigningFailure(e.to_string()))?;
  message
    .to_armored_string(ArmorOptions::default())
    .map_err(|e| Error::SigningFailure(e.to_string()))
}

/// Check `block` against `key` as of `at` and return the signed text in
/// canonical form.
///
/// Signatures made by the primary key or by any of its signing subkeys are
/// accepted.
pub(crate) fn open(block: &str, key: &PublicKey, at: DateTime<Utc>) -> Result<String> {
  let (message, _) = CleartextSignedMessage::from_string(block)
    .map_err(|e| Invalid::Envelope(e.to_string()))?;

  if let Some(expired) = key.expires_at().filter(|_| key.is_expired_at(at)) {
    return Err(Error::SignatureExpired(expired));
  }

  let verified = message.verify(&key.key).is_ok()
    || key
      .key
      .public_subkeys
      .iter()
      .any(|sub| message.verify(sub).is_ok());
  if !verified {
    return Err(Invalid::Mismatch.into());
  }

  Ok(canonicalize(&message.signed_text()))
}
