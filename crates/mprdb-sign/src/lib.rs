//! Signature codec for mprdb.
//!
//! Signs outgoing assertion text with this node's OpenPGP key and verifies
//! the cleartext-signed blocks peers publish. Pure synchronous; no HTTP or
//! database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use chrono::Utc;
//! use mprdb_core::assertion::Assertion;
//! use mprdb_sign::{FileKeyStore, KeyStore, sign_assertion, verify_assertion};
//! use uuid::Uuid;
//!
//! let keys = FileKeyStore::new("mprdb-priv.key", "mprdb-pub.key");
//! let assertion = Assertion::author(Uuid::new_v4(), -1.0, "x-ray mining").unwrap();
//! let block = sign_assertion(&keys, &assertion).unwrap();
//!
//! let armored = keys.load_public_key().unwrap().to_armored().unwrap();
//! let back = verify_assertion(&block, &armored, Utc::now()).unwrap();
//! assert_eq!(back, assertion);
//! ```

mod block;
pub mod content;
pub mod error;
mod keys;
mod keystore;

use chrono::{DateTime, Utc};
use mprdb_core::assertion::Assertion;

pub use content::RetractionNotice;
pub use error::{Error, Invalid, Result};
pub use keys::{PublicKey, SecretKey};
pub use keystore::{FileKeyStore, KeyStore};

// ─── Generic text ────────────────────────────────────────────────────────────

/// Sign `text` with the key held by `keys`, producing a cleartext block.
///
/// The text is canonicalised first: line breaks become LF, trailing
/// whitespace is dropped and exactly one final newline is kept. [`verify`]
/// returns the canonical form.
pub fn sign<K: KeyStore + ?Sized>(keys: &K, text: &str) -> Result<String> {
  let secret = keys.load_secret_key()?;
  block::seal(&secret, text)
}

/// Sign `text` with an already-loaded key.
pub fn sign_with(secret: &SecretKey, text: &str) -> Result<String> {
  block::seal(secret, text)
}

/// Recover the text of `signed_block` if it was signed by `key` and the key
/// is still valid at `at`.
pub fn verify(signed_block: &str, key: &PublicKey, at: DateTime<Utc>) -> Result<String> {
  block::open(signed_block, key, at)
}

/// Like [`verify`], taking the claimed key in armored form. An unusable key is
/// reported as an invalid signature.
pub fn verify_armored(
  signed_block: &str,
  armored_key: &str,
  at: DateTime<Utc>,
) -> Result<String> {
  let key =
    PublicKey::from_armored(armored_key).map_err(|e| Invalid::Key(e.to_string()))?;
  verify(signed_block, &key, at)
}

// ─── Assertions ──────────────────────────────────────────────────────────────

/// Sign the canonical text of `assertion`.
pub fn sign_assertion<K: KeyStore + ?Sized>(keys: &K, assertion: &Assertion) -> Result<String> {
  sign(keys, &content::render_assertion(assertion))
}

/// Verify `signed_block` against the armored key and parse the assertion it
/// carries. Text that does not follow the assertion grammar is an invalid
/// signature, never a partial result.
pub fn verify_assertion(
  signed_block: &str,
  armored_key: &str,
  at: DateTime<Utc>,
) -> Result<Assertion> {
  let text = verify_armored(signed_block, armored_key, at)?;
  Ok(content::parse_assertion(&text)?)
}

/// Sign a retraction notice for one of this node's assertions.
pub fn sign_retraction<K: KeyStore + ?Sized>(
  keys: &K,
  notice: &RetractionNotice,
) -> Result<String> {
  sign(keys, &notice.render())
}
