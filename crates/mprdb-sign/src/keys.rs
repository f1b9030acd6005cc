//! OpenPGP key material.
//!
//! Keys are exchanged as ASCII-armored transferable keys, so a peer's key
//! exported by any OpenPGP implementation can be trusted directly.

use chrono::{DateTime, Utc};
use pgp::{
  ArmorOptions, Deserializable as _, KeyType, SecretKeyParamsBuilder, SignedPublicKey,
  SignedSecretKey,
  types::{PublicKeyTrait as _, SecretKeyTrait as _},
};
use rand_core::OsRng;

use crate::{Error, Result};

/// User id stamped into keys this node generates.
const NODE_USER_ID: &str = "mprdb node";

// ─── Public key ──────────────────────────────────────────────────────────────

/// A verifying key with valid self-signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
  pub(crate) key: SignedPublicKey,
}

impl PublicKey {
  pub fn from_armored(input: &str) -> Result<Self> {
    let (key, _) =
      SignedPublicKey::from_string(input).map_err(|e| Error::MalformedKey(e.to_string()))?;
    key
      .verify()
      .map_err(|e| Error::MalformedKey(format!("bad self-signature: {e}")))?;
    Ok(Self { key })
  }

  pub fn to_armored(&self) -> Result<String> {
    self
      .key
      .to_armored_string(ArmorOptions::default())
      .map_err(|e| Error::MalformedKey(e.to_string()))
  }

  /// The OpenPGP fingerprint as lowercase hex.
  pub fn fingerprint(&self) -> String { hex::encode(self.key.fingerprint().as_bytes()) }

  /// Signatures are refused once this instant has passed.
  pub fn expires_at(&self) -> Option<DateTime<Utc>> { self.key.expires_at() }

  pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
    self.expires_at().is_some_and(|exp| at > exp)
  }
}

// ─── Secret key ──────────────────────────────────────────────────────────────

/// This node's signing key. Never leaves the key store except as armor.
#[derive(Clone)]
pub struct SecretKey {
  pub(crate) key: SignedSecretKey,
}

impl SecretKey {
  /// Generate a fresh, unprotected Ed25519 signing key.
  pub fn generate() -> Result<Self> {
    let params = SecretKeyParamsBuilder::default()
      .key_type(KeyType::EdDSALegacy)
      .can_certify(true)
      .can_sign(true)
      .primary_user_id(NODE_USER_ID.into())
      .passphrase(None)
      .build()
      .map_err(|e| Error::SigningFailure(e.to_string()))?;

    let key = params
      .generate(OsRng)
      .and_then(|key| key.sign(OsRng, String::new))
      .map_err(|e| Error::SigningFailure(e.to_string()))?;
    Ok(Self { key })
  }

  pub fn from_armored(input: &str) -> Result<Self> {
    let (key, _) =
      SignedSecretKey::from_string(input).map_err(|e| Error::MalformedKey(e.to_string()))?;
    key
      .verify()
      .map_err(|e| Error::MalformedKey(format!("bad self-signature: {e}")))?;
    Ok(Self { key })
  }

  pub fn to_armored(&self) -> Result<String> {
    self
      .key
      .to_armored_string(ArmorOptions::default())
      .map_err(|e| Error::MalformedKey(e.to_string()))
  }

  /// The matching transferable public key, self-signed by this key.
  pub fn public_key(&self) -> Result<PublicKey> {
    let key = self
      .key
      .public_key()
      .sign(OsRng, &self.key, String::new)
      .map_err(|e| Error::SigningFailure(e.to_string()))?;
    Ok(PublicKey { key })
  }
}

impl std::fmt::Debug for SecretKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("SecretKey(..)")
  }
}
