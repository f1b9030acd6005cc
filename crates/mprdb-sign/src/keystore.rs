//! Where this node's own key pair lives.

use std::{
  fs,
  path::{Path, PathBuf},
};

use crate::{
  Error, Result,
  keys::{PublicKey, SecretKey},
};

/// Source of this node's key material.
pub trait KeyStore: Send + Sync {
  /// Load the private key used to sign outgoing assertions.
  fn load_secret_key(&self) -> Result<SecretKey>;

  /// Load the public key peers use to verify this node.
  fn load_public_key(&self) -> Result<PublicKey>;
}

/// A key pair kept as two armored files on disk.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
  secret_path: PathBuf,
  public_path: PathBuf,
}

impl FileKeyStore {
  pub fn new(secret_path: impl Into<PathBuf>, public_path: impl Into<PathBuf>) -> Self {
    Self { secret_path: secret_path.into(), public_path: public_path.into() }
  }

  pub fn public_path(&self) -> &Path { &self.public_path }

  /// Generate a new key pair and write both files.
  ///
  /// Refuses to replace existing files unless `overwrite` is set.
  pub fn generate(&self, overwrite: bool) -> Result<PublicKey> {
    if !overwrite {
      for path in [&self.secret_path, &self.public_path] {
        if path.exists() {
          return Err(Error::KeyExists(path.clone()));
        }
      }
    }

    let secret = SecretKey::generate()?;
    let public = secret.public_key()?;

    write_key_file(&self.secret_path, &secret.to_armored()?, true)?;
    write_key_file(&self.public_path, &public.to_armored()?, false)?;

    tracing::info!(
      fingerprint = %public.fingerprint(),
      path = %self.public_path.display(),
      "generated node key pair"
    );
    Ok(public)
  }
}

impl KeyStore for FileKeyStore {
  fn load_secret_key(&self) -> Result<SecretKey> {
    let armored = read_key_file(&self.secret_path)?;
    SecretKey::from_armored(&armored).map_err(|e| {
      Error::KeyUnavailable(format!("{}: {e}", self.secret_path.display()))
    })
  }

  fn load_public_key(&self) -> Result<PublicKey> {
    let armored = read_key_file(&self.public_path)?;
    PublicKey::from_armored(&armored).map_err(|e| {
      Error::KeyUnavailable(format!("{}: {e}", self.public_path.display()))
    })
  }
}

fn read_key_file(path: &Path) -> Result<String> {
  fs::read_to_string(path)
    .map_err(|e| Error::KeyUnavailable(format!("{}: {e}", path.display())))
}

fn write_key_file(path: &Path, contents: &str, private: bool) -> Result<()> {
  let wrap = |source| Error::KeyWrite { path: path.to_path_buf(), source };
  fs::write(path, contents).map_err(wrap)?;

  if private {
    restrict_to_owner(path).map_err(wrap)?;
  }
  Ok(())
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> std::io::Result<()> {
  use std::os::unix::fs::PermissionsExt as _;
  fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> std::io::Result<()> { Ok(()) }
