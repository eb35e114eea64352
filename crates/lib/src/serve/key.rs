//! Shared-secret handling for the publish endpoint.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::serve::types::ServeError;

/// 32 random bytes, hex encoded.
pub fn random_key() -> String {
  hex::encode(rand::random::<[u8; 32]>())
}

/// Read the key stored at `path`, creating it when missing or empty.
///
/// A generated key is written with mode 0600.
pub fn load_or_create_key(path: &Path) -> Result<String, ServeError> {
  match fs::read_to_string(path) {
    Ok(content) if !content.trim().is_empty() => return Ok(content.trim().to_string()),
    Ok(_) => warn!(path = %path.display(), "key file is empty, generating a new key"),
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      info!(path = %path.display(), "key file not found, generating a new key")
    }
    Err(e) => {
      return Err(ServeError::KeyFile {
        path: path.to_path_buf(),
        source: e,
      });
    }
  }

  let key = random_key();
  write_private(path, key.as_bytes()).map_err(|e| ServeError::KeyFile {
    path: path.to_path_buf(),
    source: e,
  })?;
  Ok(key)
}

#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> io::Result<()> {
  use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

  let mut file = fs::OpenOptions::new()
    .write(true)
    .create(true)
    .truncate(true)
    .mode(0o600)
    .open(path)?;
  // An existing empty file keeps its old mode otherwise.
  file.set_permissions(fs::Permissions::from_mode(0o600))?;
  file.write_all(content)
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> io::Result<()> {
  fs::File::create(path)?.write_all(content)
}

/// Pick the key: explicit value, then key file, then a fresh random key that
/// is logged so the operator can use it.
pub fn resolve_key(key: Option<&str>, keyfile: Option<&Path>) -> Result<String, ServeError> {
  if let Some(key) = key.filter(|k| !k.is_empty()) {
    return Ok(key.to_string());
  }
  if let Some(path) = keyfile {
    return load_or_create_key(path);
  }
  let key = random_key();
  info!(key = %key, "generated API key");
  Ok(key)
}
