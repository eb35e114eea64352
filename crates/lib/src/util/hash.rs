//! SHA-256 helpers.
//!
//! Image tags for inline container definitions are derived from these, and the
//! reuse tests compare artifact contents with them.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data` (64 characters).
pub fn hash_bytes(data: &[u8]) -> String {
  hex::encode(Sha256::digest(data))
}

/// Lowercase hex SHA-256 of a file's contents, streamed.
pub fn hash_file(path: &Path) -> io::Result<String> {
  let mut file = fs::File::open(path)?;
  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(hex::encode(hasher.finalize()))
}
