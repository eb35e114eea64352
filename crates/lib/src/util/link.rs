//! Recursive hard-link mirroring of a directory tree.
//!
//! Unchanged packages are carried into a new generation by mirroring the
//! previous generation's package directory: directories are recreated with
//! the source's permission bits and every regular file is hard-linked, never
//! copied. Each generation is then a self-contained tree that can be removed
//! on its own; the link count keeps shared files alive.
//!
//! Symlinks, sockets, devices and the like are rejected with an error rather
//! than skipped.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum LinkError {
  #[error("failed to walk '{}': {source}", path.display())]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("failed to create directory '{}': {source}", path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to set permissions on '{}': {source}", path.display())]
  Permissions {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to link '{}' to '{}': {source}", from.display(), to.display())]
  Link {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("cannot hard-link '{}': not a regular file or directory", path.display())]
  Unsupported { path: PathBuf },
}

/// Mirror `source` into `destination`, returning the number of files linked.
///
/// `destination` may already exist as an empty directory. A `source` that is
/// a regular file is linked directly to `destination`.
pub fn link_tree(source: &Path, destination: &Path) -> Result<usize, LinkError> {
  let mut linked = 0;
  let mut directories = Vec::new();

  for entry in WalkDir::new(source).follow_links(false) {
    let entry = entry.map_err(|e| LinkError::Walk {
      path: source.to_path_buf(),
      source: e,
    })?;

    let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
    let target = if relative.as_os_str().is_empty() {
      destination.to_path_buf()
    } else {
      destination.join(relative)
    };

    let file_type = entry.file_type();
    if file_type.is_dir() {
      fs::create_dir_all(&target).map_err(|e| LinkError::CreateDir {
        path: target.clone(),
        source: e,
      })?;
      let metadata = entry.metadata().map_err(|e| LinkError::Walk {
        path: entry.path().to_path_buf(),
        source: e,
      })?;
      directories.push((target, metadata.permissions()));
    } else if file_type.is_file() {
      fs::hard_link(entry.path(), &target).map_err(|e| LinkError::Link {
        from: entry.path().to_path_buf(),
        to: target.clone(),
        source: e,
      })?;
      linked += 1;
    } else {
      return Err(LinkError::Unsupported {
        path: entry.path().to_path_buf(),
      });
    }
  }

  // Applied deepest-first so a read-only parent never blocks its children.
  for (path, permissions) in directories.into_iter().rev() {
    fs::set_permissions(&path, permissions).map_err(|e| LinkError::Permissions { path, source: e })?;
  }

  debug!(from = %source.display(), to = %destination.display(), files = linked, "linked tree");
  Ok(linked)
}
