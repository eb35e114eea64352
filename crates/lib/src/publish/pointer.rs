//! The stable pointer: a relative symlink naming the live generation.
//!
//! The pointer is only ever replaced by renaming a freshly created staging
//! link (`<pointer>.new`) over it. `rename(2)` swaps the directory entry in
//! one step, so a reader resolving the pointer sees either the old
//! generation or the new one, never a missing or half-written link.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::consts::STAGING_SUFFIX;
use crate::publish::types::PublishError;
use crate::repo::paths::with_suffix;

/// Generation the pointer currently names, resolved next to the pointer.
///
/// `None` when nothing has been published yet.
pub fn read_pointer(pointer: &Path) -> Result<Option<PathBuf>, PublishError> {
  match fs::read_link(pointer) {
    Ok(target) => {
      let resolved = match pointer.parent() {
        Some(parent) => parent.join(target),
        None => target,
      };
      debug!(pointer = %pointer.display(), generation = %resolved.display(), "previous generation");
      Ok(Some(resolved))
    }
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(PublishError::ReadPointer {
      path: pointer.to_path_buf(),
      source: e,
    }),
  }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
  std::os::windows::fs::symlink_dir(target, link)
}

/// Atomically repoint `pointer` at `target`.
///
/// `target` is stored verbatim as the link text; pass a name relative to the
/// pointer's directory so the published tree stays relocatable.
pub fn switch_pointer(pointer: &Path, target: &Path) -> Result<(), PublishError> {
  let staging = with_suffix(pointer, STAGING_SUFFIX);

  match fs::remove_file(&staging) {
    Ok(()) => debug!(path = %staging.display(), "removed stale staging link"),
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(e) => {
      return Err(PublishError::Stage {
        path: staging,
        source: e,
      });
    }
  }

  symlink(target, &staging).map_err(|e| PublishError::Link {
    path: staging.clone(),
    target: target.to_path_buf(),
    source: e,
  })?;

  fs::rename(&staging, pointer).map_err(|e| PublishError::Swap {
    from: staging.clone(),
    to: pointer.to_path_buf(),
    source: e,
  })?;

  info!(pointer = %pointer.display(), target = %target.display(), "published");
  Ok(())
}
