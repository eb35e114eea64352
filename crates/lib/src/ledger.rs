//! Revision ledger: the last successfully built revision of each package.
//!
//! One stamp file per package, `<repo>.src/<name>.ok`, holding exactly the
//! revision string with no trailing newline. A stamp is written only after
//! the package's artifacts were produced (built or reused); a failed build
//! leaves the old stamp in place so the next run treats the package as dirty
//! again.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::consts::STAMP_SUFFIX;
use crate::repo::paths::with_suffix;

#[derive(Debug, Error)]
pub enum LedgerError {
  #[error("failed to read revision stamp '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write revision stamp '{}': {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Build decision for one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
  /// Needs a build.
  Dirty,
  /// Artifacts can be reused from the previous generation.
  Clean,
}

#[derive(Debug, Clone)]
pub struct RevisionLedger {
  dir: PathBuf,
}

impl RevisionLedger {
  /// Ledger whose stamps live in `dir` (the repository's source directory).
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn stamp_path(&self, package: &str) -> PathBuf {
    stamp_for(&self.dir.join(package))
  }

  /// Last good revision, `None` if the package was never built.
  pub fn read(&self, package: &str) -> Result<Option<String>, LedgerError> {
    let path = self.stamp_path(package);
    match fs::read_to_string(&path) {
      Ok(rev) => Ok(Some(rev)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(LedgerError::Read { path, source: e }),
    }
  }

  /// Record `revision` as the last good one, replacing any prior value.
  ///
  /// Written to a sibling temp file and renamed into place.
  pub fn write(&self, package: &str, revision: &str) -> Result<(), LedgerError> {
    let path = self.stamp_path(package);
    let temp_path = with_suffix(&path, "tmp");

    fs::write(&temp_path, revision)
      .and_then(|_| fs::rename(&temp_path, &path))
      .map_err(|e| LedgerError::Write {
        path: path.clone(),
        source: e,
      })?;

    info!(package, rev = %revision, "recorded revision");
    Ok(())
  }

  /// Decide whether `package` needs a build.
  ///
  /// `resolved` is the freshly fetched revision, `None` for packages without
  /// version control (always dirty). A package is clean only when its stamp
  /// matches `resolved` byte for byte and a previous generation exists to
  /// reuse from. An unreadable stamp counts as dirty.
  pub fn freshness(&self, package: &str, resolved: Option<&str>, has_previous: bool) -> Freshness {
    let Some(resolved) = resolved else {
      return Freshness::Dirty;
    };

    let recorded = match self.read(package) {
      Ok(recorded) => recorded,
      Err(e) => {
        warn!(package, error = %e, "unreadable revision stamp, rebuilding");
        None
      }
    };

    match recorded {
      Some(recorded) if recorded == resolved && has_previous => {
        info!(package, rev = %resolved, "package already at revision");
        Freshness::Clean
      }
      Some(recorded) => {
        debug!(package, recorded = %recorded, resolved = %resolved, has_previous, "package is dirty");
        Freshness::Dirty
      }
      None => {
        debug!(package, "no recorded revision");
        Freshness::Dirty
      }
    }
  }
}

/// Stamp path for a package source directory (`<dir>.ok`).
pub fn stamp_for(source_dir: &Path) -> PathBuf {
  with_suffix(source_dir, STAMP_SUFFIX)
}
