//! Path derivation for a repository run.
//!
//! # Layout
//!
//! ```text
//! <repo>.src/                    # sources, descriptors, stamps
//! │   ├── _repo.yaml
//! │   ├── <name>/                # git working copy
//! │   ├── <name>.yaml            # source descriptor
//! │   └── <name>.ok              # last good revision
//! <repo>.<target>.<timestamp>/   # one generation
//! │   └── <name>/                # package artifacts
//! <repo>.<target> -> <repo>.<target>.<timestamp>   # stable pointer
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, Timelike};

use crate::consts::{GENERATION_TIME_FORMAT, REPO_DOCUMENT, SOURCE_DIR_SUFFIX, STAGING_SUFFIX};
use crate::repo::types::RepoError;

/// Append `.suffix` to the last component of `path`.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
  let mut name = OsString::from(path.as_os_str());
  name.push(".");
  name.push(suffix);
  PathBuf::from(name)
}

fn strip_extension(path: &Path) -> PathBuf {
  match path.extension() {
    Some(_) => path.with_extension(""),
    None => path.to_path_buf(),
  }
}

/// Repository directory and document resolved from a command-line argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
  /// Base path every derived path hangs off (`<repo>`; not itself a directory).
  pub repo_dir: PathBuf,
  /// The repository YAML document.
  pub document: PathBuf,
}

impl RepoPaths {
  /// Resolve `argument` as given on the command line.
  ///
  /// - `X.yaml` file: repo `X`, document is the file itself.
  /// - `X.ext` directory: repo `X`, document `X.src/_repo.yaml`.
  /// - with a data root `D`, a name that does not exist: repo `D/name`,
  ///   document `D/name/_repo.yaml`.
  ///
  /// With a data root, the first two forms are re-rooted to `D/<basename>`
  /// (for the directory form the document moves along with it).
  pub fn resolve(argument: &Path, data_root: Option<&Path>) -> Result<Self, RepoError> {
    let rerooted = |repo_dir: PathBuf| -> Result<PathBuf, RepoError> {
      match data_root {
        Some(root) => repo_dir
          .file_name()
          .map(|base| root.join(base))
          .ok_or_else(|| RepoError::InvalidPath(argument.to_path_buf())),
        None => Ok(repo_dir),
      }
    };

    match std::fs::metadata(argument) {
      Err(e) if e.kind() == std::io::ErrorKind::NotFound && data_root.is_some() => {
        let repo_dir = data_root.map(|root| root.join(argument)).unwrap_or_default();
        let document = repo_dir.join(REPO_DOCUMENT);
        Ok(Self { repo_dir, document })
      }
      Err(e) => Err(RepoError::Read {
        path: argument.to_path_buf(),
        source: e,
      }),
      Ok(meta) if meta.is_dir() => {
        let repo_dir = rerooted(strip_extension(argument))?;
        let document = with_suffix(&repo_dir, SOURCE_DIR_SUFFIX).join(REPO_DOCUMENT);
        Ok(Self { repo_dir, document })
      }
      Ok(_) => {
        let repo_dir = strip_extension(argument);
        Ok(Self {
          repo_dir: rerooted(repo_dir)?,
          document: argument.to_path_buf(),
        })
      }
    }
  }
}

/// Paths derived from a repository directory and a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLayout {
  repo_dir: PathBuf,
  target: String,
}

impl RepoLayout {
  pub fn new(repo_dir: impl Into<PathBuf>, target: impl Into<String>) -> Self {
    Self {
      repo_dir: repo_dir.into(),
      target: target.into(),
    }
  }

  pub fn target(&self) -> &str {
    &self.target
  }

  /// Repository base name (`repo` for `/data/repo`), passed to the metadata tool.
  pub fn base_name(&self) -> String {
    self
      .repo_dir
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }

  pub fn source_dir(&self) -> PathBuf {
    with_suffix(&self.repo_dir, SOURCE_DIR_SUFFIX)
  }

  pub fn package_source_dir(&self, package: &str) -> PathBuf {
    self.source_dir().join(package)
  }

  pub fn package_descriptor(&self, package: &str) -> PathBuf {
    with_suffix(&self.package_source_dir(package), "yaml")
  }

  /// The stable pointer, `<repo>.<target>`.
  pub fn pointer(&self) -> PathBuf {
    with_suffix(&self.repo_dir, &self.target)
  }

  /// Staging link renamed over the pointer on publish.
  pub fn staging_pointer(&self) -> PathBuf {
    with_suffix(&self.pointer(), STAGING_SUFFIX)
  }

  pub fn generation_dir(&self, stamp: &str) -> PathBuf {
    with_suffix(&self.pointer(), stamp)
  }
}

/// Hands out generation timestamps that never repeat within one process.
///
/// Two runs started inside the same second get consecutive seconds instead of
/// the same directory name.
#[derive(Debug, Default)]
pub struct GenerationClock {
  last: Option<NaiveDateTime>,
}

impl GenerationClock {
  pub fn new() -> Self {
    Self::default()
  }

  /// Timestamp for a generation starting at `now`.
  pub fn stamp_at(&mut self, now: DateTime<Local>) -> String {
    let naive = now.naive_local();
    let mut current = naive.with_nanosecond(0).unwrap_or(naive);
    if let Some(last) = self.last
      && current <= last
    {
      current = last + TimeDelta::seconds(1);
    }
    self.last = Some(current);
    current.format(GENERATION_TIME_FORMAT).to_string()
  }

  pub fn stamp(&mut self) -> String {
    self.stamp_at(Local::now())
  }
}
