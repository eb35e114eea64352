use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
  #[error("failed to read '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse '{}': {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("failed to write '{}': {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to serialize descriptor for '{name}': {source}")]
  Serialize {
    name: String,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("package names must be strings, got {0:?}")]
  InvalidPackageName(serde_yaml::Value),

  #[error("duplicate package '{0}'")]
  DuplicatePackage(String),

  #[error("no target given and the repository document does not name one")]
  MissingTarget,

  #[error("cannot derive a repository name from '{}'", .0.display())]
  InvalidPath(PathBuf),
}

/// On-disk shape of `_repo.yaml`.
#[derive(Debug, Default, Deserialize)]
struct RepositoryDocument {
  #[serde(default)]
  target: String,
  #[serde(default)]
  packages: serde_yaml::Mapping,
}

/// A named package collection, loaded once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
  /// Packaging target (`deb`, `rpm`, ...), may be empty and overridden on the command line.
  pub target: String,
  /// Packages in declaration order.
  pub packages: Vec<PackageEntry>,
}

/// One `packages:` entry of the repository document.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageEntry {
  pub name: String,
  /// Inline descriptor. `None` means reuse `<name>.yaml` already on disk.
  pub inline: Option<serde_yaml::Value>,
}

impl Repository {
  pub fn load(path: &Path) -> Result<Self, RepoError> {
    let content = fs::read_to_string(path).map_err(|e| RepoError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;
    Self::parse(&content).map_err(|e| match e {
      RepoError::Parse { source, .. } => RepoError::Parse {
        path: path.to_path_buf(),
        source,
      },
      other => other,
    })
  }

  pub fn parse(content: &str) -> Result<Self, RepoError> {
    let document: RepositoryDocument = if content.trim().is_empty() {
      RepositoryDocument::default()
    } else {
      serde_yaml::from_str(content).map_err(|e| RepoError::Parse {
        path: PathBuf::new(),
        source: e,
      })?
    };

    let mut seen = HashSet::new();
    let mut packages = Vec::with_capacity(document.packages.len());
    for (key, value) in document.packages {
      let name = match key {
        serde_yaml::Value::String(name) => name,
        other => return Err(RepoError::InvalidPackageName(other)),
      };
      if !seen.insert(name.clone()) {
        return Err(RepoError::DuplicatePackage(name));
      }
      let inline = match value {
        serde_yaml::Value::Null => None,
        value => Some(value),
      };
      packages.push(PackageEntry { name, inline });
    }

    Ok(Self {
      target: document.target,
      packages,
    })
  }

  /// The command-line target wins over the document's.
  pub fn effective_target(&self, requested: Option<&str>) -> Result<String, RepoError> {
    match requested.filter(|t| !t.is_empty()) {
      Some(target) => Ok(target.to_string()),
      None if !self.target.is_empty() => Ok(self.target.clone()),
      None => Err(RepoError::MissingTarget),
    }
  }
}

/// Where a package's sources come from.
///
/// Read from `<repo>.src/<name>.yaml`. The same document may carry build
/// overrides; those fields are ignored here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSource {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub git: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dir: Option<String>,
  #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
  pub reference: Option<String>,
}

/// A git-backed source descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSource {
  pub url: String,
  /// Build runs here; revision tracking still covers the whole checkout.
  pub subdir: Option<String>,
  /// Explicit ref. Absent or `HEAD` means the remote's default branch tip.
  pub reference: Option<String>,
}

impl PackageSource {
  pub fn load(path: &Path) -> Result<Self, RepoError> {
    let content = fs::read_to_string(path).map_err(|e| RepoError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;
    if content.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str::<Option<Self>>(&content)
      .map(Option::unwrap_or_default)
      .map_err(|e| RepoError::Parse {
        path: path.to_path_buf(),
        source: e,
      })
  }

  /// `None` for sources without version control; those rebuild every run.
  pub fn git(&self) -> Option<GitSource> {
    let url = self.git.as_deref().filter(|url| !url.is_empty())?;
    Some(GitSource {
      url: url.to_string(),
      subdir: self.dir.clone().filter(|d| !d.is_empty()),
      reference: self.reference.clone().filter(|r| !r.is_empty()),
    })
  }
}

/// Persist an inline descriptor so the rest of the run can re-read it.
pub fn write_descriptor(path: &Path, name: &str, value: &serde_yaml::Value) -> Result<(), RepoError> {
  let content = serde_yaml::to_string(value).map_err(|e| RepoError::Serialize {
    name: name.to_string(),
    source: e,
  })?;
  fs::write(path, content).map_err(|e| RepoError::Write {
    path: path.to_path_buf(),
    source: e,
  })
}
