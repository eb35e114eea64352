use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::execute::ExecuteError;

#[derive(Debug, Error)]
pub enum ComposeError {
  #[error("failed to read build file '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse build file '{}': {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("build directory '{}' does not exist", .0.display())]
  MissingWorkDir(PathBuf),

  #[error("git clean failed: {0}")]
  Clean(#[source] ExecuteError),

  #[error("build procedure failed in {environment} environment: {source}")]
  Procedure {
    environment: &'static str,
    #[source]
    source: ExecuteError,
  },

  #[error("failed to materialize hook script '{hook}': {source}")]
  Hook {
    hook: String,
    #[source]
    source: io::Error,
  },

  #[error("packaging failed: {0}")]
  Packaging(#[source] ExecuteError),
}

/// One layer of build configuration.
///
/// Every field is optional so a layer can leave anything to the layers below
/// it. Lists use `Option<Vec<_>>`: an absent list defers, an explicitly empty
/// list (`options: []`) replaces whatever a lower layer had.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFile {
  #[serde(default)]
  pub build: BuildInfo,
  /// Pattern passed to `git clean` before building.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub clean: Option<String>,
  /// Extra packaging-tool arguments.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fpm: Option<Vec<String>>,
  /// Named hook scripts (`after-install`, `before-remove`, ...). An empty or
  /// null value removes a hook defined by a lower layer.
  #[serde(default, rename = "fpm-hooks", skip_serializing_if = "BTreeMap::is_empty")]
  pub fpm_hooks: BTreeMap<String, Option<String>>,
  #[serde(default, rename = "env")]
  pub environment: EnvironmentConfig,
}

/// Shell fragments and interpreter settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub prepare: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub build: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fpmgen: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub install: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub shell: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub arguments: Option<Vec<String>>,
}

/// Execution environment selection. No `docker` section means the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub docker: Option<DockerConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
  /// Inline image definition, built and tagged by content hash.
  #[serde(default, rename = "Dockerfile", skip_serializing_if = "Option::is_none")]
  pub dockerfile: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub srcpath: Option<String>,
}

impl BuildFile {
  /// Parse a build file. An empty document is an empty layer.
  pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
    if content.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str::<Option<Self>>(content).map(Option::unwrap_or_default)
  }

  pub fn load(path: &Path) -> Result<Self, ComposeError> {
    let content = fs::read_to_string(path).map_err(|e| ComposeError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;
    Self::parse(&content).map_err(|e| ComposeError::Parse {
      path: path.to_path_buf(),
      source: e,
    })
  }

  /// Like [`BuildFile::load`], but a missing file is `None`.
  pub fn load_optional(path: &Path) -> Result<Option<Self>, ComposeError> {
    match Self::load(path) {
      Ok(file) => Ok(Some(file)),
      Err(ComposeError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e),
    }
  }
}
