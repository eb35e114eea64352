//! External programs the pipeline shells out to.
//!
//! The packaging tool, the metadata regenerator and the pruning tool are all
//! opaque collaborators. Their names are configurable so a deployment (or a
//! test) can substitute wrappers.

use std::env;

use crate::consts::{
  DEFAULT_METADATA_TOOL_PREFIX, DEFAULT_PACKAGING_TOOL, DEFAULT_PRUNE_TOOL, ENV_METADATA_TOOL_PREFIX,
  ENV_PACKAGING_TOOL, ENV_PRUNE_TOOL,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
  /// Turns an install tree into a package archive.
  pub packaging: String,
  /// Prefix of the metadata regenerator; the target format is appended (`fprepo-deb`).
  pub metadata_prefix: String,
  /// Removes superseded generations. `None` disables pruning.
  pub prune: Option<String>,
}

impl Default for Tools {
  fn default() -> Self {
    Self {
      packaging: DEFAULT_PACKAGING_TOOL.to_string(),
      metadata_prefix: DEFAULT_METADATA_TOOL_PREFIX.to_string(),
      prune: Some(DEFAULT_PRUNE_TOOL.to_string()),
    }
  }
}

impl Tools {
  /// Defaults, overridden by `FPMBOT_FPM`, `FPMBOT_FPREPO_PREFIX` and
  /// `FPMBOT_PRUNE` when set. An empty `FPMBOT_PRUNE` turns pruning off.
  pub fn from_env() -> Self {
    let mut tools = Self::default();
    if let Ok(packaging) = env::var(ENV_PACKAGING_TOOL)
      && !packaging.is_empty()
    {
      tools.packaging = packaging;
    }
    if let Ok(prefix) = env::var(ENV_METADATA_TOOL_PREFIX)
      && !prefix.is_empty()
    {
      tools.metadata_prefix = prefix;
    }
    if let Ok(prune) = env::var(ENV_PRUNE_TOOL) {
      tools.prune = (!prune.is_empty()).then_some(prune);
    }
    tools
  }

  /// Program regenerating repository metadata for `target`.
  pub fn metadata_tool(&self, target: &str) -> String {
    format!("{}{}", self.metadata_prefix, target)
  }
}
