use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::execute::ExecuteError;

#[derive(Debug, Error)]
pub enum PublishError {
  #[error("failed to read repository pointer '{}': {source}", path.display())]
  ReadPointer {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("metadata regeneration with '{tool}' failed: {source}")]
  Metadata {
    tool: String,
    #[source]
    source: ExecuteError,
  },

  #[error("failed to clear staging link '{}': {source}", path.display())]
  Stage {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to create link '{}' -> '{}': {source}", path.display(), target.display())]
  Link {
    path: PathBuf,
    target: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to rename '{}' over '{}': {source}", from.display(), to.display())]
  Swap {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },
}
