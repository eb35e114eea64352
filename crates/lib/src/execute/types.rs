//! Error type for subprocess execution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while running an external program.
///
/// Non-zero exits are surfaced verbatim to the caller; nothing at this layer
/// retries.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The command line had no program.
  #[error("empty command line")]
  EmptyCommand,

  /// The program could not be started at all.
  #[error("failed to spawn '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The program ran and exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  CmdFailed { cmd: String, code: Option<i32> },

  /// The working directory handed to the program is unusable.
  #[error("invalid working directory '{}': {source}", path.display())]
  WorkingDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// I/O error while feeding or collecting process streams.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl ExecuteError {
  /// Exit code of a program that ran to completion, if any.
  pub fn exit_code(&self) -> Option<i32> {
    match self {
      ExecuteError::CmdFailed { code, .. } => *code,
      _ => None,
    }
  }
}
