//! Host execution: the build command runs as a direct child process.

use std::path::Path;

use tracing::debug;

use crate::execute::process;
use crate::execute::types::ExecuteError;

/// Runs commands directly on the host, inheriting stdout and stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostEnvironment;

impl HostEnvironment {
  pub async fn execute(&self, command: &[String], cwd: &Path) -> Result<(), ExecuteError> {
    let (program, args) = command.split_first().ok_or(ExecuteError::EmptyCommand)?;
    debug!(cwd = %cwd.display(), "executing on host");
    process::run(program, args, Some(cwd)).await
  }
}
