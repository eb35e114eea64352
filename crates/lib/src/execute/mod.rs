//! Execution environments for build procedures.
//!
//! A composed build procedure is an ordered argument list. It runs either on
//! the host or inside a throwaway container; the caller picks one with
//! [`Environment`] and never needs to know which.
//!
//! # Submodules
//!
//! - [`host`] - direct child process
//! - [`container`] - `docker run` with the working directory bind-mounted
//! - [`process`] - subprocess helpers shared by the whole crate

pub mod container;
pub mod host;
pub mod process;
mod types;

use std::path::Path;

pub use container::ContainerEnvironment;
pub use host::HostEnvironment;
pub use types::*;

use crate::compose::EnvironmentConfig;

/// Where a build command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
  Host(HostEnvironment),
  Container(ContainerEnvironment),
}

impl Environment {
  /// Select the environment from a composed configuration.
  ///
  /// `sudo` is threaded in explicitly and only matters for containers.
  pub fn select(config: &EnvironmentConfig, sudo: bool) -> Self {
    match &config.docker {
      Some(docker) => Environment::Container(ContainerEnvironment::from_config(docker, sudo)),
      None => Environment::Host(HostEnvironment),
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      Environment::Host(_) => "host",
      Environment::Container(_) => "container",
    }
  }

  /// Run `command` with `cwd` as the working directory (mounted into the
  /// container for the containerized variant).
  pub async fn execute(&self, command: &[String], cwd: &Path) -> Result<(), ExecuteError> {
    match self {
      Environment::Host(env) => env.execute(command, cwd).await,
      Environment::Container(env) => env.execute(command, cwd).await,
    }
  }
}
