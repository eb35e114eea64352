//! Containerized execution.
//!
//! The working directory is bind-mounted into an ephemeral, auto-removed
//! container and the command runs there as the invoking user's uid/gid, so
//! files produced by the build keep host ownership.
//!
//! When an inline image definition is configured, the image is built first
//! under a tag derived from the SHA-256 of the definition. Rebuilding an
//! identical definition is a cache hit inside the container runtime; nothing
//! is tracked here.

use std::path::Path;

use tracing::{debug, info};

use crate::compose::DockerConfig;
use crate::consts::{CONTAINER_RUNTIME, DEFAULT_CONTAINER_SRC_PATH, DEFAULT_IMAGE, IMAGE_TAG_PREFIX};
use crate::execute::process;
use crate::execute::types::ExecuteError;
use crate::util::hash::hash_bytes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEnvironment {
  /// Pre-built image name; ignored when `image_definition` is set.
  pub image: Option<String>,
  /// Inline image definition (Dockerfile contents).
  pub image_definition: Option<String>,
  /// Mount point of the working directory inside the container.
  pub src_path: Option<String>,
  /// Prefix both the image build and the run with `sudo`.
  pub sudo: bool,
}

impl ContainerEnvironment {
  pub fn from_config(config: &DockerConfig, sudo: bool) -> Self {
    Self {
      image: config.image.clone().filter(|s| !s.is_empty()),
      image_definition: config.dockerfile.clone().filter(|s| !s.is_empty()),
      src_path: config.srcpath.clone().filter(|s| !s.is_empty()),
      sudo,
    }
  }

  /// Tag under which the inline definition is built, if there is one.
  pub fn definition_tag(&self) -> Option<String> {
    self
      .image_definition
      .as_deref()
      .map(|definition| format!("{}:{}", IMAGE_TAG_PREFIX, hash_bytes(definition.as_bytes())))
  }

  /// Image the command will run in.
  pub fn effective_image(&self) -> String {
    self
      .definition_tag()
      .or_else(|| self.image.clone())
      .unwrap_or_else(|| DEFAULT_IMAGE.to_string())
  }

  pub fn effective_src_path(&self) -> &str {
    self.src_path.as_deref().unwrap_or(DEFAULT_CONTAINER_SRC_PATH)
  }

  fn wrap(&self, mut argv: Vec<String>) -> Vec<String> {
    if self.sudo {
      argv.insert(0, "sudo".to_string());
    }
    argv
  }

  /// `docker build -t <tag> -`, definition fed on stdin.
  pub fn build_image_argv(&self, tag: &str) -> Vec<String> {
    self.wrap(vec![
      CONTAINER_RUNTIME.to_string(),
      "build".to_string(),
      "-t".to_string(),
      tag.to_string(),
      "-".to_string(),
    ])
  }

  /// Full `docker run` command line for `command` with `cwd` mounted.
  pub fn run_argv(&self, cwd: &Path, uid: u32, gid: u32, command: &[String]) -> Vec<String> {
    let src_path = self.effective_src_path();
    let mut argv = self.wrap(vec![
      CONTAINER_RUNTIME.to_string(),
      "run".to_string(),
      "--rm".to_string(),
      "-v".to_string(),
      format!("{}:{}", cwd.display(), src_path),
      "-u".to_string(),
      format!("{}:{}", uid, gid),
      "-w".to_string(),
      src_path.to_string(),
      self.effective_image(),
    ]);
    argv.extend(command.iter().cloned());
    argv
  }

  pub async fn execute(&self, command: &[String], cwd: &Path) -> Result<(), ExecuteError> {
    if command.is_empty() {
      return Err(ExecuteError::EmptyCommand);
    }

    if let (Some(definition), Some(tag)) = (self.image_definition.as_deref(), self.definition_tag()) {
      info!(tag = %tag, "building container image");
      let argv = self.build_image_argv(&tag);
      process::run_with_stdin(&argv[0], &argv[1..], Some(cwd), definition.as_bytes()).await?;
    }

    let cwd = std::path::absolute(cwd).map_err(|source| ExecuteError::WorkingDir {
      path: cwd.to_path_buf(),
      source,
    })?;
    let (uid, gid) = current_ids();
    let argv = self.run_argv(&cwd, uid, gid, command);
    debug!(image = %self.effective_image(), "running in container");
    process::run(&argv[0], &argv[1..], Some(&cwd)).await
  }
}

#[cfg(unix)]
fn current_ids() -> (u32, u32) {
  (
    rustix::process::getuid().as_raw(),
    rustix::process::getgid().as_raw(),
  )
}

#[cfg(not(unix))]
fn current_ids() -> (u32, u32) {
  (0, 0)
}
