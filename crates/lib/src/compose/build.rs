use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::compose::merge::{BuildPlan, compose};
use crate::compose::package::{PackagingRequest, run_packaging};
use crate::compose::types::{BuildFile, ComposeError};
use crate::compose::version::packaging_options;
use crate::consts::SOURCE_BUILD_FILE;
use crate::execute::{Environment, process};
use crate::tools::Tools;

/// Inputs for one package build. Every path is explicit; nothing depends on
/// the process working directory.
#[derive(Debug, Clone)]
pub struct BuildOptions {
  /// Directory the procedure runs in (the source checkout or its subdirectory).
  pub work_dir: PathBuf,
  /// Most specific build file layer, above the source's own build file.
  pub config: Option<PathBuf>,
  pub target: String,
  /// Packaging-tool output; relative paths are taken from `work_dir`.
  pub output: PathBuf,
  pub force: bool,
  /// Prefix container runtime calls with `sudo`.
  pub sudo: bool,
  pub tools: Tools,
}

impl BuildOptions {
  pub fn new(work_dir: impl Into<PathBuf>, target: impl Into<String>) -> Self {
    Self {
      work_dir: work_dir.into(),
      config: None,
      target: target.into(),
      output: PathBuf::from("."),
      force: true,
      sudo: false,
      tools: Tools::default(),
    }
  }
}

/// Load the configuration layers for a build in `work_dir`.
pub fn load_plan(config: Option<&Path>, work_dir: &Path) -> Result<BuildPlan, ComposeError> {
  let mut layers = Vec::with_capacity(2);

  if let Some(path) = config {
    match BuildFile::load_optional(path)? {
      Some(file) => layers.push(file),
      None => warn!(path = %path.display(), "build config not found, ignoring"),
    }
  }
  if let Some(file) = BuildFile::load_optional(&work_dir.join(SOURCE_BUILD_FILE))? {
    layers.push(file);
  }

  Ok(compose(&layers))
}

/// Compose and run the build procedure, then the packaging tool.
pub async fn build_package(options: &BuildOptions) -> Result<(), ComposeError> {
  let work_dir = &options.work_dir;
  if !work_dir.is_dir() {
    return Err(ComposeError::MissingWorkDir(work_dir.clone()));
  }

  let plan = load_plan(options.config.as_deref(), work_dir)?;

  if let Some(pattern) = &plan.clean {
    process::run("git", &["clean".to_string(), pattern.clone()], Some(work_dir))
      .await
      .map_err(ComposeError::Clean)?;
  }

  let environment = Environment::select(&plan.environment, options.sudo);
  info!(environment = environment.name(), dir = %work_dir.display(), "running build procedure");
  environment
    .execute(&plan.procedure.command_line(), work_dir)
    .await
    .map_err(|source| ComposeError::Procedure {
      environment: environment.name(),
      source,
    })?;

  let fpm_options = packaging_options(work_dir).await;
  let request = PackagingRequest {
    tool: &options.tools.packaging,
    target: &options.target,
    output: &options.output,
    force: options.force,
    hooks: &plan.hooks,
    extra_args: &plan.fpm_args,
    options: &fpm_options,
  };
  run_packaging(&request, work_dir).await
}
