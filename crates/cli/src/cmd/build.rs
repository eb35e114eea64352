//! Implementation of the `fpmbot build` command.
//!
//! Runs the composed build procedure in one source tree and packages the
//! result, without any repository bookkeeping.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use fpmbot_lib::compose::{BuildOptions, build_package};
use fpmbot_lib::tools::Tools;

use crate::output::print_success;

pub struct BuildArgs {
  pub dir: Option<PathBuf>,
  pub config: Option<PathBuf>,
  pub target: String,
  pub output: PathBuf,
  pub force: bool,
  pub sudo: bool,
  pub fpm: Option<String>,
}

impl BuildArgs {
  fn options(self) -> Result<BuildOptions> {
    let dir = self.dir.unwrap_or_else(|| PathBuf::from("."));
    let work_dir = dunce::canonicalize(&dir).with_context(|| format!("Cannot enter {}", dir.display()))?;

    let mut tools = Tools::from_env();
    if let Some(fpm) = self.fpm {
      tools.packaging = fpm;
    }

    Ok(BuildOptions {
      work_dir,
      config: self.config,
      target: self.target,
      output: self.output,
      force: self.force,
      sudo: self.sudo,
      tools,
    })
  }
}

/// Execute the build command.
pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let options = args.options()?;
  info!(dir = %options.work_dir.display(), target = %options.target, "building package");

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(build_package(&options)).context("Build failed")?;

  print_success(&format!("Packaged {}", options.work_dir.display()));
  Ok(())
}
