//! Packaging-tool invocation.
//!
//! Hook scripts from the build plan are written to executable temp files for
//! the duration of the call and passed as `--<hook> <file>`.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use crate::compose::types::ComposeError;
use crate::execute::process;

/// Everything the packaging tool needs besides the hook files.
#[derive(Debug, Clone)]
pub struct PackagingRequest<'a> {
  pub tool: &'a str,
  pub target: &'a str,
  pub output: &'a Path,
  /// Overwrite an existing package (`-f`).
  pub force: bool,
  pub hooks: &'a BTreeMap<String, String>,
  pub extra_args: &'a [String],
  /// Value of `FPMOPTS` in the tool's environment.
  pub options: &'a str,
}

/// `-t <target> -p <output> [-f] [--<hook> <file>]... <extra args>`
pub fn packaging_args(request: &PackagingRequest<'_>, hook_files: &[(String, String)]) -> Vec<String> {
  let mut args = vec![
    "-t".to_string(),
    request.target.to_string(),
    "-p".to_string(),
    request.output.display().to_string(),
  ];
  if request.force {
    args.push("-f".to_string());
  }
  for (hook, file) in hook_files {
    args.push(format!("--{}", hook));
    args.push(file.clone());
  }
  args.extend(request.extra_args.iter().cloned());
  args
}

fn materialize_hook(name: &str, script: &str) -> Result<NamedTempFile, ComposeError> {
  let hook_err = |source| ComposeError::Hook {
    hook: name.to_string(),
    source,
  };

  let mut file = tempfile::Builder::new().prefix(name).tempfile().map_err(hook_err)?;
  file.write_all(script.as_bytes()).map_err(hook_err)?;
  file.flush().map_err(hook_err)?;

  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o755)).map_err(hook_err)?;
  }

  Ok(file)
}

/// Run the packaging tool in `cwd`. Hook files are removed afterwards,
/// whether or not the tool succeeded.
pub async fn run_packaging(request: &PackagingRequest<'_>, cwd: &Path) -> Result<(), ComposeError> {
  let mut hook_files = Vec::with_capacity(request.hooks.len());
  let mut paths = Vec::with_capacity(request.hooks.len());
  for (name, script) in request.hooks {
    info!(hook = %name, "{}", script.replace('\n', "\n  "));
    let file = materialize_hook(name, script)?;
    paths.push((name.clone(), file.path().display().to_string()));
    hook_files.push(file);
  }

  let args = packaging_args(request, &paths);
  info!(opts = %request.options, "packaging");
  let result = process::run_with_env(request.tool, &args, Some(cwd), &[("FPMOPTS", request.options)])
    .await
    .map_err(ComposeError::Packaging);

  drop(hook_files);
  result
}
