//! Finalizing a generation: metadata, cutover, pruning.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::execute::process;
use crate::publish::pointer::switch_pointer;
use crate::publish::types::PublishError;
use crate::repo::RepoLayout;
use crate::tools::Tools;

/// Run the metadata regenerator for `target` inside `generation_dir`.
pub async fn regenerate_metadata(
  tools: &Tools,
  target: &str,
  generation_dir: &Path,
  repo_base: &str,
) -> Result<(), PublishError> {
  let tool = tools.metadata_tool(target);
  process::run(&tool, &[repo_base.to_string()], Some(generation_dir))
    .await
    .map_err(|source| PublishError::Metadata { tool, source })
}

/// Remove superseded generations behind `pointer`. Failures are only logged.
pub async fn prune(tools: &Tools, pointer: &Path) {
  let Some(tool) = tools.prune.as_deref() else {
    return;
  };
  let args = vec!["-f".to_string(), pointer.display().to_string()];
  if let Err(e) = process::run(tool, &args, None).await {
    warn!(error = %e, "pruning old generations failed");
  }
}

/// Make `generation_dir` the live generation of `layout`.
///
/// Metadata is regenerated first; if that fails the pointer is left alone.
pub async fn finalize_generation(layout: &RepoLayout, generation_dir: &Path, tools: &Tools) -> Result<(), PublishError> {
  info!(generation = %generation_dir.display(), "generating metadata");
  regenerate_metadata(tools, layout.target(), generation_dir, &layout.base_name()).await?;

  let name = generation_dir
    .file_name()
    .map(PathBuf::from)
    .unwrap_or_else(|| generation_dir.to_path_buf());
  let pointer = layout.pointer();
  switch_pointer(&pointer, &name)?;

  prune(tools, &pointer).await;
  Ok(())
}
