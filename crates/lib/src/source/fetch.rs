//! Git working copy synchronization.
//!
//! Each package with a git source keeps a persistent working copy under
//! `<repo>.src/<name>`. Every run re-points `origin` at the descriptor's URL,
//! fetches all refs, and hard-resets the working tree to the requested ref.
//!
//! The reset is destructive: local modifications in the working copy are
//! discarded without warning.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::execute::{ExecuteError, process};
use crate::repo::GitSource;

/// Ref fetched by `git fetch ... HEAD`: the remote's default branch tip.
const FETCHED_HEAD: &str = "FETCH_HEAD";

/// Errors that can occur while synchronizing a working copy.
#[derive(Debug, Error)]
pub enum FetchError {
  /// Failed to create the working copy directory.
  #[error("failed to create source directory '{}': {source}", path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A git step failed. `step` names it for the log.
  #[error("{step} failed in '{}': {source}", path.display())]
  Git {
    step: &'static str,
    path: PathBuf,
    #[source]
    source: ExecuteError,
  },

  /// `git rev-parse HEAD` printed nothing usable.
  #[error("could not resolve HEAD in '{}'", .0.display())]
  EmptyRevision(PathBuf),
}

fn strings(parts: &[&str]) -> Vec<String> {
  parts.iter().map(|s| s.to_string()).collect()
}

async fn git_step(step: &'static str, dir: &Path, args: Vec<String>) -> Result<(), FetchError> {
  process::run("git", &args, Some(dir)).await.map_err(|source| FetchError::Git {
    step,
    path: dir.to_path_buf(),
    source,
  })
}

/// The ref to reset to: an explicit ref, unless it is absent or `HEAD`.
pub fn target_ref(source: &GitSource) -> &str {
  match source.reference.as_deref() {
    Some(reference) if !reference.is_empty() && reference != "HEAD" => reference,
    _ => FETCHED_HEAD,
  }
}

/// Full revision hash checked out in `dir`.
pub async fn rev_parse_head(dir: &Path) -> Result<String, FetchError> {
  let out = process::capture("git", &strings(&["rev-parse", "HEAD"]), Some(dir), &[])
    .await
    .map_err(|source| FetchError::Git {
      step: "git rev-parse",
      path: dir.to_path_buf(),
      source,
    })?;

  let revision = out.trim();
  if revision.is_empty() {
    return Err(FetchError::EmptyRevision(dir.to_path_buf()));
  }
  Ok(revision.to_string())
}

/// Bring the working copy at `dir` to the revision `source` asks for and
/// return that revision's full hash.
///
/// Any failing step aborts with an error; the caller decides what that means
/// for the package.
pub async fn fetch_git(dir: &Path, source: &GitSource) -> Result<String, FetchError> {
  fs::create_dir_all(dir).map_err(|e| FetchError::CreateDir {
    path: dir.to_path_buf(),
    source: e,
  })?;

  if !dir.join(".git").exists() {
    info!(path = %dir.display(), "initializing working copy");
    git_step("git init", dir, strings(&["init", "-q", "."])).await?;
  }

  git_step(
    "git config",
    dir,
    strings(&["config", "remote.origin.url", source.url.as_str()]),
  )
  .await?;

  git_step(
    "git fetch",
    dir,
    strings(&["-c", "core.bare=true", "fetch", "-f", "origin", "+refs/*:refs/*", "HEAD"]),
  )
  .await?;

  let reference = target_ref(source);
  debug!(url = %source.url, reference, "resetting working copy");
  git_step("git reset", dir, strings(&["reset", "-q", "--hard", reference, "--"])).await?;

  git_step(
    "git submodule update",
    dir,
    strings(&["submodule", "update", "--init", "--force", "--checkout", "--recursive"]),
  )
  .await?;

  let revision = rev_parse_head(dir).await?;
  info!(url = %source.url, rev = %revision, "source at revision");
  Ok(revision)
}
