//! Package name and version handed to the packaging tool.
//!
//! The result is a string of shell-escaped options (`FPMOPTS`) that packaging
//! recipes splice into their tool invocation. The name is the build
//! directory's base name; the version comes from `git describe` when the
//! build directory is inside a git work tree.
//!
//! A dirty work tree is marked with a short hash of what the index would
//! contain after `git add -u`, computed through a private index file so the
//! real index is never touched.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::execute::process;
use crate::execute::ExecuteError;

const PRIVATE_INDEX: &str = "index-fpm-dirty";
const DIRTY_MARK: &str = ".dirty";

/// Quote `s` for a POSIX shell with single quotes.
pub fn shell_escape(s: &str) -> String {
  format!("'{}'", s.replace('\'', r#"'"'"'"#))
}

/// Turn `git describe` output into a version string.
///
/// Everything before the first digit is dropped, every other
/// non-alphanumeric character becomes `.`, and trailing dots are trimmed:
/// `v1.2-3-gabc\n` becomes `1.2.3.gabc`.
pub fn sanitize_describe(raw: &str) -> String {
  let mut version = String::with_capacity(raw.len());
  for c in raw.chars() {
    if version.is_empty() {
      if c.is_ascii_digit() {
        version.push(c);
      }
    } else if c.is_ascii_alphanumeric() {
      version.push(c);
    } else {
      version.push('.');
    }
  }
  version.trim_end_matches('.').to_string()
}

fn args(parts: &[&str]) -> Vec<String> {
  parts.iter().map(|s| s.to_string()).collect()
}

async fn private_index(dir: &Path) -> Result<PathBuf, ExecuteError> {
  let out = process::capture("git", &args(&["rev-parse", "--git-path", PRIVATE_INDEX]), Some(dir), &[]).await?;
  Ok(dir.join(out.trim()))
}

/// Short hash of the tree `git add -u` would stage.
async fn staged_tree_hash(dir: &Path) -> Result<String, ExecuteError> {
  let index = private_index(dir).await?;
  let _ = std::fs::remove_file(&index);

  let index_str = index.to_string_lossy().into_owned();
  let env = [("GIT_INDEX_FILE", index_str.as_str())];
  let result = async {
    process::run_with_env("git", &args(&["reset", "-q"]), Some(dir), &env).await?;
    process::run_with_env("git", &args(&["add", "-u"]), Some(dir), &env).await?;
    process::capture("git", &args(&["write-tree"]), Some(dir), &env).await
  }
  .await;

  let _ = std::fs::remove_file(&index);
  let tree = result?;
  Ok(tree.trim().chars().take(7).collect())
}

/// Suffix `git describe --dirty` appends to a modified work tree.
pub async fn dirty_mark(dir: &Path) -> String {
  match staged_tree_hash(dir).await {
    Ok(hash) if !hash.is_empty() => format!("{}.{}", DIRTY_MARK, hash),
    Ok(_) => DIRTY_MARK.to_string(),
    Err(e) => {
      warn!(error = %e, "could not hash work tree state");
      DIRTY_MARK.to_string()
    }
  }
}

/// Version of the checkout at `dir`, `None` outside a git work tree.
pub async fn describe_version(dir: &Path) -> Option<String> {
  if !process::probe("git", &args(&["rev-parse"]), Some(dir)).await {
    return None;
  }

  let dirty = format!("--dirty={}", dirty_mark(dir).await);
  if let Ok(out) = process::capture_quiet("git", &args(&["describe", &dirty]), Some(dir)).await {
    return Some(sanitize_describe(&out));
  }

  match process::capture("git", &args(&["describe", &dirty, "--always", "--tags"]), Some(dir), &[]).await {
    Ok(out) => Some(format!("0.{}", out.trim())),
    Err(e) => {
      warn!(error = %e, "could not describe revision");
      None
    }
  }
}

/// Options string (`FPMOPTS`) naming and versioning the package built in `dir`.
pub async fn packaging_options(dir: &Path) -> String {
  let mut opts = String::new();
  if let Some(base) = dir.file_name().map(|n| n.to_string_lossy()) {
    opts.push_str(" --name=");
    opts.push_str(&shell_escape(&base));
  }
  if let Some(version) = describe_version(dir).await {
    opts.push_str(" --version=");
    opts.push_str(&shell_escape(&version));
  }
  debug!(opts = %opts, "packaging options");
  opts
}
