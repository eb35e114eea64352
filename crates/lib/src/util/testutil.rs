//! Test utilities for fpmbot-lib.
//!
//! Helpers for tests that need real git repositories or stand-in executables
//! for the external tools. Everything runs synchronously through
//! `std::process` so it can be used from plain `#[test]` functions too.

use std::fs;
use std::path::Path;
use std::process::Command;

/// Run git in `dir` with a fixed identity, panicking on failure. Returns stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
  let output = Command::new("git")
    .args(["-c", "user.name=fpmbot", "-c", "user.email=fpmbot@example.invalid", "-c", "commit.gpgsign=false"])
    .args(args)
    .current_dir(dir)
    .output()
    .expect("failed to spawn git");
  assert!(
    output.status.success(),
    "git {:?} failed: {}",
    args,
    String::from_utf8_lossy(&output.stderr)
  );
  String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Create `dir` and initialize an empty repository in it.
pub fn init_repo(dir: &Path) {
  fs::create_dir_all(dir).unwrap();
  git(dir, &["init", "-q"]);
}

/// Stage everything and commit; returns the new HEAD revision.
pub fn commit_all(dir: &Path, message: &str) -> String {
  git(dir, &["add", "-A"]);
  git(dir, &["commit", "-q", "-m", message]);
  git(dir, &["rev-parse", "HEAD"]).trim().to_string()
}

/// Write an executable shell script at `path`.
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
  use std::os::unix::fs::PermissionsExt;

  fs::write(path, format!("#!/bin/sh\n{}", body)).unwrap();
  fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}
