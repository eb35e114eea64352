//! Shared test helpers for CLI integration tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Command with the `FPMBOT_*` environment cleared.
pub fn fpmbot_cmd() -> Command {
  let mut cmd = cargo_bin_cmd!("fpmbot");
  for var in [
    "FPMBOT_DATADIR",
    "FPMBOT_CONFIG",
    "FPMBOT_KEY",
    "FPMBOT_KEYFILE",
    "FPMBOT_ROOT",
    "FPMBOT_FPM",
    "FPMBOT_FPREPO_PREFIX",
    "FPMBOT_PRUNE",
  ] {
    cmd.env_remove(var);
  }
  cmd
}

pub fn git(dir: &Path, args: &[&str]) -> String {
  let output = std::process::Command::new("git")
    .args(["-c", "user.name=test", "-c", "user.email=test@example.com", "-c", "commit.gpgsign=false"])
    .args(args)
    .current_dir(dir)
    .output()
    .unwrap();
  assert!(
    output.status.success(),
    "git {:?} failed: {}",
    args,
    String::from_utf8_lossy(&output.stderr)
  );
  String::from_utf8(output.stdout).unwrap().trim().to_string()
}

pub fn write_script(path: &Path, body: &str) {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
  fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Isolated test environment with fake packaging and metadata tools.
///
/// The fake packaging tool records its arguments in `fpm-args` (in the build
/// directory) and writes `pkg.deb` into its `-p` directory.
pub struct TestEnv {
  pub temp: TempDir,
  pub root: PathBuf,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();

    write_script(
      &root.join("bin/fpm"),
      r#"echo "$@" > "$PWD/fpm-args"
while [ $# -gt 0 ]; do
  if [ "$1" = "-p" ]; then mkdir -p "$2"; echo "$FPMOPTS" > "$2/pkg.deb"; fi
  shift
done
"#,
    );
    write_script(&root.join("bin/fprepo-deb"), "ls > Packages\n");
    write_script(&root.join("bad-bin/fprepo-deb"), "echo broken metadata\nexit 4\n");

    Self { temp, root }
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.root.join(relative)
  }

  pub fn fpm(&self) -> String {
    self.path("bin/fpm").display().to_string()
  }

  pub fn fprepo_prefix(&self) -> String {
    format!("{}/fprepo-", self.path("bin").display())
  }

  pub fn failing_fprepo_prefix(&self) -> String {
    format!("{}/fprepo-", self.path("bad-bin").display())
  }

  /// Write a file relative to the environment root.
  pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
    let path = self.path(relative);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
  }

  /// Create a git repository at `relative` with one commit.
  pub fn upstream(&self, relative: &str) -> PathBuf {
    let dir = self.path(relative);
    fs::create_dir_all(&dir).unwrap();
    git(&dir, &["init", "-q"]);
    fs::write(dir.join("README"), "hello\n").unwrap();
    git(&dir, &["add", "-A"]);
    git(&dir, &["commit", "-q", "-m", "initial"]);
    dir
  }

  /// `fpmbot run` with the fake tools and pruning off.
  pub fn run_cmd(&self) -> Command {
    let mut cmd = fpmbot_cmd();
    cmd
      .arg("run")
      .arg("--fpm")
      .arg(self.fpm())
      .arg("--fprepo-prefix")
      .arg(self.fprepo_prefix())
      .arg("--prune")
      .arg("");
    cmd
  }
}
