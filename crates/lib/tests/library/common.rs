//! Shared helpers for repository run tests.
//!
//! Every test gets its own data root, an upstream git repository and fake
//! packaging and metadata tools that leave traces on disk.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use fpmbot_lib::tools::Tools;
use tempfile::TempDir;

pub fn git(dir: &Path, args: &[&str]) -> String {
  let output = Command::new("git")
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
  fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
  fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Isolated run environment.
pub struct TestEnv {
  pub temp: TempDir,
  pub root: PathBuf,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();
    for dir in ["bin", "bad-bin", "data", "upstream"] {
      fs::create_dir_all(root.join(dir)).unwrap();
    }

    write_script(
      &root.join("bin/fpm"),
      r#"while [ $# -gt 0 ]; do
  if [ "$1" = "-p" ]; then mkdir -p "$2"; echo "$FPMOPTS" > "$2/pkg.deb"; fi
  shift
done
"#,
    );
    write_script(
      &root.join("bin/fprepo-deb"),
      &format!("echo \"$1 $(pwd)\" >> '{}'\nls > Packages\n", root.join("metadata.log").display()),
    );
    write_script(&root.join("bad-bin/fprepo-deb"), "exit 3\n");

    let env = Self { temp, root };
    git(&env.upstream(), &["init", "-q"]);
    env.commit_upstream("README", "one\n");
    env
  }

  pub fn upstream(&self) -> PathBuf {
    self.root.join("upstream")
  }

  pub fn data(&self) -> PathBuf {
    self.root.join("data")
  }

  pub fn build_log(&self) -> PathBuf {
    self.root.join("build.log")
  }

  /// Tools with working fakes.
  pub fn tools(&self) -> Tools {
    Tools {
      packaging: self.root.join("bin/fpm").display().to_string(),
      metadata_prefix: format!("{}/fprepo-", self.root.join("bin").display()),
      prune: None,
    }
  }

  /// Tools whose metadata regenerator always fails.
  pub fn failing_metadata_tools(&self) -> Tools {
    Tools {
      metadata_prefix: format!("{}/fprepo-", self.root.join("bad-bin").display()),
      ..self.tools()
    }
  }

  /// Write `name` in the upstream repository and commit it. Returns the new revision.
  pub fn commit_upstream(&self, name: &str, content: &str) -> String {
    let upstream = self.upstream();
    fs::write(upstream.join(name), content).unwrap();
    git(&upstream, &["add", "-A"]);
    git(&upstream, &["commit", "-q", "-m", name]);
    git(&upstream, &["rev-parse", "HEAD"])
  }

  /// Build step that records the package name in the shared build log.
  pub fn logging_build(&self, package: &str) -> String {
    format!("echo {package} >> '{}'", self.build_log().display())
  }

  /// Write `<data>/<name>.yaml` and return its path.
  pub fn write_repo(&self, name: &str, document: &str) -> PathBuf {
    let path = self.data().join(format!("{name}.yaml"));
    fs::write(&path, document).unwrap();
    path
  }

  /// Number of times `package` was built.
  pub fn builds_of(&self, package: &str) -> usize {
    fs::read_to_string(self.build_log())
      .unwrap_or_default()
      .lines()
      .filter(|line| *line == package)
      .count()
  }
}
