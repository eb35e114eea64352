//! `fpmbot build` in a plain source directory.

use std::fs;

use predicates::prelude::*;

use crate::common::{TestEnv, fpmbot_cmd, git};

fn build_file(env: &TestEnv) -> String {
  format!(
    "build:\n  build: echo compiled > out.txt\n  install: echo installed >> '{}'\nfpm: [--vendor, acme]\nfpm-hooks:\n  after-install: echo hi\n",
    env.path("install.log").display()
  )
}

#[test]
fn build_runs_procedure_then_packaging() {
  let env = TestEnv::new();
  env.write_file("src/.fpmbuild.yaml", &build_file(&env));

  fpmbot_cmd()
    .arg("build")
    .arg(env.path("src"))
    .arg("--fpm")
    .arg(env.fpm())
    .arg("-o")
    .arg("dist")
    .assert()
    .success()
    .stdout(predicate::str::contains("Packaged"));

  assert_eq!(fs::read_to_string(env.path("src/out.txt")).unwrap(), "compiled\n");
  assert_eq!(fs::read_to_string(env.path("install.log")).unwrap(), "installed\n");

  let args = fs::read_to_string(env.path("src/fpm-args")).unwrap();
  assert!(args.starts_with("-t deb -p dist -f --after-install "), "{args}");
  assert!(args.trim_end().ends_with("--vendor acme"), "{args}");

  let pkg = fs::read_to_string(env.path("src/dist/pkg.deb")).unwrap();
  assert!(pkg.contains("--name='src'"), "{pkg}");
}

#[test]
fn force_can_be_turned_off() {
  let env = TestEnv::new();
  env.write_file("src/.fpmbuild.yaml", "build:\n  build: 'true'\n");

  fpmbot_cmd()
    .arg("build")
    .arg(env.path("src"))
    .args(["--fpm", &env.fpm(), "-t", "rpm", "-f", "false"])
    .assert()
    .success();

  let args = fs::read_to_string(env.path("src/fpm-args")).unwrap();
  assert_eq!(args.trim_end(), "-t rpm -p .");
}

#[test]
fn config_layer_overrides_source_build_file() {
  let env = TestEnv::new();
  env.write_file("src/.fpmbuild.yaml", "build:\n  build: echo source > out.txt\n");
  let config = env.write_file("repo-config.yaml", "build:\n  build: echo config > out.txt\n");

  fpmbot_cmd()
    .arg("build")
    .arg(env.path("src"))
    .arg("--fpm")
    .arg(env.fpm())
    .arg("--config")
    .arg(&config)
    .assert()
    .success();

  assert_eq!(fs::read_to_string(env.path("src/out.txt")).unwrap(), "config\n");
}

#[test]
fn failing_procedure_fails_the_command() {
  let env = TestEnv::new();
  env.write_file("src/.fpmbuild.yaml", "build:\n  build: exit 7\n");

  fpmbot_cmd()
    .arg("build")
    .arg(env.path("src"))
    .arg("--fpm")
    .arg(env.fpm())
    .assert()
    .failure()
    .stderr(predicate::str::contains("Build failed"));

  assert!(!env.path("src/fpm-args").exists());
}

#[test]
fn tagged_checkout_is_versioned() {
  let env = TestEnv::new();
  let src = env.upstream("src");
  fs::write(src.join(".fpmbuild.yaml"), "build:\n  build: 'true'\n").unwrap();
  git(&src, &["add", "-A"]);
  git(&src, &["commit", "-q", "-m", "build file"]);
  git(&src, &["tag", "v1.2.3"]);

  fpmbot_cmd()
    .arg("build")
    .arg(&src)
    .args(["--fpm", &env.fpm(), "-o", "dist"])
    .assert()
    .success();

  let pkg = fs::read_to_string(src.join("dist/pkg.deb")).unwrap();
  assert!(pkg.contains("--version='1.2.3'"), "{pkg}");
}
