//! `fpmbot run` end to end: fetch, build, reuse and publish.

use std::fs;

use predicates::prelude::*;
use serde_json::Value;

use crate::common::{TestEnv, fpmbot_cmd, git, write_script};

fn repo_document(env: &TestEnv, packages: &[(&str, &str)]) -> String {
  let mut doc = String::from("target: deb\npackages:\n");
  for (name, upstream) in packages {
    doc.push_str(&format!(
      "  {name}:\n    git: '{}'\n    build:\n      build: \"echo {name} >> '{}'\"\n",
      env.path(upstream).display(),
      env.path("build.log").display()
    ));
  }
  doc
}

fn json_run(env: &TestEnv, args: &[&str]) -> (Value, i32) {
  let output = env.run_cmd().args(["--output", "json"]).args(args).output().unwrap();
  let value = serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
    panic!(
      "invalid JSON ({e}): {}\nstderr: {}",
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    )
  });
  (value, output.status.code().unwrap())
}

#[test]
fn first_run_publishes_and_second_run_reuses() {
  let env = TestEnv::new();
  let upstream = env.upstream("upstream");
  let document = env.write_file("data/myrepo.yaml", &repo_document(&env, &[("foo", "upstream")]));
  let document = document.to_str().unwrap();

  env
    .run_cmd()
    .arg(document)
    .assert()
    .success()
    .stdout(predicate::str::contains("myrepo.yaml published"));

  let pointer = env.path("data/myrepo.deb");
  let first = fs::read_link(&pointer).unwrap();
  assert!(pointer.join("foo/pkg.deb").is_file());
  assert!(pointer.join("Packages").is_file());

  let (summary, code) = json_run(&env, &[document]);
  assert_eq!(code, 0);
  let repo = &summary[0];
  assert_eq!(repo["published"], true);
  assert_eq!(repo["errors"], 0);
  assert_eq!(repo["packages"][0]["name"], "foo");
  assert_eq!(repo["packages"][0]["status"], "reused");
  assert_eq!(repo["packages"][0]["revision"], git(&upstream, &["rev-parse", "HEAD"]));

  assert_ne!(fs::read_link(&pointer).unwrap(), first);
  let log = fs::read_to_string(env.path("build.log")).unwrap();
  assert_eq!(log.lines().count(), 1);
}

#[test]
fn failed_packages_set_the_exit_code() {
  let env = TestEnv::new();
  env.upstream("upstream");
  let document = env.write_file(
    "data/myrepo.yaml",
    &repo_document(&env, &[("broken", "nowhere"), ("foo", "upstream")]),
  );

  let (summary, code) = json_run(&env, &[document.to_str().unwrap()]);
  assert_eq!(code, 1);
  let repo = &summary[0];
  assert_eq!(repo["errors"], 1);
  assert_eq!(repo["published"], true);
  assert_eq!(repo["packages"][0]["status"], "failed");
  assert_eq!(repo["packages"][1]["status"], "built");
  assert!(env.path("data/myrepo.deb/foo/pkg.deb").is_file());
}

#[test]
fn target_flag_overrides_document() {
  let env = TestEnv::new();
  env.upstream("upstream");
  write_script(&env.path("bin/fprepo-rpm"), "ls > repodata\n");
  let document = env.write_file("data/myrepo.yaml", &repo_document(&env, &[("foo", "upstream")]));

  env.run_cmd().arg("-t").arg("rpm").arg(&document).assert().success();

  assert!(env.path("data/myrepo.rpm/repodata").is_file());
  assert!(!env.path("data/myrepo.deb").exists());
  let args = fs::read_to_string(env.path("data/myrepo.src/foo/fpm-args")).unwrap();
  assert!(args.starts_with("-t rpm -p "));
}

#[test]
fn datadir_namespaces_every_derived_path() {
  let env = TestEnv::new();
  env.upstream("upstream");
  let document = env.write_file("docs/myrepo.yaml", &repo_document(&env, &[("foo", "upstream")]));

  env
    .run_cmd()
    .arg("--datadir")
    .arg(env.path("data"))
    .arg(&document)
    .assert()
    .success();

  assert!(env.path("data/myrepo.deb").is_symlink());
  assert!(env.path("data/myrepo.src/foo.ok").is_file());
  assert!(!env.path("docs/myrepo.deb").exists());
}

#[test]
fn metadata_failure_is_an_error_and_keeps_pointer() {
  let env = TestEnv::new();
  env.upstream("upstream");
  let document = env.write_file("data/myrepo.yaml", &repo_document(&env, &[("foo", "upstream")]));

  env.run_cmd().arg(&document).assert().success();
  let live = fs::read_link(env.path("data/myrepo.deb")).unwrap();

  fpmbot_cmd()
    .arg("run")
    .arg("--fpm")
    .arg(env.fpm())
    .arg("--fprepo-prefix")
    .arg(env.failing_fprepo_prefix())
    .arg("--prune")
    .arg("")
    .arg(&document)
    .assert()
    .code(1)
    .stderr(predicate::str::contains("not published"));

  assert_eq!(fs::read_link(env.path("data/myrepo.deb")).unwrap(), live);
}
