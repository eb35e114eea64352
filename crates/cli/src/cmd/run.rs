//! Implementation of the `fpmbot run` command.
//!
//! Builds each repository in turn into a fresh generation and publishes it.
//! The returned count feeds the process exit status.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::error;

use fpmbot_lib::orchestrate::{PackageOutcome, RunOptions, RunReport, run_repository};
use fpmbot_lib::repo::GenerationClock;
use fpmbot_lib::tools::Tools;

use crate::output::{
  OutputFormat, PackageStatus, format_duration, print_error, print_json, print_package, print_stat, print_success,
  print_warning, truncate_hash,
};

pub struct RunArgs {
  pub repos: Vec<PathBuf>,
  pub target: Option<String>,
  pub sudo: bool,
  pub datadir: Option<PathBuf>,
  pub fpm: Option<String>,
  pub fprepo_prefix: Option<String>,
  pub prune: Option<String>,
  pub output: OutputFormat,
}

impl RunArgs {
  fn tools(&self) -> Tools {
    let mut tools = Tools::from_env();
    if let Some(fpm) = &self.fpm {
      tools.packaging = fpm.clone();
    }
    if let Some(prefix) = &self.fprepo_prefix {
      tools.metadata_prefix = prefix.clone();
    }
    if let Some(prune) = &self.prune {
      tools.prune = (!prune.is_empty()).then(|| prune.clone());
    }
    tools
  }
}

#[derive(Debug, Serialize)]
struct RepoSummary {
  repo: String,
  generation: Option<String>,
  published: bool,
  errors: usize,
  packages: Vec<PackageSummary>,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

#[derive(Debug, Serialize)]
struct PackageSummary {
  name: String,
  status: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  revision: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

impl PackageSummary {
  fn from_outcome(name: &str, outcome: &PackageOutcome) -> Self {
    let (status, revision, error) = match outcome {
      PackageOutcome::Built { revision } => ("built", revision.clone(), None),
      PackageOutcome::Reused { revision } => ("reused", Some(revision.clone()), None),
      PackageOutcome::Failed { error } => ("failed", None, Some(error.clone())),
    };
    Self {
      name: name.to_string(),
      status,
      revision,
      error,
    }
  }
}

impl RepoSummary {
  fn from_report(repo: &str, report: &RunReport) -> Self {
    Self {
      repo: repo.to_string(),
      generation: Some(report.generation.display().to_string()),
      published: report.published,
      errors: report.errors,
      packages: report
        .packages
        .iter()
        .map(|p| PackageSummary::from_outcome(&p.name, &p.outcome))
        .collect(),
      error: None,
    }
  }

  fn failed(repo: &str, error: String) -> Self {
    Self {
      repo: repo.to_string(),
      generation: None,
      published: false,
      errors: 1,
      packages: Vec::new(),
      error: Some(error),
    }
  }
}

fn print_summary(summary: &RepoSummary, started: Instant) {
  println!();
  if let Some(error) = &summary.error {
    print_error(&format!("{}: {}", summary.repo, error));
    return;
  }

  for package in &summary.packages {
    let (status, detail) = match package.status {
      "built" => (
        PackageStatus::Built,
        package.revision.as_deref().map(truncate_hash).unwrap_or("unversioned").to_string(),
      ),
      "reused" => (
        PackageStatus::Reused,
        package.revision.as_deref().map(truncate_hash).unwrap_or_default().to_string(),
      ),
      _ => (PackageStatus::Failed, package.error.clone().unwrap_or_default()),
    };
    print_package(status, &package.name, &detail);
  }

  if summary.published {
    print_success(&format!("{} published", summary.repo));
  } else {
    print_warning(&format!("{} not published, previous generation stays live", summary.repo));
  }
  if let Some(generation) = &summary.generation {
    print_stat("Generation", generation);
  }
  print_stat("Errors", &summary.errors.to_string());
  print_stat("Duration", &format_duration(started.elapsed()));
}

/// Execute the run command. Returns the total error count over all repositories.
pub fn cmd_run(args: RunArgs) -> Result<usize> {
  let options = RunOptions {
    target: args.target.clone(),
    sudo: args.sudo,
    data_root: args.datadir.clone(),
    tools: args.tools(),
  };

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let mut clock = GenerationClock::new();
  let mut summaries = Vec::with_capacity(args.repos.len());

  for repo in &args.repos {
    let name = repo.display().to_string();
    let started = Instant::now();
    let summary = match rt.block_on(run_repository(repo, &options, &mut clock)) {
      Ok(report) => RepoSummary::from_report(&name, &report),
      Err(e) => {
        error!(repo = %name, error = %e, "repository run failed");
        RepoSummary::failed(&name, e.to_string())
      }
    };
    if !args.output.is_json() {
      print_summary(&summary, started);
    }
    summaries.push(summary);
  }

  if args.output.is_json() {
    print_json(&summaries)?;
  }

  Ok(summaries.iter().map(|s| s.errors).sum())
}
