//! Incremental build of one repository into a new generation.
//!
//! Packages are processed one at a time in declaration order:
//!
//! ```text
//! FETCH -> DECIDE -> REUSE (hard links from the previous generation)
//!                 \-> BUILD (compose + execute + package)
//!       -> LEDGER (record the revision)
//! ```
//!
//! A failing package is counted and skipped; the others still land in the
//! generation. A package directory only survives in a generation when its
//! package succeeded, so the next run never reuses a partial one. Once every
//! package was attempted the generation is finalized (metadata, pointer swap,
//! pruning). A failure there leaves the previous generation live.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::compose::{BuildOptions, build_package};
use crate::error::{Error, Result};
use crate::ledger::{Freshness, RevisionLedger};
use crate::publish::{finalize_generation, read_pointer};
use crate::repo::{GenerationClock, PackageEntry, PackageSource, RepoLayout, RepoPaths, Repository, write_descriptor};
use crate::source::{fetch_git, rev_parse_head};
use crate::tools::Tools;
use crate::util::link::link_tree;

/// Settings shared by every repository of one invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
  /// Overrides the repository document's target.
  pub target: Option<String>,
  /// Prefix container runtime calls with `sudo`.
  pub sudo: bool,
  /// Namespace for all derived paths.
  pub data_root: Option<PathBuf>,
  pub tools: Tools,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
  /// Freshly built; `revision` is `None` for unversioned sources.
  Built { revision: Option<String> },
  /// Linked from the previous generation.
  Reused { revision: String },
  Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
  pub name: String,
  pub outcome: PackageOutcome,
}

#[derive(Debug, Clone)]
pub struct RunReport {
  pub generation: PathBuf,
  pub packages: Vec<PackageReport>,
  /// Failed packages plus one for a failed finalize step.
  pub errors: usize,
  pub published: bool,
}

/// State for one repository run.
struct Run<'a> {
  layout: RepoLayout,
  generation: PathBuf,
  previous: Option<PathBuf>,
  ledger: RevisionLedger,
  options: &'a RunOptions,
}

fn create_dir(path: &Path) -> Result<()> {
  fs::create_dir_all(path).map_err(|source| Error::CreateDir {
    path: path.to_path_buf(),
    source,
  })
}

/// Create a fresh generation directory, skipping stamps that are already
/// taken on disk (by another process or an earlier run in the same second).
fn create_generation(layout: &RepoLayout, clock: &mut GenerationClock) -> Result<PathBuf> {
  loop {
    let generation = layout.generation_dir(&clock.stamp());
    match fs::create_dir(&generation) {
      Ok(()) => return Ok(generation),
      Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
        debug!(generation = %generation.display(), "generation already exists, taking the next stamp");
      }
      Err(source) => {
        return Err(Error::CreateDir {
          path: generation,
          source,
        });
      }
    }
  }
}

impl Run<'_> {
  /// Drop whatever a failed package left in the generation.
  fn discard(&self, name: &str) {
    let package_dir = self.generation.join(name);
    match fs::remove_dir_all(&package_dir) {
      Ok(()) => debug!(package = name, "removed partial package output"),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(e) => {
        warn!(package = name, path = %package_dir.display(), error = %e, "failed to remove partial package output")
      }
    }
  }

  async fn package(&self, entry: &PackageEntry) -> Result<PackageOutcome> {
    let name = entry.name.as_str();
    let source_dir = self.layout.package_source_dir(name);
    let descriptor = self.layout.package_descriptor(name);
    let package_dir = self.generation.join(name);

    if let Some(inline) = &entry.inline {
      write_descriptor(&descriptor, name, inline)?;
    }
    let source = PackageSource::load(&descriptor)?;
    create_dir(&source_dir)?;

    let git = source.git();
    let resolved = match &git {
      Some(git) => Some(fetch_git(&source_dir, git).await?),
      None => None,
    };

    let previous = self.previous.as_ref().map(|prev| prev.join(name));
    let has_previous = previous.as_ref().is_some_and(|prev| prev.is_dir());

    create_dir(&package_dir)?;
    let reused = match (self.ledger.freshness(name, resolved.as_deref(), has_previous), previous) {
      (Freshness::Clean, Some(previous)) => {
        info!(package = name, from = %previous.display(), "not rebuilding, linking previous artifacts");
        link_tree(&previous, &package_dir)?;
        true
      }
      _ => {
        let work_dir = match git.as_ref().and_then(|g| g.subdir.as_deref()) {
          Some(subdir) => source_dir.join(subdir),
          None => source_dir.clone(),
        };
        let build = BuildOptions {
          work_dir,
          config: Some(descriptor.clone()),
          target: self.layout.target().to_string(),
          output: package_dir.clone(),
          force: true,
          sudo: self.options.sudo,
          tools: self.options.tools.clone(),
        };
        build_package(&build).await?;
        false
      }
    };

    if resolved.is_none() {
      info!(package = name, "build successful");
      return Ok(PackageOutcome::Built { revision: None });
    }

    let revision = rev_parse_head(&source_dir).await?;
    self.ledger.write(name, &revision)?;
    info!(package = name, rev = %revision, "build successful at revision");

    if reused {
      Ok(PackageOutcome::Reused { revision })
    } else {
      Ok(PackageOutcome::Built {
        revision: Some(revision),
      })
    }
  }
}

/// Build and publish the repository named by `argument`.
///
/// `Err` means the repository could not be started at all (unreadable
/// document, unknown target, unreadable pointer). Per-package failures and
/// finalize failures are reported through [`RunReport::errors`].
pub async fn run_repository(argument: &Path, options: &RunOptions, clock: &mut GenerationClock) -> Result<RunReport> {
  let paths = RepoPaths::resolve(argument, options.data_root.as_deref())?;
  let repository = Repository::load(&paths.document)?;
  let target = repository.effective_target(options.target.as_deref())?;

  let repo_dir = std::path::absolute(&paths.repo_dir).map_err(|source| Error::ResolvePath {
    path: paths.repo_dir.clone(),
    source,
  })?;
  let layout = RepoLayout::new(repo_dir, target);

  let previous = read_pointer(&layout.pointer())?;
  match &previous {
    Some(prev) => info!(previous = %prev.display(), "previous build found"),
    None => info!("first build"),
  }

  create_dir(&layout.source_dir())?;
  let generation = create_generation(&layout, clock)?;
  info!(
    sources = %layout.source_dir().display(),
    generation = %generation.display(),
    "building repository"
  );

  let run = Run {
    ledger: RevisionLedger::new(layout.source_dir()),
    layout,
    generation,
    previous,
    options,
  };

  let mut packages = Vec::with_capacity(repository.packages.len());
  let mut errors = 0;
  for entry in &repository.packages {
    info!(package = %entry.name, "processing package");
    let outcome = match run.package(entry).await {
      Ok(outcome) => outcome,
      Err(e) => {
        error!(package = %entry.name, error = %e, "package failed");
        run.discard(&entry.name);
        errors += 1;
        PackageOutcome::Failed { error: e.to_string() }
      }
    };
    packages.push(PackageReport {
      name: entry.name.clone(),
      outcome,
    });
  }

  let published = match finalize_generation(&run.layout, &run.generation, &options.tools).await {
    Ok(()) => true,
    Err(e) => {
      error!(error = %e, "generation not published");
      errors += 1;
      false
    }
  };

  Ok(RunReport {
    generation: run.generation,
    packages,
    errors,
    published,
  })
}
