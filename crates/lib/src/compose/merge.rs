//! Layered merge of build files.
//!
//! Layers are given most specific first. Field rules:
//!
//! - scalars: first non-empty value wins
//! - lists: first present value wins, so `[]` suppresses lower layers
//! - hooks: lower layers applied first, then higher ones; an empty value
//!   deletes the key
//! - environment: taken whole from the first layer that names one

use std::collections::BTreeMap;

use crate::compose::procedure::{Procedure, Stage};
use crate::compose::types::{BuildFile, BuildInfo, EnvironmentConfig};

/// The fully merged configuration for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
  pub procedure: Procedure,
  pub clean: Option<String>,
  pub fpm_args: Vec<String>,
  /// Only non-empty hooks survive the merge.
  pub hooks: BTreeMap<String, String>,
  pub environment: EnvironmentConfig,
}

fn scalar(high: &Option<String>, low: &Option<String>) -> Option<String> {
  high
    .as_ref()
    .filter(|s| !s.is_empty())
    .or(low.as_ref())
    .cloned()
}

fn list(high: &Option<Vec<String>>, low: &Option<Vec<String>>) -> Option<Vec<String>> {
  high.as_ref().or(low.as_ref()).cloned()
}

impl BuildFile {
  /// Built-in bottom layer: drive a Makefile if there is one.
  pub fn defaults() -> Self {
    Self {
      build: BuildInfo {
        prepare: Some(String::new()),
        build: Some(r#"if [ -e Makefile ]; then make DESTDIR="$PWD/fpmroot"; fi"#.to_string()),
        fpmgen: Some(r#"if [ -e Makefile ]; then make DESTDIR="$PWD/fpmroot" .fpm || true; fi"#.to_string()),
        install: Some(
          r#"if [ -e Makefile ]; then rm -rf fpmroot; make DESTDIR="$PWD/fpmroot" install; fi"#.to_string(),
        ),
        shell: Some("sh".to_string()),
        options: Some(vec!["-c".to_string(), "-xe".to_string()]),
        arguments: Some(Vec::new()),
      },
      ..Default::default()
    }
  }

  /// Merge `self` over `lower`; `self` is the more specific layer.
  pub fn over(&self, lower: &BuildFile) -> BuildFile {
    let mut fpm_hooks = BTreeMap::new();
    for layer in [lower, self] {
      for (name, script) in &layer.fpm_hooks {
        match script.as_deref() {
          Some(script) if !script.is_empty() => {
            fpm_hooks.insert(name.clone(), Some(script.to_string()));
          }
          _ => {
            fpm_hooks.remove(name);
          }
        }
      }
    }

    let environment = if self.environment.docker.is_some() {
      self.environment.clone()
    } else {
      lower.environment.clone()
    };

    BuildFile {
      build: BuildInfo {
        prepare: scalar(&self.build.prepare, &lower.build.prepare),
        build: scalar(&self.build.build, &lower.build.build),
        fpmgen: scalar(&self.build.fpmgen, &lower.build.fpmgen),
        install: scalar(&self.build.install, &lower.build.install),
        shell: scalar(&self.build.shell, &lower.build.shell),
        options: list(&self.build.options, &lower.build.options),
        arguments: list(&self.build.arguments, &lower.build.arguments),
      },
      clean: scalar(&self.clean, &lower.clean),
      fpm: list(&self.fpm, &lower.fpm),
      fpm_hooks,
      environment,
    }
  }

  /// Resolve into a plan, filling anything still unset from the defaults.
  pub fn into_plan(self) -> BuildPlan {
    let file = self.over(&BuildFile::defaults());
    let info = file.build;
    let body = |stage: Stage| {
      match stage {
        Stage::Prepare => info.prepare.clone(),
        Stage::Build => info.build.clone(),
        Stage::Generate => info.fpmgen.clone(),
        Stage::Install => info.install.clone(),
      }
      .unwrap_or_default()
    };

    BuildPlan {
      procedure: Procedure {
        stages: Stage::ORDER.iter().map(|stage| (*stage, body(*stage))).collect(),
        shell: info.shell.clone().unwrap_or_default(),
        options: info.options.clone().unwrap_or_default(),
        arguments: info.arguments.clone().unwrap_or_default(),
      },
      clean: file.clean.filter(|c| !c.is_empty()),
      fpm_args: file.fpm.unwrap_or_default(),
      hooks: file
        .fpm_hooks
        .into_iter()
        .filter_map(|(name, script)| script.map(|s| (name, s)))
        .collect(),
      environment: file.environment,
    }
  }
}

/// Merge layers given most specific first, then apply the defaults.
pub fn compose<'a>(layers: impl IntoIterator<Item = &'a BuildFile>) -> BuildPlan {
  let layers: Vec<&BuildFile> = layers.into_iter().collect();
  layers
    .into_iter()
    .rev()
    .fold(BuildFile::default(), |lower, layer| layer.over(&lower))
    .into_plan()
}
