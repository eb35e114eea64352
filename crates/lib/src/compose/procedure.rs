//! The build procedure as an ordered list of named stages.
//!
//! Stages always run in [`Stage::ORDER`] as one script body handed to a
//! single interpreter invocation, so state (working directory, variables)
//! carries from one stage to the next.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
  Prepare,
  Build,
  /// Generates packaging-tool input (`make .fpm`).
  Generate,
  Install,
}

impl Stage {
  pub const ORDER: [Stage; 4] = [Stage::Prepare, Stage::Build, Stage::Generate, Stage::Install];

  pub fn name(&self) -> &'static str {
    match self {
      Stage::Prepare => "prepare",
      Stage::Build => "build",
      Stage::Generate => "fpmgen",
      Stage::Install => "install",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
  /// Stage bodies in execution order. An empty body is a no-op line.
  pub stages: Vec<(Stage, String)>,
  pub shell: String,
  /// Interpreter flags placed before the script (`-c -xe`).
  pub options: Vec<String>,
  /// Positional arguments placed after the script.
  pub arguments: Vec<String>,
}

impl Procedure {
  /// Script body: a leading newline, then each stage followed by a newline.
  pub fn script(&self) -> String {
    let mut script = String::from("\n");
    for (_, body) in &self.stages {
      script.push_str(body);
      script.push('\n');
    }
    script
  }

  /// `[shell, options..., script, arguments...]`
  pub fn command_line(&self) -> Vec<String> {
    let mut argv = Vec::with_capacity(2 + self.options.len() + self.arguments.len());
    argv.push(self.shell.clone());
    argv.extend(self.options.iter().cloned());
    argv.push(self.script());
    argv.extend(self.arguments.iter().cloned());
    argv
  }

  pub fn stage(&self, stage: Stage) -> Option<&str> {
    self.stages.iter().find(|(s, _)| *s == stage).map(|(_, body)| body.as_str())
  }
}
