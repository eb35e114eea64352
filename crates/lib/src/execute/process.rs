//! Thin wrappers around `tokio::process::Command`.
//!
//! Every external step of the pipeline (git, container runtime, packaging
//! tool, metadata regenerator) goes through one of these helpers so that
//! logging and error context stay uniform.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::execute::types::ExecuteError;

/// Render a command line for logs and error messages.
pub fn display_command(program: &str, args: &[String]) -> String {
  let mut line = program.to_string();
  for arg in args {
    line.push(' ');
    line.push_str(arg);
  }
  line
}

fn command(program: &str, args: &[String], cwd: Option<&Path>, env: &[(&str, &str)]) -> Command {
  let mut command = Command::new(program);
  command.args(args);
  if let Some(dir) = cwd {
    command.current_dir(dir);
  }
  for (key, value) in env {
    command.env(key, value);
  }
  command
}

fn check(program: &str, args: &[String], status: std::process::ExitStatus) -> Result<(), ExecuteError> {
  if status.success() {
    Ok(())
  } else {
    Err(ExecuteError::CmdFailed {
      cmd: display_command(program, args),
      code: status.code(),
    })
  }
}

fn spawn_error(program: &str, source: std::io::Error) -> ExecuteError {
  ExecuteError::Spawn {
    program: program.to_string(),
    source,
  }
}

/// Run a program with inherited stdout/stderr and wait for it.
pub async fn run(program: &str, args: &[String], cwd: Option<&Path>) -> Result<(), ExecuteError> {
  run_with_env(program, args, cwd, &[]).await
}

/// Like [`run`], with extra environment variables on top of the inherited ones.
pub async fn run_with_env(
  program: &str,
  args: &[String],
  cwd: Option<&Path>,
  env: &[(&str, &str)],
) -> Result<(), ExecuteError> {
  info!("{}", display_command(program, args));
  let status = command(program, args, cwd, env)
    .status()
    .await
    .map_err(|e| spawn_error(program, e))?;
  check(program, args, status)
}

/// Run a program feeding `input` on stdin; output streams are inherited.
pub async fn run_with_stdin(program: &str, args: &[String], cwd: Option<&Path>, input: &[u8]) -> Result<(), ExecuteError> {
  info!("{}", display_command(program, args));
  let mut child = command(program, args, cwd, &[])
    .stdin(Stdio::piped())
    .spawn()
    .map_err(|e| spawn_error(program, e))?;

  if let Some(mut stdin) = child.stdin.take() {
    stdin.write_all(input).await?;
    stdin.shutdown().await?;
  }

  let status = child.wait().await?;
  check(program, args, status)
}

/// Run a program and return its stdout; stderr is inherited.
pub async fn capture(
  program: &str,
  args: &[String],
  cwd: Option<&Path>,
  env: &[(&str, &str)],
) -> Result<String, ExecuteError> {
  debug!("{}", display_command(program, args));
  let output = command(program, args, cwd, env)
    .stderr(Stdio::inherit())
    .output()
    .await
    .map_err(|e| spawn_error(program, e))?;
  check(program, args, output.status)?;
  Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Like [`capture`], but stderr is discarded.
pub async fn capture_quiet(program: &str, args: &[String], cwd: Option<&Path>) -> Result<String, ExecuteError> {
  debug!("{}", display_command(program, args));
  let output = command(program, args, cwd, &[])
    .stdin(Stdio::null())
    .stderr(Stdio::null())
    .output()
    .await
    .map_err(|e| spawn_error(program, e))?;
  check(program, args, output.status)?;
  Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a program silently, reporting only whether it succeeded.
pub async fn probe(program: &str, args: &[String], cwd: Option<&Path>) -> bool {
  command(program, args, cwd, &[])
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .status()
    .await
    .map(|status| status.success())
    .unwrap_or(false)
}

/// Run a program with stdout and stderr interleaved into one buffer.
///
/// Both streams share a single anonymous temp file, so the captured text keeps
/// the order in which the program wrote it. The captured bytes are returned
/// even when the program fails.
pub async fn run_combined(program: &str, args: &[String], cwd: &Path) -> (Vec<u8>, Result<(), ExecuteError>) {
  info!(cwd = %cwd.display(), "{}", display_command(program, args));

  let mut sink = match tempfile::tempfile() {
    Ok(file) => file,
    Err(e) => return (Vec::new(), Err(ExecuteError::Io(e))),
  };

  let streams = sink.try_clone().and_then(|out| Ok((out, sink.try_clone()?)));
  let (stdout, stderr) = match streams {
    Ok(pair) => pair,
    Err(e) => return (Vec::new(), Err(ExecuteError::Io(e))),
  };

  let result = match command(program, args, Some(cwd), &[])
    .stdin(Stdio::null())
    .stdout(Stdio::from(stdout))
    .stderr(Stdio::from(stderr))
    .status()
    .await
  {
    Ok(status) => check(program, args, status),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound && !cwd.is_dir() => Err(ExecuteError::WorkingDir {
      path: cwd.to_path_buf(),
      source: e,
    }),
    Err(e) => Err(spawn_error(program, e)),
  };

  let mut captured = Vec::new();
  if let Err(e) = sink.seek(SeekFrom::Start(0)).and_then(|_| sink.read_to_end(&mut captured)) {
    debug!(error = %e, "failed to read captured output");
  }

  (captured, result)
}
