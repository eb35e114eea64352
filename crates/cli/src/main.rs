mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fpmbot_lib::consts::{DEFAULT_FORMAT, DEFAULT_LISTEN};

use crate::cmd::{BuildArgs, RunArgs, ServeArgs};
use crate::output::{OutputFormat, print_error};

/// Incremental package repository builder
#[derive(Parser)]
#[command(name = "fpmbot")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Log at debug level unless RUST_LOG says otherwise
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build every package of one or more repositories and publish a new generation
  Run {
    /// Repository documents (X.yaml), repository directories, or names under --datadir
    #[arg(required = true)]
    repos: Vec<PathBuf>,

    /// Package format, overriding the repository document
    #[arg(short, long)]
    target: Option<String>,

    /// Run the container runtime through sudo
    #[arg(long)]
    sudo: bool,

    /// Root directory every repository path is placed under
    #[arg(long, env = "FPMBOT_DATADIR")]
    datadir: Option<PathBuf>,

    /// Packaging tool [default: $FPMBOT_FPM or fpm]
    #[arg(long)]
    fpm: Option<String>,

    /// Prefix of the metadata tool, the target is appended [default: $FPMBOT_FPREPO_PREFIX or fprepo-]
    #[arg(long)]
    fprepo_prefix: Option<String>,

    /// Pruning tool, empty disables pruning [default: $FPMBOT_PRUNE or fpprunerepo]
    #[arg(long)]
    prune: Option<String>,

    /// Summary format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Build and package the source tree in the current (or given) directory
  Build {
    /// Change to this directory first
    dir: Option<PathBuf>,

    /// Build file layered above the source's own .fpmbuild.yaml
    #[arg(long, env = "FPMBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Package format
    #[arg(short, long, default_value = DEFAULT_FORMAT)]
    target: String,

    /// Where the packaging tool writes its output
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Overwrite existing output
    #[arg(short, long, action = ArgAction::Set, default_value_t = true)]
    force: bool,

    /// Run the container runtime through sudo
    #[arg(long)]
    sudo: bool,

    /// Packaging tool [default: $FPMBOT_FPM or fpm]
    #[arg(long)]
    fpm: Option<String>,
  },

  /// Serve a repository tree and accept uploads and releases
  Serve {
    /// Address to listen on
    #[arg(short, long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Shared secret expected in the APIKey header
    #[arg(long, env = "FPMBOT_KEY", hide_env_values = true)]
    key: Option<String>,

    /// File holding the key; created with a random key when missing or empty
    #[arg(long, env = "FPMBOT_KEYFILE")]
    keyfile: Option<PathBuf>,

    /// Package format, selects the metadata tool
    #[arg(long, default_value = DEFAULT_FORMAT)]
    format: String,

    /// Directory served at /
    #[arg(long, env = "FPMBOT_ROOT", default_value = ".")]
    root: PathBuf,

    /// Prefix of the metadata tool, the format is appended [default: $FPMBOT_FPREPO_PREFIX or fprepo-]
    #[arg(long)]
    fprepo_prefix: Option<String>,
  },
}

fn init_logging(verbose: bool) {
  let default = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let result = match cli.command {
    Commands::Run {
      repos,
      target,
      sudo,
      datadir,
      fpm,
      fprepo_prefix,
      prune,
      output,
    } => cmd::cmd_run(RunArgs {
      repos,
      target,
      sudo,
      datadir,
      fpm,
      fprepo_prefix,
      prune,
      output,
    }),
    Commands::Build {
      dir,
      config,
      target,
      output,
      force,
      sudo,
      fpm,
    } => cmd::cmd_build(BuildArgs {
      dir,
      config,
      target,
      output,
      force,
      sudo,
      fpm,
    })
    .map(|()| 0),
    Commands::Serve {
      listen,
      key,
      keyfile,
      format,
      root,
      fprepo_prefix,
    } => cmd::cmd_serve(ServeArgs {
      listen,
      key,
      keyfile,
      format,
      root,
      fprepo_prefix,
    })
    .map(|()| 0),
  };

  match result {
    Ok(errors) => ExitCode::from(errors.min(u8::MAX as usize) as u8),
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
