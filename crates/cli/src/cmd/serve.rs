//! Implementation of the `fpmbot serve` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use fpmbot_lib::serve::{RepoServer, ServeConfig, resolve_key};
use fpmbot_lib::tools::Tools;

use crate::output::print_info;

pub struct ServeArgs {
  pub listen: String,
  pub key: Option<String>,
  pub keyfile: Option<PathBuf>,
  pub format: String,
  pub root: PathBuf,
  pub fprepo_prefix: Option<String>,
}

/// Execute the serve command. Only returns on startup failure.
pub fn cmd_serve(args: ServeArgs) -> Result<()> {
  let key = resolve_key(args.key.as_deref(), args.keyfile.as_deref()).context("Failed to set up the API key")?;
  let root = dunce::canonicalize(&args.root).with_context(|| format!("Cannot serve {}", args.root.display()))?;

  let mut tools = Tools::from_env();
  if let Some(prefix) = args.fprepo_prefix {
    tools.metadata_prefix = prefix;
  }

  let config = ServeConfig {
    listen: args.listen,
    root,
    key,
    format: args.format,
    tools,
  };

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(async {
    let server = RepoServer::bind(config).context("Failed to start server")?;
    if let Some(addr) = server.local_addr() {
      print_info(&format!("Listening on http://{}", addr));
    }
    server.run().await;
    Ok(())
  })
}
