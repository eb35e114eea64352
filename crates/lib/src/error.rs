use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::compose::ComposeError;
use crate::execute::ExecuteError;
use crate::ledger::LedgerError;
use crate::publish::PublishError;
use crate::repo::RepoError;
use crate::serve::ServeError;
use crate::source::FetchError;
use crate::util::link::LinkError;

/// Any failure the orchestrator can hit while processing a repository.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Repo(#[from] RepoError),

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Ledger(#[from] LedgerError),

  #[error(transparent)]
  Link(#[from] LinkError),

  #[error(transparent)]
  Compose(#[from] ComposeError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),

  #[error(transparent)]
  Publish(#[from] PublishError),

  #[error(transparent)]
  Serve(#[from] ServeError),

  #[error("failed to resolve '{}': {source}", path.display())]
  ResolvePath {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to create directory '{}': {source}", path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
