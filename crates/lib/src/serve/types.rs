use std::fs::File;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServeError {
  #[error("failed to listen on '{listen}': {source}")]
  Bind {
    listen: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("failed to read or create key file '{}': {source}", path.display())]
  KeyFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("serving root '{}' is not a directory", .0.display())]
  Root(PathBuf),
}

/// Response body.
#[derive(Debug)]
pub enum Body {
  Bytes(Vec<u8>),
  File(File),
}

/// A handled request, independent of the HTTP server library.
#[derive(Debug)]
pub struct Reply {
  pub status: u16,
  pub headers: Vec<(&'static str, String)>,
  pub body: Body,
}

impl Reply {
  pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
    Self {
      status,
      headers: Vec::new(),
      body: Body::Bytes(body.into()),
    }
  }

  pub fn ok() -> Self {
    Self::new(200, Vec::new())
  }

  pub fn text(status: u16, text: &str) -> Self {
    Self::new(status, text).with_header("Content-Type", "text/plain; charset=utf-8")
  }

  pub fn redirect(location: String) -> Self {
    Self::new(301, Vec::new()).with_header("Location", location)
  }

  pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
    self.headers.push((name, value.into()));
    self
  }

  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }
}
