//! Remote publish endpoint.
//!
//! An HTTP server over a directory tree that lets a build agent upload
//! package files and trigger the same metadata + pointer swap sequence the
//! local orchestrator uses. See [`api`] for the routes.
//!
//! The listener runs on a plain thread feeding a channel; each request is
//! then handled on the blocking pool, so slow uploads or metadata runs never
//! hold up the accept loop.
//!
//! # Submodules
//!
//! - [`api`] - routing, authentication, upload and release
//! - [`files`] - static browsing
//! - [`key`] - shared-secret loading and generation

pub mod api;
pub mod files;
pub mod key;
mod types;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use tiny_http::{Header, Request, Response, Server};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub use api::Api;
pub use key::{load_or_create_key, random_key, resolve_key};
pub use types::*;

use crate::consts::API_KEY_HEADER;
use crate::tools::Tools;

#[derive(Debug, Clone)]
pub struct ServeConfig {
  pub listen: String,
  /// Directory served at `/`.
  pub root: PathBuf,
  pub key: String,
  pub format: String,
  pub tools: Tools,
}

pub struct RepoServer {
  server: Arc<Server>,
  api: Api,
}

impl RepoServer {
  /// Bind the listener. Must be called inside a tokio runtime.
  pub fn bind(config: ServeConfig) -> Result<Self, ServeError> {
    if !config.root.is_dir() {
      return Err(ServeError::Root(config.root));
    }
    let server = Server::http(&config.listen).map_err(|source| ServeError::Bind {
      listen: config.listen.clone(),
      source,
    })?;
    let api = Api::new(config.root, config.key, config.format, config.tools);
    Ok(Self {
      server: Arc::new(server),
      api,
    })
  }

  pub fn local_addr(&self) -> Option<SocketAddr> {
    self.server.server_addr().to_ip()
  }

  /// Serve until the listener fails.
  pub async fn run(self) {
    if let Some(addr) = self.local_addr() {
      info!(%addr, root = %self.api.root.display(), format = %self.api.format, "serving");
    }

    let (tx, mut rx) = mpsc::channel::<Request>(64);
    let server = self.server.clone();
    thread::spawn(move || {
      while let Ok(request) = server.recv() {
        if tx.blocking_send(request).is_err() {
          break;
        }
      }
    });

    while let Some(request) = rx.recv().await {
      let api = self.api.clone();
      tokio::task::spawn_blocking(move || respond(&api, request));
    }
  }
}

fn respond(api: &Api, mut request: Request) {
  let method = request.method().as_str().to_string();
  let target = request.url().to_string();
  let key = request
    .headers()
    .iter()
    .find(|h| h.field.equiv(API_KEY_HEADER))
    .map(|h| h.value.as_str().to_string());

  let reply = api.handle(&method, &target, key.as_deref(), request.as_reader());

  let headers: Vec<Header> = reply
    .headers
    .iter()
    .filter_map(|(name, value)| Header::from_bytes(name.as_bytes(), value.as_bytes()).ok())
    .collect();

  let result = match reply.body {
    Body::Bytes(bytes) => {
      let mut response = Response::from_data(bytes).with_status_code(reply.status);
      for header in headers {
        response.add_header(header);
      }
      request.respond(response)
    }
    Body::File(file) => {
      let mut response = Response::from_file(file).with_status_code(reply.status);
      for header in headers {
        response.add_header(header);
      }
      request.respond(response)
    }
  };

  if let Err(e) = result {
    warn!(method = %method, target = %target, error = %e, "failed to send response");
  }
}
