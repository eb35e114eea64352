//! Request routing for the publish endpoint.
//!
//! - `PUT /a/b/file` stores the request body at `a/b/file` (key required)
//! - `PUT /a/repo.deb/?from=GEN` regenerates metadata in the sibling
//!   generation `a/GEN` and repoints `a/repo.deb` at it (key required)
//! - anything else browses the tree; top-level entries need the key,
//!   deeper paths do not
//!
//! The depth-based key check only guards the first path segment. It is not
//! an access-control boundary: anything reachable through a nested path is
//! readable without the key.
//!
//! Nothing serializes concurrent requests. Two releases racing on the same
//! pointer share one staging link name, so either may fail or be overtaken
//! by the other; uploads racing on one file interleave. Callers coordinate.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::consts::EXIT_STATUS_HEADER;
use crate::execute::process;
use crate::publish::switch_pointer;
use crate::serve::files::{resolve, serve_static};
use crate::serve::types::Reply;
use crate::tools::Tools;

#[derive(Debug, Clone)]
pub struct Api {
  /// Directory the URL space maps onto.
  pub root: PathBuf,
  pub key: String,
  /// Package format; selects the metadata tool.
  pub format: String,
  pub tools: Tools,
  runtime: Handle,
}

/// Split a request target into decoded path, raw path and the `from` query value.
fn parse_target(target: &str) -> Option<(String, String, Option<String>)> {
  let url = url::Url::parse(&format!("http://localhost{target}")).ok()?;
  let raw = url.path().to_string();
  let decoded = urlencoding::decode(&raw).ok()?.into_owned();
  let from = url
    .query_pairs()
    .find(|(name, _)| name == "from")
    .map(|(_, value)| value.into_owned());
  Some((decoded, raw, from))
}

/// Collapse empty and `.` segments of a decoded path, keeping a trailing
/// slash. `None` for `..` segments.
///
/// `//repo.deb` and `/./repo.deb` both become `/repo.deb`, the same entry
/// [`resolve`] maps them to.
pub fn normalize_path(path: &str) -> Option<String> {
  let mut segments = Vec::new();
  for segment in path.split('/') {
    match segment {
      "" | "." => {}
      ".." => return None,
      segment => segments.push(segment),
    }
  }
  let mut normalized = format!("/{}", segments.join("/"));
  if !segments.is_empty() && path.ends_with('/') {
    normalized.push('/');
  }
  Some(normalized)
}

/// Whether a read of `path` needs the key: only entries directly under the root.
///
/// `path` must already be normalized.
pub fn read_requires_key(path: &str) -> bool {
  match path.strip_prefix('/') {
    Some(rest) => !rest.is_empty() && !rest.contains('/'),
    None => !path.is_empty(),
  }
}

fn store(target: &Path, body: &mut dyn Read) -> io::Result<u64> {
  if let Some(parent) = target.parent() {
    fs::create_dir_all(parent)?;
  }
  let mut file = fs::File::create(target)?;
  io::copy(body, &mut file)
}

/// `repo` for `repo.deb` served with format `deb`.
fn repo_base<'a>(pointer_name: &'a str, format: &str) -> &'a str {
  pointer_name
    .strip_suffix(format)
    .and_then(|rest| rest.strip_suffix('.'))
    .filter(|rest| !rest.is_empty())
    .unwrap_or(pointer_name)
}

impl Api {
  /// Must be called from within a tokio runtime; release requests run the
  /// metadata tool on it.
  pub fn new(root: impl Into<PathBuf>, key: impl Into<String>, format: impl Into<String>, tools: Tools) -> Self {
    Self {
      root: root.into(),
      key: key.into(),
      format: format.into(),
      tools,
      runtime: Handle::current(),
    }
  }

  fn authorized(&self, key: Option<&str>) -> bool {
    key == Some(self.key.as_str())
  }

  /// Handle one request. Blocking; call from a blocking-capable thread.
  pub fn handle(&self, method: &str, target: &str, key: Option<&str>, body: &mut dyn Read) -> Reply {
    let Some((path, raw, from)) = parse_target(target) else {
      return Reply::text(400, "invalid request path");
    };
    info!(method, path = %path, "request");

    if method.eq_ignore_ascii_case("PUT") {
      if !self.authorized(key) {
        return Reply::text(403, "Forbidden");
      }
      return if path.ends_with('/') {
        self.release(&path, from.as_deref())
      } else {
        self.upload(&path, body)
      };
    }

    let Some(normalized) = normalize_path(&path) else {
      return Reply::text(400, "invalid path");
    };
    if read_requires_key(&normalized) && !self.authorized(key) {
      return Reply::text(403, "Forbidden");
    }
    serve_static(&self.root, &path, &raw)
  }

  fn upload(&self, path: &str, body: &mut dyn Read) -> Reply {
    let Some(target) = resolve(&self.root, path) else {
      return Reply::text(400, "invalid path");
    };
    if target == self.root {
      return Reply::text(400, "missing file name");
    }

    match store(&target, body) {
      Ok(bytes) => {
        info!(path = %target.display(), bytes, "stored upload");
        Reply::ok()
      }
      Err(e) => {
        warn!(path = %target.display(), error = %e, "upload failed");
        Reply::text(500, &e.to_string())
      }
    }
  }

  fn release(&self, path: &str, from: Option<&str>) -> Reply {
    let Some(pointer) = resolve(&self.root, path) else {
      return Reply::text(400, "invalid path");
    };
    let pointer_name = match pointer.file_name().and_then(|n| n.to_str()) {
      Some(name) if pointer != self.root => name.to_string(),
      _ => return Reply::text(400, "missing repository path"),
    };

    let from = match from {
      Some(from) if !from.is_empty() && from != "." && from != ".." && !from.contains('/') => from,
      _ => return Reply::text(400, "missing or invalid 'from' parameter"),
    };

    let parent = pointer.parent().unwrap_or(&self.root);
    let generation = parent.join(from);
    let tool = self.tools.metadata_tool(&self.format);
    let base = repo_base(&pointer_name, &self.format).to_string();

    let (output, result) = self
      .runtime
      .block_on(process::run_combined(&tool, &[base], &generation));

    if let Err(e) = switch_pointer(&pointer, Path::new(from)) {
      warn!(error = %e, "release failed");
      return Reply::text(500, &e.to_string());
    }

    match result {
      Ok(()) => Reply::new(200, output),
      Err(e) => {
        warn!(tool = %tool, error = %e, "metadata regeneration failed");
        Reply::new(500, output).with_header(EXIT_STATUS_HEADER, e.to_string())
      }
    }
  }
}
