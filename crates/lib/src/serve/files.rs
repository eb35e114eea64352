//! Read-only browsing of the served tree.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::serve::types::{Body, Reply};

/// Map a decoded URL path onto `root`, refusing anything that climbs out.
///
/// Returns `None` for `..` components.
pub fn resolve(root: &Path, url_path: &str) -> Option<PathBuf> {
  let mut resolved = root.to_path_buf();
  for component in Path::new(url_path.trim_start_matches('/')).components() {
    match component {
      Component::Normal(part) => resolved.push(part),
      Component::CurDir => {}
      Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
    }
  }
  Some(resolved)
}

fn content_type(path: &Path) -> &'static str {
  match path.extension().and_then(|e| e.to_str()) {
    Some("html" | "htm") => "text/html; charset=utf-8",
    Some("txt" | "asc" | "sig") => "text/plain; charset=utf-8",
    Some("xml") => "application/xml",
    Some("json") => "application/json",
    Some("gz") => "application/gzip",
    Some("xz") => "application/x-xz",
    Some("bz2") => "application/x-bzip2",
    Some("deb") => "application/vnd.debian.binary-package",
    Some("rpm") => "application/x-rpm",
    _ => "application/octet-stream",
  }
}

fn escape_html(s: &str) -> String {
  s.replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
}

fn listing(dir: &Path) -> io::Result<String> {
  let mut names = Vec::new();
  for entry in fs::read_dir(dir)? {
    let entry = entry?;
    let mut name = entry.file_name().to_string_lossy().into_owned();
    // Follows symlinks so a published pointer lists as a directory.
    if entry.path().is_dir() {
      name.push('/');
    }
    names.push(name);
  }
  names.sort();

  let mut html = String::from("<pre>\n");
  for name in names {
    html.push_str(&format!(
      "<a href=\"{}\">{}</a>\n",
      urlencoding::encode(&name).replace("%2F", "/"),
      escape_html(&name)
    ));
  }
  html.push_str("</pre>\n");
  Ok(html)
}

fn serve_file(path: &Path) -> Reply {
  match fs::File::open(path) {
    Ok(file) => Reply {
      status: 200,
      headers: vec![("Content-Type", content_type(path).to_string())],
      body: Body::File(file),
    },
    Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Reply::text(403, "Forbidden"),
    Err(e) => Reply::text(500, &e.to_string()),
  }
}

/// Serve `url_path` (decoded) from `root`. `raw_path` is the path as
/// requested, used to build redirects.
pub fn serve_static(root: &Path, url_path: &str, raw_path: &str) -> Reply {
  let Some(path) = resolve(root, url_path) else {
    return Reply::text(400, "invalid path");
  };

  let metadata = match fs::metadata(&path) {
    Ok(metadata) => metadata,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Reply::text(404, "Not Found"),
    Err(e) if e.kind() == io::ErrorKind::PermissionDenied => return Reply::text(403, "Forbidden"),
    Err(e) => return Reply::text(500, &e.to_string()),
  };

  if metadata.is_dir() {
    if !raw_path.ends_with('/') {
      return Reply::redirect(format!("{}/", raw_path));
    }
    let index = path.join("index.html");
    if index.is_file() {
      return serve_file(&index);
    }
    debug!(path = %path.display(), "directory listing");
    return match listing(&path) {
      Ok(html) => Reply::new(200, html).with_header("Content-Type", "text/html; charset=utf-8"),
      Err(e) => Reply::text(500, &e.to_string()),
    };
  }

  if raw_path.len() > 1 && raw_path.ends_with('/') {
    return Reply::redirect(raw_path.trim_end_matches('/').to_string());
  }
  serve_file(&path)
}
