//! `fpmbot serve` over a real socket.

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::common::TestEnv;

/// Running server, killed on drop.
struct Server {
  child: Child,
  addr: String,
}

impl Server {
  fn start(root: &Path, extra: &[&str], fprepo_prefix: &str) -> Self {
    let mut child = Command::new(env!("CARGO_BIN_EXE_fpmbot"))
      .args(["serve", "--listen", "127.0.0.1:0", "--fprepo-prefix", fprepo_prefix])
      .arg("--root")
      .arg(root)
      .args(extra)
      .env_remove("FPMBOT_KEY")
      .env_remove("FPMBOT_KEYFILE")
      .env_remove("FPMBOT_ROOT")
      .stdout(Stdio::piped())
      .stderr(Stdio::null())
      .spawn()
      .unwrap();

    let mut line = String::new();
    BufReader::new(child.stdout.take().unwrap()).read_line(&mut line).unwrap();
    let addr = line
      .trim()
      .rsplit("http://")
      .next()
      .unwrap_or_else(|| panic!("unexpected banner: {line}"))
      .to_string();
    Self { child, addr }
  }

  fn request(&self, method: &str, path: &str, key: Option<&str>, body: &str) -> String {
    let mut stream = TcpStream::connect(&self.addr).unwrap();
    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n", self.addr);
    if let Some(key) = key {
      request.push_str(&format!("APIKey: {key}\r\n"));
    }
    request.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));
    stream.write_all(request.as_bytes()).unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
  }
}

impl Drop for Server {
  fn drop(&mut self) {
    let _ = self.child.kill();
    let _ = self.child.wait();
  }
}

#[test]
fn upload_then_release_publishes_generation() {
  let env = TestEnv::new();
  fs::create_dir_all(env.path("www")).unwrap();
  let server = Server::start(&env.path("www"), &["--key", "s3cret"], &env.fprepo_prefix());

  let response = server.request("PUT", "/20240101-000000/foo.deb", Some("s3cret"), "package");
  assert!(response.starts_with("HTTP/1.1 200"), "{response}");

  let response = server.request("PUT", "/repo.deb/?from=20240101-000000", Some("s3cret"), "");
  assert!(response.starts_with("HTTP/1.1 200"), "{response}");

  assert_eq!(
    fs::read_link(env.path("www/repo.deb")).unwrap(),
    Path::new("20240101-000000")
  );
  assert!(env.path("www/20240101-000000/Packages").is_file());

  let response = server.request("GET", "/repo.deb/foo.deb", None, "");
  assert!(response.starts_with("HTTP/1.1 200"), "{response}");
  assert!(response.ends_with("package"));
}

#[test]
fn missing_or_wrong_key_is_forbidden() {
  let env = TestEnv::new();
  fs::create_dir_all(env.path("www")).unwrap();
  let server = Server::start(&env.path("www"), &["--key", "s3cret"], &env.fprepo_prefix());

  assert!(server.request("PUT", "/a/b.deb", None, "x").starts_with("HTTP/1.1 403"));
  assert!(server.request("PUT", "/a/b.deb", Some("nope"), "x").starts_with("HTTP/1.1 403"));
  assert!(!env.path("www/a/b.deb").exists());
}

#[test]
fn failed_metadata_reports_exit_status_header() {
  let env = TestEnv::new();
  fs::create_dir_all(env.path("www/gen1")).unwrap();
  let server = Server::start(&env.path("www"), &["--key", "k"], &env.failing_fprepo_prefix());

  let response = server.request("PUT", "/repo.deb/?from=gen1", Some("k"), "");
  assert!(response.starts_with("HTTP/1.1 500"), "{response}");
  assert!(response.contains("ExitStatus: "), "{response}");
  assert!(response.ends_with("broken metadata\n"), "{response}");
  assert!(env.path("www/repo.deb").is_symlink());
}

#[test]
fn keyfile_is_created_and_used() {
  let env = TestEnv::new();
  fs::create_dir_all(env.path("www")).unwrap();
  let keyfile = env.path("key");
  let server = Server::start(
    &env.path("www"),
    &["--keyfile", keyfile.to_str().unwrap()],
    &env.fprepo_prefix(),
  );

  let key = fs::read_to_string(&keyfile).unwrap();
  assert_eq!(key.len(), 64);

  let response = server.request("PUT", "/x/y.deb", Some(&key), "data");
  assert!(response.starts_with("HTTP/1.1 200"), "{response}");
  assert_eq!(fs::read_to_string(env.path("www/x/y.deb")).unwrap(), "data");
}
