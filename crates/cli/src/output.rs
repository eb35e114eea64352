//! CLI output formatting utilities.
//!
//! Colored status lines, run summaries and JSON output.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const BUILT: &str = "+";
  pub const REUSED: &str = "=";
}

pub fn truncate_hash(hash: &str) -> &str {
  let len = hash.len().min(12);
  &hash[..len]
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

#[derive(Debug, Clone, Copy)]
pub enum PackageStatus {
  Built,
  Reused,
  Failed,
}

pub fn print_package(status: PackageStatus, name: &str, detail: &str) {
  let symbol = match status {
    PackageStatus::Built => symbols::BUILT.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
    PackageStatus::Reused => symbols::REUSED.if_supports_color(Stream::Stdout, |s| s.blue()).to_string(),
    PackageStatus::Failed => symbols::ERROR.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
  };
  println!(
    "  {} {} {}",
    symbol,
    name,
    detail.if_supports_color(Stream::Stdout, |s| s.dimmed())
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
