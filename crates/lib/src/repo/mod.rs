//! Repository documents and the paths derived from them.
//!
//! - [`types`] - the repository document and per-package source descriptors
//! - [`paths`] - argument resolution, derived layout and generation stamps

pub mod paths;
mod types;

pub use paths::{GenerationClock, RepoLayout, RepoPaths};
pub use types::*;
