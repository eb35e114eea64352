//! Package sources.
//!
//! Only git sources are tracked; a package without one has no revision and
//! is rebuilt on every run.

pub mod fetch;

pub use fetch::{FetchError, fetch_git, rev_parse_head, target_ref};
