//! fpmbot-lib: incremental package repository builds
//!
//! This crate provides the pieces behind the `fpmbot` binary:
//! - `orchestrate`: fetch, build or reuse, and publish every package of a repository
//! - `compose`: layered build configuration and the build-then-package pipeline
//! - `publish`: metadata regeneration and the atomic pointer swap
//! - `serve`: the HTTP endpoint that accepts uploads and releases remotely

pub mod compose;
pub mod consts;
pub mod error;
pub mod execute;
pub mod ledger;
pub mod orchestrate;
pub mod publish;
pub mod repo;
pub mod serve;
pub mod source;
pub mod tools;
pub mod util;

pub use error::{Error, Result};
