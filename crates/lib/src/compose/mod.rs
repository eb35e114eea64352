//! Build procedure composition.
//!
//! A package build is described by up to three layers of [`BuildFile`]:
//! the per-package document next to the source checkout, the `.fpmbuild.yaml`
//! committed in the source tree, and built-in defaults. They merge into a
//! [`BuildPlan`]: an ordered [`Procedure`] plus the packaging-tool arguments,
//! hook scripts and execution environment.
//!
//! # Submodules
//!
//! - [`merge`] - layer precedence rules and defaults
//! - [`procedure`] - ordered stages and the interpreter command line
//! - [`version`] - package name/version options derived from git
//! - [`package`] - packaging-tool invocation with hook scripts
//! - [`build`] - the whole build for one directory

pub mod build;
pub mod merge;
pub mod package;
pub mod procedure;
mod types;
pub mod version;

pub use build::{BuildOptions, build_package, load_plan};
pub use merge::{BuildPlan, compose};
pub use procedure::{Procedure, Stage};
pub use types::*;
