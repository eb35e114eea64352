//! Repository publishing.
//!
//! A generation becomes live in three steps: the external metadata tool
//! indexes it, the stable pointer is swapped to it, and the optional pruning
//! tool cleans up behind it. The remote endpoint in [`crate::serve`] reuses
//! the same pointer swap.

pub mod metadata;
pub mod pointer;
mod types;

pub use metadata::{finalize_generation, prune, regenerate_metadata};
pub use pointer::{read_pointer, switch_pointer};
pub use types::*;
