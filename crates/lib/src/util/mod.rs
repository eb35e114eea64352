//! Shared utilities.
//!
//! Hashing and the recursive hard-link primitive used for artifact reuse.

pub mod hash;
pub mod link;

#[cfg(test)]
pub mod testutil;
