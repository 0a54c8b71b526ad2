//! Shared utilities.
//!
//! Content hashing for build-node identity and the set/sort helpers used
//! when aggregating rule dependencies.

pub mod hash;
pub mod set;
