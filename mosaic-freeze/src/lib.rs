//! # mosaic-freeze
//!
//! Tracks user-frozen groups across re-cluster passes. A frozen group's
//! representative membership survives positional and membership drift:
//! each pass, the group is matched to the best-overlapping new cluster
//! and its representatives are rebuilt from what remains.

mod enforcement;
mod manager;
mod matching;

pub use manager::{FreezeManager, FrozenEntry};
