//! Shared types for launchpad.
//!
//! Everything in this crate is a plain value: no I/O, no async. The core
//! crate threads these through each pipeline stage explicitly.

pub mod hash;
pub mod release;
pub mod target;

// Re-exports
pub use hash::*;
pub use release::{ReleaseAsset, ReleaseMetadata};
pub use target::*;
