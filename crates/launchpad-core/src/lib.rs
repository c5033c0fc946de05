//! Core library for launchpad.
//!
//! Resolves the host target, finds the matching release asset, downloads
//! it into a fresh working directory, unpacks it, verifies the executable
//! against a known SHA-512 digest and finally runs it.
//!
//! # Stages
//!
//! ```text
//! Target ─▶ locate ─▶ download ─▶ extract ─▶ verify ─▶ launch
//! ```
//!
//! Stages run strictly in order; the first failure ends the run.

pub mod config;
pub mod error;
pub mod io;
pub mod launch;
pub mod paths;
pub mod pipeline;
pub mod release;
pub mod verify;

pub use config::{Config, ConfigError};
pub use error::Error;
pub use pipeline::{Pipeline, Prepared};
pub use release::ReleaseSpec;

pub use launchpad_schema as schema;

/// User Agent string sent with every request unless overridden by config
pub const USER_AGENT: &str = concat!("launchpad/", env!("CARGO_PKG_VERSION"));
