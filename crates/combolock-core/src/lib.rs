//! Core domain types for the combination lock controller.
//!
//! This crate holds everything the other crates agree on: the validated
//! digit and selector-index types, the secret [`Combination`], the believed
//! [`LockState`], the named lock constants and the [`LockConfig`] that
//! groups them.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::LockConfig;
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
