//! Parsing and validation of `folio.toml` project configuration files.
//!
//! This crate reads the project manifest and produces a strongly-typed
//! [`ProjectConfig`] with named build targets and the external-executables
//! table, plus target resolution into absolute paths.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use resolve::{resolve_target, ResolvedTarget};
pub use types::*;
