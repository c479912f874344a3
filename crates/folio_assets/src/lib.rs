//! Asset dependency tracking and incremental regeneration.
//!
//! This crate decides, for a build target, which externally generated assets
//! are stale, regenerates only those through the registered converters, and
//! persists a per-target fingerprint table so repeated builds skip work that
//! is already current. All reads of the persisted table are fail-safe: a
//! missing or corrupt table means "everything is stale", never an error.

#![warn(missing_docs)]

pub mod diff;
pub mod dispatch;
pub mod error;
pub mod fingerprint;
pub mod kind;
pub mod pipeline;
pub mod table;

pub use diff::{diff, RegenRequest};
pub use dispatch::{
    CommandConverter, ConvertError, ConvertJob, Converter, DispatchContext, DispatchReport,
    Dispatcher,
};
pub use error::AssetError;
pub use fingerprint::fingerprint_source;
pub use kind::AssetKind;
pub use pipeline::{ensure_assets_current, generate_assets, AssetReport, GenerateOptions};
pub use table::FingerprintTable;
