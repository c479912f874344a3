//! Shared foundational types used across the Folio document toolchain.
//!
//! This crate provides the content digest used for asset change detection
//! and the enumeration of document output formats.

#![warn(missing_docs)]

pub mod digest;
pub mod format;

pub use digest::{Digest, DigestWriter};
pub use format::DocFormat;
