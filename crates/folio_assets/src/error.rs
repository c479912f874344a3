//! Error types for the asset engine.

use std::path::PathBuf;

/// Errors that can escape the asset pipeline.
///
/// Individual converter failures never surface here; they are captured
/// per-request by the dispatcher and reported back to the caller. Only
/// conditions that make the run itself meaningless — an unreadable source
/// tree or a filesystem failure persisting the fingerprint table — are
/// errors.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// An I/O error occurred while reading or writing under the
    /// generated-assets directory.
    #[error("asset I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The fingerprint table could not be serialized.
    #[error("fingerprint table serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The source tree could not be read or parsed.
    #[error(transparent)]
    Source(#[from] folio_source::SourceError),
}
