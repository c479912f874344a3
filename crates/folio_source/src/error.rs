//! Error types for source loading and parsing.

use std::path::PathBuf;

/// Errors that can occur while loading or parsing a source document.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// An I/O error occurred while reading the source file.
    #[error("failed to read source {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The source text is not well-formed XML.
    #[error("malformed source markup: {reason}")]
    Parse {
        /// Description of the parse failure.
        reason: String,
    },
}
