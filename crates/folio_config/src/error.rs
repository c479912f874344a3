//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `folio.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A referenced target name does not exist in the configuration.
    #[error("unknown target '{0}'")]
    UnknownTarget(String),

    /// The configuration defines no targets at all.
    #[error("no targets defined in configuration")]
    NoTargets,

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),
}
