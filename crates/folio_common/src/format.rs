//! Document output formats.

use serde::Deserialize;
use std::fmt;

/// The output format a build target produces.
///
/// The format determines which asset kinds are relevant and which output
/// formats each asset converter is asked to produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocFormat {
    /// Web output (default).
    #[default]
    Html,
    /// PDF via the configured LaTeX engine.
    Pdf,
    /// Raw LaTeX source output.
    Latex,
    /// EPUB electronic book output.
    Epub,
}

impl DocFormat {
    /// The lowercase name used in configuration files and log output.
    pub fn as_str(self) -> &'static str {
        match self {
            DocFormat::Html => "html",
            DocFormat::Pdf => "pdf",
            DocFormat::Latex => "latex",
            DocFormat::Epub => "epub",
        }
    }
}

impl fmt::Display for DocFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
