//! Configuration types deserialized from `folio.toml`.

use folio_common::DocFormat;
use serde::Deserialize;
use std::collections::BTreeMap;

/// The top-level project configuration parsed from `folio.toml`.
///
/// Contains project metadata, named build-target definitions, and the
/// external-executables table used by asset converters and the document
/// transformer.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata (name, version, description).
    pub project: ProjectMeta,
    /// Named build targets (e.g., "web", "print").
    #[serde(default)]
    pub targets: BTreeMap<String, TargetConfig>,
    /// Paths or names of the external tools Folio invokes.
    #[serde(default)]
    pub executables: Executables,
}

/// Core project metadata required in every `folio.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// The project version string.
    pub version: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
    /// List of project authors.
    #[serde(default)]
    pub authors: Vec<String>,
}

/// Configuration for a single build target.
///
/// A target names a source file, a publication file, an output document
/// format, and the directories that build output and generated assets land
/// in.
#[derive(Debug, Deserialize)]
pub struct TargetConfig {
    /// Path to the root source file, relative to the project directory.
    pub source: String,
    /// Path to the publication configuration file, relative to the project
    /// directory.
    pub publication: String,
    /// The output document format.
    #[serde(default)]
    pub format: DocFormat,
    /// Output directory; defaults to `output/<target-name>`.
    #[serde(default)]
    pub output_dir: Option<String>,
    /// Generated-assets directory; defaults to `generated-assets`, shared
    /// across targets (the fingerprint table is still per-target).
    #[serde(default)]
    pub generated_dir: Option<String>,
}

/// Names (or paths) of the external programs Folio shells out to.
///
/// The original tooling configured these process-wide; here the table is an
/// explicit value handed to the generation dispatcher.
#[derive(Debug, Clone, Deserialize)]
pub struct Executables {
    /// Plot converter.
    #[serde(default = "default_plot")]
    pub plot: String,
    /// Diagram converter.
    #[serde(default = "default_diagram")]
    pub diagram: String,
    /// Exercise-bank extractor (whole-source, all-or-nothing).
    #[serde(default = "default_exercises")]
    pub exercises: String,
    /// Remote-video thumbnail fetcher.
    #[serde(default = "default_thumbnail")]
    pub thumbnail: String,
    /// Interactive-preview screenshotter.
    #[serde(default = "default_preview")]
    pub preview: String,
    /// Data-file packager.
    #[serde(default = "default_datafile")]
    pub datafile: String,
    /// Whole-document transformer invoked by `folio build`.
    #[serde(default = "default_transform")]
    pub transform: String,
}

fn default_plot() -> String {
    "sage".to_string()
}

fn default_diagram() -> String {
    "asy".to_string()
}

fn default_exercises() -> String {
    "exbank".to_string()
}

fn default_thumbnail() -> String {
    "yt-dlp".to_string()
}

fn default_preview() -> String {
    "pageshot".to_string()
}

fn default_datafile() -> String {
    "datatool".to_string()
}

fn default_transform() -> String {
    "xsltproc".to_string()
}

impl Default for Executables {
    fn default() -> Self {
        Self {
            plot: default_plot(),
            diagram: default_diagram(),
            exercises: default_exercises(),
            thumbnail: default_thumbnail(),
            preview: default_preview(),
            datafile: default_datafile(),
            transform: default_transform(),
        }
    }
}
