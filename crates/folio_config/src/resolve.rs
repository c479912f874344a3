//! Target resolution: turning a named target into absolute paths.

use crate::error::ConfigError;
use crate::types::{Executables, ProjectConfig};
use folio_common::DocFormat;
use std::path::{Path, PathBuf};

/// A fully resolved build target with every path made absolute.
///
/// Relative paths in `folio.toml` are resolved against the project
/// directory. The executables table is carried along so callers can thread
/// it into the generation dispatcher without reaching back into the config.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// The target name.
    pub name: String,
    /// The output document format.
    pub format: DocFormat,
    /// Absolute path to the root source file.
    pub source: PathBuf,
    /// Absolute path to the publication configuration file.
    pub publication: PathBuf,
    /// Absolute path to the build output directory.
    pub output_dir: PathBuf,
    /// Absolute path to the generated-assets directory.
    pub generated_dir: PathBuf,
    /// External tool names/paths.
    pub executables: Executables,
}

/// Resolves a target by name, or the first defined target when `name` is `None`.
///
/// Relative `source`/`publication`/directory paths become absolute under
/// `project_dir`. The output directory defaults to `output/<target-name>`
/// and the generated-assets directory to `generated-assets` (shared across
/// targets; the fingerprint table file remains per-target).
pub fn resolve_target(
    config: &ProjectConfig,
    name: Option<&str>,
    project_dir: &Path,
) -> Result<ResolvedTarget, ConfigError> {
    let (name, target) = match name {
        Some(n) => (
            n,
            config
                .targets
                .get(n)
                .ok_or_else(|| ConfigError::UnknownTarget(n.to_string()))?,
        ),
        None => config
            .targets
            .iter()
            .next()
            .map(|(n, t)| (n.as_str(), t))
            .ok_or(ConfigError::NoTargets)?,
    };

    let absolutize = |rel: &str| -> PathBuf {
        let p = Path::new(rel);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            project_dir.join(p)
        }
    };

    let output_dir = target
        .output_dir
        .as_deref()
        .map(absolutize)
        .unwrap_or_else(|| project_dir.join("output").join(name));
    let generated_dir = target
        .generated_dir
        .as_deref()
        .map(absolutize)
        .unwrap_or_else(|| project_dir.join("generated-assets"));

    Ok(ResolvedTarget {
        name: name.to_string(),
        format: target.format,
        source: absolutize(&target.source),
        publication: absolutize(&target.publication),
        output_dir,
        generated_dir,
        executables: config.executables.clone(),
    })
}
