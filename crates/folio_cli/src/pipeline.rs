//! Shared helpers for CLI commands: project-root discovery and target setup.

use std::path::{Path, PathBuf};

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing `folio.toml`.
///
/// Returns the directory containing `folio.toml`, or an error if none is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join("folio.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find folio.toml in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir → itself).
/// Otherwise walks up from the current directory looking for `folio.toml`.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        find_project_root(&std::env::current_dir()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = "[project]\nname = \"t\"\nversion = \"0.1.0\"\n";

    #[test]
    fn find_project_root_in_current_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("folio.toml"), MANIFEST).unwrap();
        let root = find_project_root(tmp.path()).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn find_project_root_in_parent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("folio.toml"), MANIFEST).unwrap();
        let sub = tmp.path().join("source");
        fs::create_dir_all(&sub).unwrap();
        let root = find_project_root(&sub).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn find_project_root_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = find_project_root(tmp.path());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("could not find folio.toml"));
    }

    #[test]
    fn resolve_project_root_from_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("folio.toml");
        fs::write(&config_path, MANIFEST).unwrap();

        let global = GlobalArgs {
            quiet: false,
            verbose: false,
            config: Some(config_path.to_str().unwrap().to_string()),
        };
        let root = resolve_project_root(&global).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn resolve_project_root_from_config_dir() {
        let tmp = TempDir::new().unwrap();
        let global = GlobalArgs {
            quiet: false,
            verbose: false,
            config: Some(tmp.path().to_str().unwrap().to_string()),
        };
        let root = resolve_project_root(&global).unwrap();
        assert_eq!(root, tmp.path());
    }
}
