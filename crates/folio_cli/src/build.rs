//! `folio build` — build a target's document output.
//!
//! Orchestrates the build:
//! 1. Find the project root and load `folio.toml`
//! 2. Resolve the requested target
//! 3. Ensure generated assets are current (unless `--no-assets`)
//! 4. Invoke the external document transformer into the output directory
//!
//! Asset failures are logged and never abort the transform; the document is
//! built with whatever assets are available.

use std::process::Command;

use folio_assets::{ensure_assets_current, Dispatcher};
use folio_config::ResolvedTarget;
use tracing::{error, info};

use crate::pipeline::resolve_project_root;
use crate::{BuildArgs, GlobalArgs};

/// Runs the `folio build` command.
///
/// Returns exit code 0 on success, 1 when the document transform fails.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = folio_config::load_config(&project_dir)?;

    if !global.quiet {
        eprintln!(
            "   Building {} v{}",
            config.project.name, config.project.version
        );
    }

    let target = folio_config::resolve_target(&config, args.target.as_deref(), &project_dir)?;

    if !global.quiet {
        eprintln!("    Target {} ({})", target.name, target.format);
    }
    if global.verbose {
        eprintln!("    Source {}", target.source.display());
        eprintln!("    Assets {}", target.generated_dir.display());
    }

    if args.no_assets {
        info!("skipping asset generation (--no-assets)");
    } else {
        let dispatcher = Dispatcher::from_executables(&target.executables);
        let report = ensure_assets_current(&target, &dispatcher)?;
        if !report.failures.is_empty() {
            info!(
                "continuing build despite {} asset failure(s)",
                report.failures.len()
            );
        }
    }

    std::fs::create_dir_all(&target.output_dir)?;
    if run_transform(&target)? {
        if !global.quiet {
            eprintln!("   Output in {}", target.output_dir.display());
        }
        Ok(0)
    } else {
        Ok(1)
    }
}

/// Invokes the external document transformer for a target.
///
/// Returns `Ok(true)` on success and `Ok(false)` when the transformer
/// exits unsuccessfully; only a failure to launch it at all is an error.
fn run_transform(target: &ResolvedTarget) -> Result<bool, Box<dyn std::error::Error>> {
    let mut cmd = transform_command(target);
    info!(tool = %target.executables.transform, "transforming document");
    let status = cmd.status().map_err(|e| {
        format!(
            "failed to launch transformer '{}': {e}",
            target.executables.transform
        )
    })?;
    if !status.success() {
        error!("document transform exited with {status}");
    }
    Ok(status.success())
}

/// Builds the transformer invocation for a target.
fn transform_command(target: &ResolvedTarget) -> Command {
    let mut cmd = Command::new(&target.executables.transform);
    cmd.arg(&target.source)
        .arg(&target.publication)
        .arg("--format")
        .arg(target.format.as_str())
        .arg("--assets")
        .arg(&target.generated_dir)
        .arg("--output")
        .arg(&target.output_dir);
    cmd
}
