//! `folio generate` — regenerate a target's assets without building.

use folio_assets::{generate_assets, AssetKind, Dispatcher, GenerateOptions};
use tracing::warn;

use crate::pipeline::resolve_project_root;
use crate::{GenerateArgs, GlobalArgs};

/// Runs the `folio generate` command.
///
/// Individual converter failures are logged but do not change the exit
/// code; assets are best-effort by design. Returns exit code 0 unless
/// configuration or the source tree itself is unusable.
pub fn run(args: &GenerateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = folio_config::load_config(&project_dir)?;
    let target = folio_config::resolve_target(&config, args.target.as_deref(), &project_dir)?;

    let kinds = parse_kinds(&args.kind)?;
    let options = GenerateOptions {
        kinds,
        only_changed: !args.force,
        all_formats: args.all_formats,
        scope_id: args.scope.clone(),
    };

    let dispatcher = Dispatcher::from_executables(&target.executables);
    let report = generate_assets(&target, &dispatcher, &options)?;

    if !global.quiet {
        if report.up_to_date() {
            eprintln!("   Assets for '{}' are up to date", target.name);
        } else {
            eprintln!(
                "   Regenerated {} asset group(s), {} failure(s)",
                report.requests.len() - report.failures.len(),
                report.failures.len()
            );
        }
    }
    if !report.failures.is_empty() {
        warn!("rerun `folio generate` after fixing the failing converters");
    }
    Ok(0)
}

/// Parses `--kind` names into asset kinds.
///
/// An empty list means no restriction and maps to `None`.
fn parse_kinds(names: &[String]) -> Result<Option<Vec<AssetKind>>, Box<dyn std::error::Error>> {
    if names.is_empty() {
        return Ok(None);
    }
    let mut kinds = Vec::with_capacity(names.len());
    for name in names {
        let kind = AssetKind::from_name(name).ok_or_else(|| {
            let valid: Vec<_> = AssetKind::ALL.iter().map(|k| k.name()).collect();
            format!(
                "unknown asset kind '{name}' (expected one of: {})",
                valid.join(", ")
            )
        })?;
        kinds.push(kind);
    }
    Ok(Some(kinds))
}
