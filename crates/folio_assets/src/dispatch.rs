//! The generation dispatcher: invoking external converters per request.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use folio_common::DocFormat;
use folio_config::Executables;
use tracing::{debug, error};

use crate::diff::RegenRequest;
use crate::kind::AssetKind;

/// One converter invocation, fully resolved.
///
/// Converters receive the whole source and publication file, the output
/// formats to produce, a destination directory they own, a scratch
/// directory they may litter (cleaned by the caller after the pass), and an
/// optional identity key restricting conversion to one subtree.
#[derive(Debug)]
pub struct ConvertJob<'a> {
    /// The asset kind being converted.
    pub kind: AssetKind,
    /// Absolute path to the root source file.
    pub source: &'a Path,
    /// Absolute path to the publication configuration file.
    pub publication: &'a Path,
    /// Output formats to produce; empty when the kind has a single
    /// canonical output.
    pub formats: &'a [&'static str],
    /// Destination directory for the kind's generated files.
    pub dest_dir: PathBuf,
    /// Scratch directory converters may write temporaries into.
    pub scratch_dir: &'a Path,
    /// Identity key scoping the conversion, if any.
    pub scope_id: Option<&'a str>,
}

/// A single converter invocation failure.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The converter program could not be started at all.
    #[error("failed to launch '{tool}': {source}")]
    Launch {
        /// The program that failed to start.
        tool: String,
        /// The underlying spawn error.
        source: std::io::Error,
    },

    /// The converter ran but exited unsuccessfully.
    #[error("'{tool}' exited with {status}")]
    Failed {
        /// The program that failed.
        tool: String,
        /// Its exit status.
        status: std::process::ExitStatus,
    },

    /// No converter is registered for the kind.
    #[error("no converter registered for {kind}")]
    Unregistered {
        /// The kind with no converter.
        kind: AssetKind,
    },
}

/// An external asset converter.
///
/// The production implementation shells out to a configured program; tests
/// substitute recording or failing converters through
/// [`Dispatcher::with_converter`].
pub trait Converter {
    /// The program name, used by the pre-flight check and in log output.
    fn tool(&self) -> &str;

    /// Runs one conversion, blocking until the external tool finishes.
    fn convert(&self, job: &ConvertJob<'_>) -> Result<(), ConvertError>;
}

/// A converter that invokes an external command.
///
/// The invocation shape is the same for every kind:
/// `<program> <source> <publication> --dest <dir> --scratch <dir>
/// [--format <f>]... [--only <id>]`.
pub struct CommandConverter {
    program: String,
}

impl CommandConverter {
    /// Creates a converter for the given program name or path.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Converter for CommandConverter {
    fn tool(&self) -> &str {
        &self.program
    }

    fn convert(&self, job: &ConvertJob<'_>) -> Result<(), ConvertError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(job.source)
            .arg(job.publication)
            .arg("--dest")
            .arg(&job.dest_dir)
            .arg("--scratch")
            .arg(job.scratch_dir);
        for format in job.formats {
            cmd.arg("--format").arg(format);
        }
        if let Some(id) = job.scope_id {
            cmd.arg("--only").arg(id);
        }
        let status = cmd.status().map_err(|e| ConvertError::Launch {
            tool: self.program.clone(),
            source: e,
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(ConvertError::Failed {
                tool: self.program.clone(),
                status,
            })
        }
    }
}

/// Per-target invariants shared by every request in one dispatch pass.
#[derive(Debug)]
pub struct DispatchContext<'a> {
    /// Absolute path to the root source file.
    pub source: &'a Path,
    /// Absolute path to the publication configuration file.
    pub publication: &'a Path,
    /// The target's document format, selecting each kind's output formats.
    pub format: DocFormat,
    /// The target's generated-assets directory.
    pub generated_dir: &'a Path,
    /// Scratch directory for converter temporaries.
    pub scratch_dir: &'a Path,
    /// Force every possible output format instead of the target's set.
    pub all_formats: bool,
    /// Subtree restriction applied to requests that carry no identity key.
    pub scope_id: Option<&'a str>,
}

/// The outcome of one dispatch pass: every request with its result.
///
/// Replaces the original system's broad catch-and-log with an explicit
/// per-request result the caller aggregates, logs, and folds into the
/// fingerprint table.
#[derive(Debug)]
pub struct DispatchReport {
    /// Each dispatched request paired with its outcome, in dispatch order.
    pub outcomes: Vec<(RegenRequest, Result<(), ConvertError>)>,
}

impl DispatchReport {
    /// Requests that completed successfully.
    pub fn succeeded(&self) -> impl Iterator<Item = &RegenRequest> {
        self.outcomes
            .iter()
            .filter_map(|(req, res)| res.is_ok().then_some(req))
    }

    /// Requests that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&RegenRequest, &ConvertError)> {
        self.outcomes
            .iter()
            .filter_map(|(req, res)| res.as_ref().err().map(|e| (req, e)))
    }

    /// Whether every request succeeded.
    pub fn all_ok(&self) -> bool {
        self.outcomes.iter().all(|(_, res)| res.is_ok())
    }
}

/// Dispatches regeneration requests to the converter registered per kind.
///
/// The registry is a static table built from the explicit executables
/// configuration; nothing is looked up through ambient process state.
pub struct Dispatcher {
    converters: BTreeMap<AssetKind, Box<dyn Converter>>,
}

impl Dispatcher {
    /// Builds the default registry: one command converter per kind, using
    /// the configured tool names.
    pub fn from_executables(executables: &Executables) -> Self {
        let mut converters: BTreeMap<AssetKind, Box<dyn Converter>> = BTreeMap::new();
        for kind in AssetKind::ALL {
            let program = match kind {
                AssetKind::Plot => &executables.plot,
                AssetKind::Diagram => &executables.diagram,
                AssetKind::ExerciseBank => &executables.exercises,
                AssetKind::VideoThumbnail => &executables.thumbnail,
                AssetKind::InteractivePreview => &executables.preview,
                AssetKind::DataFile => &executables.datafile,
            };
            converters.insert(kind, Box::new(CommandConverter::new(program.clone())));
        }
        Self { converters }
    }

    /// Replaces the converter for one kind. Primarily a test seam.
    pub fn with_converter(mut self, kind: AssetKind, converter: Box<dyn Converter>) -> Self {
        self.converters.insert(kind, converter);
        self
    }

    /// Checks which of the given kinds have converter programs that cannot
    /// be found, so the caller can warn before dispatch begins.
    ///
    /// Returns `(kind, tool)` pairs for missing tools. The probe is
    /// advisory: a tool may still fail at dispatch time for other reasons.
    pub fn preflight(&self, kinds: impl IntoIterator<Item = AssetKind>) -> Vec<(AssetKind, String)> {
        let mut seen = std::collections::BTreeSet::new();
        let mut missing = Vec::new();
        for kind in kinds {
            if !seen.insert(kind) {
                continue;
            }
            if let Some(converter) = self.converters.get(&kind) {
                let tool = converter.tool();
                if !tool_available(tool) {
                    missing.push((kind, tool.to_string()));
                }
            }
        }
        missing
    }

    /// Runs every request sequentially, capturing each outcome.
    ///
    /// A failing request never aborts its siblings; converters are flaky
    /// external tools and the rest of the batch is still worth running.
    pub fn dispatch(&self, requests: &[RegenRequest], ctx: &DispatchContext<'_>) -> DispatchReport {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            let result = self.dispatch_one(request, ctx);
            if let Err(e) = &result {
                error!(request = %request, "asset generation failed: {e}");
            }
            outcomes.push((request.clone(), result));
        }
        DispatchReport { outcomes }
    }

    fn dispatch_one(
        &self,
        request: &RegenRequest,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), ConvertError> {
        let converter = self
            .converters
            .get(&request.kind)
            .ok_or(ConvertError::Unregistered { kind: request.kind })?;
        let formats: &[&'static str] = if ctx.all_formats {
            &["all"]
        } else {
            request.kind.output_formats(ctx.format)
        };
        let job = ConvertJob {
            kind: request.kind,
            source: ctx.source,
            publication: ctx.publication,
            formats,
            dest_dir: ctx.generated_dir.join(request.kind.dir()),
            scratch_dir: ctx.scratch_dir,
            scope_id: request.id.as_deref().or(ctx.scope_id),
        };
        debug!(request = %request, tool = converter.tool(), "invoking converter");
        converter.convert(&job)
    }
}

/// Whether a program can be found: directly for explicit paths, through
/// `PATH` otherwise.
fn tool_available(program: &str) -> bool {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file();
    }
    let Some(search) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&search).any(|dir| dir.join(program).is_file())
}
