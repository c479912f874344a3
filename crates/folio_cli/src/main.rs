//! Folio CLI — the command-line interface for the Folio document toolchain.
//!
//! Provides `folio build` for building a target's document output (ensuring
//! generated assets are current first) and `folio generate` for regenerating
//! assets without building.

#![warn(missing_docs)]

mod build;
mod generate;
mod pipeline;

use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Folio — a multi-format document build tool.
#[derive(Parser, Debug)]
#[command(name = "folio", version, about = "Folio document build tool")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `folio.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a target's document output.
    Build(BuildArgs),
    /// Regenerate a target's assets without building.
    Generate(GenerateArgs),
}

/// Arguments for the `folio build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Target name from `folio.toml`; defaults to the first target.
    pub target: Option<String>,

    /// Skip asset generation and build with whatever is already generated.
    #[arg(long)]
    pub no_assets: bool,
}

/// Arguments for the `folio generate` subcommand.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Target name from `folio.toml`; defaults to the first target.
    pub target: Option<String>,

    /// Asset kinds to consider (e.g., `--kind plot`); default is all kinds
    /// relevant to the target's format.
    #[arg(short, long, num_args = 1..)]
    pub kind: Vec<String>,

    /// Regenerate everything present in the source, ignoring the cache.
    #[arg(short, long)]
    pub force: bool,

    /// Ask converters for every output format they support.
    #[arg(long)]
    pub all_formats: bool,

    /// Restrict conversion to the subtree with this `xml:id`.
    #[arg(long)]
    pub scope: Option<String>,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Generate(ref args) => generate::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Initializes the log subscriber from the CLI flags.
///
/// `FOLIO_LOG` overrides the flag-derived level when set.
fn init_logging(quiet: bool, verbose: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_env("FOLIO_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
