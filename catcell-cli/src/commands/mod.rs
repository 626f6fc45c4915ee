pub mod annotations;
pub mod cells;
pub mod centrioles;
pub mod vectors;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};

use catcell_core::catmaid::HttpCatmaidClient;
use catcell_core::config::{CatcellConfig, DEFAULT_CONFIG_FILE};
use catcell_core::pipeline::RunSummary;
use catcell_core::progress::{IndicatifReporter, NoopReporter, ProgressReporter};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Per-cell statistics (centriole distances, cilium, cell type, ...) to CSV
    Cells(cells::CellsArgs),
    /// Location of every centriole, cached between runs
    Centrioles(centrioles::CentriolesArgs),
    /// Position and orientation of centriole vector lines
    Vectors(vectors::VectorsArgs),
    /// List every annotation used on the project
    Annotations(annotations::AnnotationsArgs),
}

/// Flags shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Config file (default: ./catcell.toml if present)
    #[arg(long, global = true, env = "CATCELL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Abort on the first cell that cannot be processed
    #[arg(long, global = true)]
    pub strict: bool,

    /// Suppress progress bars and non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// How a successful command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Complete,
    /// Output was written but some cells were skipped.
    Partial,
}

impl From<&RunSummary> for Outcome {
    fn from(summary: &RunSummary) -> Self {
        if summary.is_partial() {
            Self::Partial
        } else {
            Self::Complete
        }
    }
}

pub async fn run(cmd: Command, global: &GlobalArgs) -> anyhow::Result<Outcome> {
    match cmd {
        Command::Cells(args) => cells::run(args, global).await,
        Command::Centrioles(args) => centrioles::run(args, global).await,
        Command::Vectors(args) => vectors::run(args, global).await,
        Command::Annotations(args) => annotations::run(args, global).await,
    }
}

/// Load the explicit config file, or `./catcell.toml` when present, or the
/// defaults; then apply command-line overrides.
pub fn load_config(global: &GlobalArgs) -> anyhow::Result<CatcellConfig> {
    let mut config = match &global.config {
        Some(path) => CatcellConfig::load(path)
            .with_context(|| format!("Cannot load config: {}", path.display()))?,
        None => CatcellConfig::load_or_default(&PathBuf::from(DEFAULT_CONFIG_FILE))
            .context("Cannot load config")?,
    };
    if global.strict {
        config.run.strict = true;
    }
    tracing::debug!(
        api_root = %config.api_root(),
        strict = config.run.strict,
        "Configuration resolved"
    );
    Ok(config)
}

pub fn connect(config: &CatcellConfig) -> anyhow::Result<HttpCatmaidClient> {
    HttpCatmaidClient::from_config(config).context("Cannot create CATMAID client")
}

pub fn reporter(global: &GlobalArgs) -> Box<dyn ProgressReporter> {
    if global.quiet {
        Box::new(NoopReporter)
    } else {
        Box::new(IndicatifReporter::new())
    }
}

/// Print skipped cells and return the outcome.
pub fn finish(summary: &RunSummary, global: &GlobalArgs) -> Outcome {
    if !global.quiet {
        if summary.unannotated > 0 {
            eprintln!(
                "{} object(s) had no annotations besides their cell number",
                summary.unannotated
            );
        }
        for (cell, err) in &summary.failures {
            eprintln!("Skipped cell {cell}: {err}");
        }
    }
    Outcome::from(summary)
}
