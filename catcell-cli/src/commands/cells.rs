use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use catcell_core::pipeline::CatcellPipeline;

use super::{GlobalArgs, Outcome};

#[derive(Args, Debug)]
pub struct CellsArgs {
    /// Output CSV (default: output.cell_data from the config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(args: CellsArgs, global: &GlobalArgs) -> anyhow::Result<Outcome> {
    let config = super::load_config(global)?;
    let output = args
        .output
        .unwrap_or_else(|| config.output.resolve(&config.output.cell_data));

    let client = super::connect(&config)?;
    let progress = super::reporter(global);
    let pipeline = CatcellPipeline::new(&client, &config).with_progress(progress.as_ref());

    let summary = pipeline
        .run_cell_report(&output)
        .await
        .context("Cell statistics failed")?;

    if !global.quiet {
        println!(
            "Cell data for {} cell(s) has been written to '{}'",
            summary.rows,
            output.display()
        );
    }
    Ok(super::finish(&summary, global))
}
