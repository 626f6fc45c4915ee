use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use catcell_core::pipeline::CatcellPipeline;

use super::{GlobalArgs, Outcome};

#[derive(Args, Debug)]
pub struct VectorsArgs {
    /// Output file (default: output.centriole_vectors from the config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(args: VectorsArgs, global: &GlobalArgs) -> anyhow::Result<Outcome> {
    let config = super::load_config(global)?;
    let output = args
        .output
        .unwrap_or_else(|| config.output.resolve(&config.output.centriole_vectors));

    let client = super::connect(&config)?;
    let progress = super::reporter(global);
    let pipeline = CatcellPipeline::new(&client, &config).with_progress(progress.as_ref());

    let summary = pipeline
        .run_vector_report(&output)
        .await
        .context("Centriole vectors failed")?;

    if !global.quiet {
        println!(
            "{} centriole vector(s) written to '{}'",
            summary.rows,
            output.display()
        );
    }
    Ok(super::finish(&summary, global))
}
