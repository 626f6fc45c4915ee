use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use catcell_core::pipeline::CatcellPipeline;

use super::{GlobalArgs, Outcome};

#[derive(Args, Debug)]
pub struct CentriolesArgs {
    /// Output file (default: output.centriole_locations from the config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Ignore the cache and query CATMAID again
    #[arg(long)]
    pub refresh: bool,

    /// Neither read nor write the cache
    #[arg(long, conflicts_with = "refresh")]
    pub no_cache: bool,
}

pub async fn run(args: CentriolesArgs, global: &GlobalArgs) -> anyhow::Result<Outcome> {
    let config = super::load_config(global)?;
    let output = args
        .output
        .unwrap_or_else(|| config.output.resolve(&config.output.centriole_locations));
    let cache = (!args.no_cache).then(|| config.output.resolve(&config.cache.centrioles));

    let client = super::connect(&config)?;
    let progress = super::reporter(global);
    let pipeline = CatcellPipeline::new(&client, &config).with_progress(progress.as_ref());

    let summary = pipeline
        .run_centriole_report(&output, cache.as_deref(), args.refresh)
        .await
        .context("Centriole locations failed")?;

    if !global.quiet {
        let source = if summary.from_cache { " (cached)" } else { "" };
        println!("Found {} centrioles!{source}", summary.rows);
    }
    Ok(super::finish(&summary, global))
}
