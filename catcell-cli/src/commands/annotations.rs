use anyhow::Context;
use clap::{Args, ValueEnum};

use catcell_core::cells::CellIndex;
use catcell_core::pipeline::CatcellPipeline;

use super::{GlobalArgs, Outcome};

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct AnnotationsArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

pub async fn run(args: AnnotationsArgs, global: &GlobalArgs) -> anyhow::Result<Outcome> {
    let config = super::load_config(global)?;
    let client = super::connect(&config)?;
    let progress = super::reporter(global);
    let pipeline = CatcellPipeline::new(&client, &config).with_progress(progress.as_ref());

    let index = pipeline.index().await.context("Cannot list annotations")?;

    match args.format {
        Format::Json => println!("{}", to_json(&index)),
        Format::Text => print_text(&index),
    }
    Ok(Outcome::Complete)
}

fn to_json(index: &CellIndex) -> serde_json::Value {
    serde_json::json!({
        "cells": index.len(),
        "objects": index.iter().map(|c| c.objects.len()).sum::<usize>(),
        "unannotated": index.unannotated,
        "annotations": index.all_annotations,
    })
}

fn print_text(index: &CellIndex) {
    let objects: usize = index.iter().map(|c| c.objects.len()).sum();
    println!("{} cells, {objects} annotated objects", index.len());
    println!();
    println!("Annotations ({}):", index.all_annotations.len());
    for annotation in &index.all_annotations {
        println!("  {annotation}");
    }
}

#[cfg(test)]
mod tests {
    use catcell_core::catmaid::NeuronEntity;
    use catcell_core::cells::group_cells;

    use super::*;

    #[test]
    fn json_lists_sorted_annotations() {
        let index = group_cells(&[
            NeuronEntity::new("a", 1, ["cell #001", "ML", "cilium"]),
            NeuronEntity::new("b", 2, ["cell #002"]),
            NeuronEntity::new("c", 3, ["EGL boundary"]),
        ])
        .unwrap();
        let json = to_json(&index);
        assert_eq!(json["cells"], 1);
        assert_eq!(json["objects"], 1);
        assert_eq!(json["unannotated"], serde_json::json!(["b"]));
        assert_eq!(
            json["annotations"],
            serde_json::json!(["cilium", "egl boundary", "ml"])
        );
    }
}
