//! catcell core library: CATMAID access, cell grouping, annotation
//! classification, geometry, and report writers.
//!
//! The main entry point is [`pipeline::CatcellPipeline`], which runs the
//! Fetch → Group → Measure → Write pipeline against a
//! [`catmaid::CatmaidSource`].

pub mod cache;
pub mod catmaid;
pub mod cells;
pub mod centrioles;
pub mod classify;
pub mod config;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod stats;
pub mod types;
pub mod vectors;
