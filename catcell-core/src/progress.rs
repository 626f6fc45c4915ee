//! Progress reporting for the per-cell loops.
//!
//! The pipeline announces a [`Stage`], ticks once per cell (or vector line)
//! and reports skipped cells. The CLI draws this with [`IndicatifReporter`];
//! library callers get [`NoopReporter`] by default.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::types::CellNumber;

/// A step of a report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    QueryNeurons,
    CellStats,
    CentrioleLocations,
    CentrioleVectors,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Self::QueryNeurons => "Querying neurons",
            Self::CellStats => "Cell stats",
            Self::CentrioleLocations => "Centrioles",
            Self::CentrioleVectors => "Vector lines",
        }
    }

    /// What one tick counts.
    pub fn unit(self) -> &'static str {
        match self {
            Self::CentrioleVectors => "lines",
            _ => "cells",
        }
    }
}

pub trait ProgressReporter: Send + Sync {
    /// Enter `stage`; `units` is the number of ticks expected, if known.
    fn begin(&self, stage: Stage, units: Option<u64>);

    /// One cell or vector line is done, whether it succeeded or not.
    fn tick(&self);

    /// A cell was dropped from the report.
    fn skipped(&self, cell: CellNumber, reason: &str);

    fn end(&self);
}

#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn begin(&self, _stage: Stage, _units: Option<u64>) {}
    fn tick(&self) {}
    fn skipped(&self, _cell: CellNumber, _reason: &str) {}
    fn end(&self) {}
}

const COUNTED_TEMPLATE: &str = "{prefix:>12.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {prefix} {elapsed}";

/// Progress bar on stderr, with a running count of skipped cells.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
    skipped: AtomicU64,
    unit: Mutex<&'static str>,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Counts without drawing.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        Self {
            bar: ProgressBar::with_draw_target(None, target),
            skipped: AtomicU64::new(0),
            unit: Mutex::new(Stage::CellStats.unit()),
        }
    }

    /// Ticks in the current stage.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Cells skipped in the current stage.
    pub fn skipped_count(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    fn summary(&self) -> String {
        let unit = self.unit.lock().map_or("cells", |u| *u);
        match self.skipped_count() {
            0 => unit.to_string(),
            n => format!("{unit}, {n} skipped"),
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn begin(&self, stage: Stage, units: Option<u64>) {
        self.skipped.store(0, Ordering::Relaxed);
        let template = if units.is_some() {
            COUNTED_TEMPLATE
        } else {
            SPINNER_TEMPLATE
        };
        let style = ProgressStyle::with_template(template)
            .map(|s| s.progress_chars("=> "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        self.bar.set_style(style);
        self.bar.set_length(units.unwrap_or(0));
        self.bar.set_prefix(stage.label());
        if let Ok(mut unit) = self.unit.lock() {
            *unit = stage.unit();
        }
        self.bar.set_message(self.summary());
        self.bar.reset();
    }

    fn tick(&self) {
        self.bar.inc(1);
    }

    fn skipped(&self, cell: CellNumber, reason: &str) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        self.bar.println(format!("skipped cell {cell}: {reason}"));
        self.bar.set_message(self.summary());
    }

    fn end(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_labels() {
        assert_eq!(Stage::CellStats.unit(), "cells");
        assert_eq!(Stage::CentrioleVectors.unit(), "lines");
        assert_eq!(Stage::QueryNeurons.label(), "Querying neurons");
    }

    #[test]
    fn counts_ticks_and_skips_per_stage() {
        let reporter = IndicatifReporter::hidden();
        reporter.begin(Stage::CellStats, Some(3));
        reporter.tick();
        reporter.skipped(CellNumber(2), "conflicting location annotations");
        reporter.tick();
        assert_eq!(reporter.position(), 2);
        assert_eq!(reporter.skipped_count(), 1);
        assert_eq!(reporter.bar.message(), "cells, 1 skipped");

        reporter.begin(Stage::CentrioleVectors, Some(1));
        assert_eq!(reporter.position(), 0);
        assert_eq!(reporter.skipped_count(), 0);
        assert_eq!(reporter.bar.message(), "lines");
        reporter.end();
    }
}
