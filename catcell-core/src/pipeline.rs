// Pipeline orchestrator: fetch, group, measure and write, with per-cell
// error handling.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use crate::cache;
use crate::catmaid::{CatmaidSource, NeuronEntity};
use crate::cells::{self, CellIndex};
use crate::centrioles::{self, CentrioleLocation};
use crate::config::CatcellConfig;
use crate::error::CatcellError;
use crate::progress::{NoopReporter, ProgressReporter, Stage};
use crate::report;
use crate::stats::{self, CellStats};
use crate::types::CellNumber;
use crate::vectors::{self, CentrioleVector};

/// Outcome of one report run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Cells (or vector lines) considered.
    pub cells: usize,
    /// Rows produced.
    pub rows: usize,
    /// Objects skipped for carrying nothing but a cell number.
    pub unannotated: usize,
    /// Cells skipped because their data could not be processed.
    pub failures: Vec<(CellNumber, CatcellError)>,
    /// Rows came from the centriole cache rather than the service.
    pub from_cache: bool,
    pub output: Option<PathBuf>,
    pub duration: Duration,
}

impl RunSummary {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Runs the reports against one CATMAID project.
pub struct CatcellPipeline<'a> {
    source: &'a dyn CatmaidSource,
    config: &'a CatcellConfig,
    progress: &'a dyn ProgressReporter,
}

impl std::fmt::Debug for CatcellPipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatcellPipeline")
            .field("api_root", &self.config.api_root())
            .field("strict", &self.config.run.strict)
            .finish_non_exhaustive()
    }
}

impl<'a> CatcellPipeline<'a> {
    pub fn new(source: &'a dyn CatmaidSource, config: &'a CatcellConfig) -> Self {
        Self {
            source,
            config,
            progress: &NoopReporter,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    async fn fetch_entities(&self) -> crate::error::Result<Vec<NeuronEntity>> {
        self.progress.begin(Stage::QueryNeurons, None);
        let entities = self.source.query_neurons().await;
        self.progress.end();
        let entities = entities?;
        info!(entities = entities.len(), "Fetched neuron entities");
        Ok(entities)
    }

    /// Fetch every neuron and group them into cells.
    pub async fn index(&self) -> crate::error::Result<CellIndex> {
        let entities = self.fetch_entities().await?;
        Ok(cells::group_cells(&entities)?)
    }

    /// Decide whether a per-cell failure ends the run or only skips the cell.
    fn absorb(
        &self,
        summary: &mut RunSummary,
        cell: CellNumber,
        err: CatcellError,
    ) -> crate::error::Result<()> {
        if self.config.run.strict || !err.is_cell_scoped() {
            return Err(err);
        }
        warn!(cell = %cell, error = %err, "Skipping cell");
        self.progress.skipped(cell, &err.to_string());
        summary.failures.push((cell, err));
        Ok(())
    }

    // ── Cell statistics ─────────────────────────────────────────────

    /// Statistics for every cell, in cell-number order.
    #[instrument(skip_all, name = "cell_stats")]
    pub async fn cell_stats(&self) -> crate::error::Result<(Vec<CellStats>, RunSummary)> {
        let start = Instant::now();
        let index = self.index().await?;
        let mut summary = RunSummary {
            cells: index.len(),
            unannotated: index.unannotated.len(),
            ..RunSummary::default()
        };

        let mut rows = Vec::with_capacity(index.len());
        self.progress
            .begin(Stage::CellStats, Some(index.len() as u64));
        for cell in index.iter() {
            match stats::compute_cell_stats(self.source, cell).await {
                Ok(row) => rows.push(row),
                Err(e) => {
                    if let Err(e) = self.absorb(&mut summary, cell.number, e) {
                        self.progress.end();
                        return Err(e);
                    }
                }
            }
            self.progress.tick();
        }
        self.progress.end();

        summary.rows = rows.len();
        summary.duration = start.elapsed();
        Ok((rows, summary))
    }

    /// Compute cell statistics and write them to `output`.
    pub async fn run_cell_report(&self, output: &Path) -> crate::error::Result<RunSummary> {
        let (rows, mut summary) = self.cell_stats().await?;
        report::write_cell_data(output, &rows)?;
        summary.output = Some(output.to_path_buf());
        info!(
            cells = summary.cells,
            rows = summary.rows,
            skipped = summary.failures.len(),
            duration = ?summary.duration,
            "Cell report complete"
        );
        Ok(summary)
    }

    // ── Centriole locations ─────────────────────────────────────────

    /// Location of every centriole of every cell.
    #[instrument(skip_all, name = "centriole_locations")]
    pub async fn centriole_locations(
        &self,
    ) -> crate::error::Result<(Vec<CentrioleLocation>, RunSummary)> {
        let start = Instant::now();
        let index = self.index().await?;
        let mut summary = RunSummary {
            cells: index.len(),
            unannotated: index.unannotated.len(),
            ..RunSummary::default()
        };

        let mut rows = Vec::new();
        self.progress
            .begin(Stage::CentrioleLocations, Some(index.len() as u64));
        for cell in index.iter() {
            match centrioles::centriole_locations(self.source, cell).await {
                Ok(found) => rows.extend(found),
                Err(e) => {
                    if let Err(e) = self.absorb(&mut summary, cell.number, e) {
                        self.progress.end();
                        return Err(e);
                    }
                }
            }
            self.progress.tick();
        }
        self.progress.end();

        summary.rows = rows.len();
        summary.duration = start.elapsed();
        Ok((rows, summary))
    }

    /// Write centriole locations, serving them from `cache_path` when
    /// present unless `refresh` is set. Fresh results are cached only when
    /// every cell succeeded.
    pub async fn run_centriole_report(
        &self,
        output: &Path,
        cache_path: Option<&Path>,
        refresh: bool,
    ) -> crate::error::Result<RunSummary> {
        let cached = match cache_path {
            Some(path) if !refresh => cache::load_centrioles(path)?,
            _ => None,
        };

        let (rows, mut summary) = if let Some(rows) = cached {
            info!(rows = rows.len(), "Using cached centriole locations");
            let summary = RunSummary {
                rows: rows.len(),
                from_cache: true,
                ..RunSummary::default()
            };
            (rows, summary)
        } else {
            let (rows, summary) = self.centriole_locations().await?;
            if let Some(path) = cache_path {
                if summary.is_partial() {
                    warn!("Not caching centriole locations from a partial run");
                } else {
                    cache::store_centrioles(path, &rows)?;
                }
            }
            (rows, summary)
        };

        report::write_centriole_locations(output, &rows)?;
        summary.output = Some(output.to_path_buf());
        info!(centrioles = rows.len(), "Centriole report complete");
        Ok(summary)
    }

    // ── Centriole vectors ───────────────────────────────────────────

    /// Measure every `centriole vector line` skeleton.
    #[instrument(skip_all, name = "centriole_vectors")]
    pub async fn centriole_vectors(
        &self,
    ) -> crate::error::Result<(Vec<CentrioleVector>, RunSummary)> {
        let start = Instant::now();
        let entities = self.fetch_entities().await?;
        let lines = cells::select_vector_lines(&entities)?;
        let mut summary = RunSummary {
            cells: lines.len(),
            ..RunSummary::default()
        };

        let mut rows = Vec::with_capacity(lines.len());
        self.progress
            .begin(Stage::CentrioleVectors, Some(lines.len() as u64));
        for line in &lines {
            match vectors::measure_vector(self.source, *line).await {
                Ok(v) => rows.push(v),
                Err(e) => {
                    if let Err(e) = self.absorb(&mut summary, line.cell, e) {
                        self.progress.end();
                        return Err(e);
                    }
                }
            }
            self.progress.tick();
        }
        self.progress.end();

        summary.rows = rows.len();
        summary.duration = start.elapsed();
        Ok((rows, summary))
    }

    pub async fn run_vector_report(&self, output: &Path) -> crate::error::Result<RunSummary> {
        let (rows, mut summary) = self.centriole_vectors().await?;
        report::write_centriole_vectors(output, &rows)?;
        summary.output = Some(output.to_path_buf());
        info!(vectors = rows.len(), "Vector report complete");
        Ok(summary)
    }
}
