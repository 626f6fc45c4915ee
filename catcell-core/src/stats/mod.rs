//! Per-cell statistics: the row of `cell_data.csv`.

pub mod measure;

use tracing::instrument;

use crate::catmaid::CatmaidSource;
use crate::classify::{
    self, CellCyclePhase, CellStage, CellType, CentriolePair, CentrioleState, CiliumKind, Location,
};
use crate::types::{Cell, CellNumber};

use measure::SkeletonFetcher;

/// Column headers of the cell statistics report, in row order.
pub const COLUMNS: [&str; 15] = [
    "Cell",
    "Basal body",
    "Distance A",
    "Depth A",
    "Distance B",
    "Depth B",
    "Distance AB",
    "Cilia length",
    "Centriole",
    "Cilium",
    "Cell type",
    "Location",
    "Cell Cycle",
    "migrating",
    "Cell stage",
];

/// Everything measured for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellStats {
    pub cell: CellNumber,
    pub basal_body: bool,
    pub distance_a: Option<f64>,
    pub depth_a: Option<f64>,
    pub distance_b: Option<f64>,
    pub depth_b: Option<f64>,
    pub distance_ab: Option<f64>,
    pub cilia_length: f64,
    pub centriole: Option<CentrioleState>,
    pub cilium: Option<CiliumKind>,
    pub cell_type: CellType,
    pub location: Option<Location>,
    pub cell_cycle: Option<CellCyclePhase>,
    pub migrating: bool,
    pub cell_stage: Option<CellStage>,
}

impl CellStats {
    /// Render the row as strings in [`COLUMNS`] order. Absent values are
    /// empty.
    pub fn to_record(&self) -> Vec<String> {
        fn num(v: Option<f64>) -> String {
            v.map(|v| v.to_string()).unwrap_or_default()
        }
        fn label<T: std::fmt::Display>(v: Option<T>) -> String {
            v.map(|v| v.to_string()).unwrap_or_default()
        }

        vec![
            self.cell.to_string(),
            self.basal_body.to_string(),
            num(self.distance_a),
            num(self.depth_a),
            num(self.distance_b),
            num(self.depth_b),
            num(self.distance_ab),
            self.cilia_length.to_string(),
            label(self.centriole),
            label(self.cilium),
            self.cell_type.to_string(),
            label(self.location),
            label(self.cell_cycle),
            self.migrating.to_string(),
            label(self.cell_stage),
        ]
    }
}

/// Classify a cell and measure its centrioles and cilium.
///
/// Annotation conflicts are detected before any skeleton is fetched.
#[instrument(skip_all, fields(cell = %cell.number))]
pub async fn compute_cell_stats(
    source: &dyn CatmaidSource,
    cell: &Cell,
) -> crate::error::Result<CellStats> {
    let centriole = classify::centriole_state(cell)?;
    let cilium = classify::cilium_kind(cell)?;
    let cell_type = classify::cell_type(cell)?;
    let location = classify::location(cell)?;
    let cycle = classify::cell_cycle(cell)?;
    let roles = classify::centriole_roles(cell)?;
    let cilium_skeleton = classify::cilium_skeleton(cell)?;

    let mut fetcher = SkeletonFetcher::new(source);
    let n = cell.number;

    let distance_a = measure::pair_distance(&mut fetcher, n, CentriolePair::A, roles.a).await?;
    let depth_a = measure::mother_depth(&mut fetcher, n, CentriolePair::A, roles.a).await?;
    let distance_b = measure::pair_distance(&mut fetcher, n, CentriolePair::B, roles.b).await?;
    let depth_b = measure::mother_depth(&mut fetcher, n, CentriolePair::B, roles.b).await?;
    let distance_ab = measure::mothers_distance(&mut fetcher, &roles).await?;
    let cilia_length = measure::cilium_length(&mut fetcher, cilium_skeleton).await?;

    Ok(CellStats {
        cell: n,
        basal_body: classify::basal_body(cell),
        distance_a,
        depth_a,
        distance_b,
        depth_b,
        distance_ab,
        cilia_length,
        centriole,
        cilium,
        cell_type,
        location,
        cell_cycle: cycle.phase,
        migrating: classify::migrating(cell),
        cell_stage: cycle.stage,
    })
}
