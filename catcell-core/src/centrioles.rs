// Centriole locations across all cells.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catmaid::CatmaidSource;
use crate::classify::CENTRIOLE;
use crate::stats::measure::SkeletonFetcher;
use crate::types::{Cell, SkeletonId};

/// One centriole, located by the first node of its skeleton.
///
/// Coordinates are stored z-first, the order the location file uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentrioleLocation {
    pub z: f64,
    pub y: f64,
    pub x: f64,
    pub skeleton_id: SkeletonId,
}

/// Locate every object of the cell annotated `centriole`.
pub async fn centriole_locations(
    source: &dyn CatmaidSource,
    cell: &Cell,
) -> crate::error::Result<Vec<CentrioleLocation>> {
    let mut fetcher = SkeletonFetcher::new(source);
    let mut rows = Vec::new();
    for object in cell.objects_with(CENTRIOLE) {
        let [z, y, x] = fetcher.first_location(object.skeleton_id).await?.zyx();
        rows.push(CentrioleLocation {
            z,
            y,
            x,
            skeleton_id: object.skeleton_id,
        });
    }
    debug!(cell = %cell.number, centrioles = rows.len(), "Located centrioles");
    Ok(rows)
}
