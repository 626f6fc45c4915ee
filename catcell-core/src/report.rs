// Flat-file writers for the three reports.

use std::fs::File;
use std::path::Path;

use tracing::info;

use crate::centrioles::CentrioleLocation;
use crate::error::OutputError;
use crate::stats::{COLUMNS, CellStats};
use crate::vectors::CentrioleVector;

fn io_error(path: &Path, source: std::io::Error) -> OutputError {
    OutputError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> OutputError {
    OutputError::Csv {
        path: path.display().to_string(),
        source,
    }
}

fn open_writer(path: &Path, delimiter: u8) -> Result<csv::Writer<File>, OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;
        }
    }
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    Ok(csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(file))
}

fn write_rows<I, R>(path: &Path, delimiter: u8, rows: I) -> Result<usize, OutputError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = open_writer(path, delimiter)?;
    let mut count = 0;
    for row in rows {
        writer.write_record(row).map_err(|e| csv_error(path, e))?;
        count += 1;
    }
    writer.flush().map_err(|e| io_error(path, e))?;
    Ok(count)
}

/// `cell_data.csv`: header plus one row per cell. Returns the number of
/// data rows.
pub fn write_cell_data(path: &Path, stats: &[CellStats]) -> Result<usize, OutputError> {
    let header = COLUMNS.iter().map(|c| (*c).to_string()).collect::<Vec<_>>();
    let rows = std::iter::once(header).chain(stats.iter().map(CellStats::to_record));
    let written = write_rows(path, b',', rows)? - 1;
    info!(path = %path.display(), rows = written, "Cell data written");
    Ok(written)
}

/// `centriole_locs.csv`: space separated `z y x skeleton_id`, no header.
pub fn write_centriole_locations(
    path: &Path,
    rows: &[CentrioleLocation],
) -> Result<usize, OutputError> {
    let records = rows.iter().map(|r| {
        [
            r.z.to_string(),
            r.y.to_string(),
            r.x.to_string(),
            r.skeleton_id.to_string(),
        ]
    });
    let written = write_rows(path, b' ', records)?;
    info!(path = %path.display(), rows = written, "Centriole locations written");
    Ok(written)
}

/// `centriole_vectors.txt`: `cell,x,y,z,theta,phi,r`, no header.
pub fn write_centriole_vectors(
    path: &Path,
    vectors: &[CentrioleVector],
) -> Result<usize, OutputError> {
    let records = vectors.iter().map(|v| {
        [
            v.cell.to_string(),
            v.origin.x.to_string(),
            v.origin.y.to_string(),
            v.origin.z.to_string(),
            v.orientation.theta.to_string(),
            v.orientation.phi.to_string(),
            v.orientation.r.to_string(),
        ]
    });
    let written = write_rows(path, b',', records)?;
    info!(path = %path.display(), rows = written, "Centriole vectors written");
    Ok(written)
}
