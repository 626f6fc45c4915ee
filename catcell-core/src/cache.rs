// On-disk cache of centriole locations, so reruns skip the skeleton fetches.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::centrioles::CentrioleLocation;
use crate::error::CacheError;

/// Bump when [`CentrioleLocation`] changes shape.
pub const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    centrioles: Vec<CentrioleLocation>,
}

/// Load cached centriole rows.
///
/// A missing file, or one written by a different format version, yields
/// `None`; unreadable contents are an error.
pub fn load_centrioles(path: &Path) -> Result<Option<Vec<CentrioleLocation>>, CacheError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let file: CacheFile = serde_json::from_str(&content)?;
    if file.version != CACHE_FORMAT_VERSION {
        warn!(
            path = %path.display(),
            found = file.version,
            expected = CACHE_FORMAT_VERSION,
            "Ignoring centriole cache from another format version"
        );
        return Ok(None);
    }
    debug!(path = %path.display(), rows = file.centrioles.len(), "Loaded centriole cache");
    Ok(Some(file.centrioles))
}

pub fn store_centrioles(path: &Path, rows: &[CentrioleLocation]) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = CacheFile {
        version: CACHE_FORMAT_VERSION,
        centrioles: rows.to_vec(),
    };
    std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
    debug!(path = %path.display(), rows = rows.len(), "Stored centriole cache");
    Ok(())
}
