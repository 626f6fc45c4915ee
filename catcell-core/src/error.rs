use crate::types::{CellNumber, SkeletonId};

/// Top-level catcell error type.
///
/// All fallible operations in `catcell-core` return [`Result<T, CatcellError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum CatcellError {
    /// Error talking to the CATMAID service or decoding its responses.
    #[error("CATMAID error: {0}")]
    Catmaid(#[from] CatmaidError),

    /// Annotation data for a cell is malformed or contradictory.
    #[error("Cell error: {0}")]
    Cell(#[from] CellError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error writing a report file.
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// Error reading or writing the centriole cache.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Errors from the CATMAID REST API.
#[derive(thiserror::Error, Debug)]
pub enum CatmaidError {
    /// Network-level failure (connect, TLS, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The service returned a non-success HTTP status.
    #[error("CATMAID API {status} for {url}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
        /// Response body text.
        body: String,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("Response decode error: {0}")]
    Decode(String),

    /// A skeleton does not have the node layout a measurement needs.
    #[error("Skeleton {skeleton} is malformed: {reason}")]
    MalformedSkeleton {
        skeleton: SkeletonId,
        reason: String,
    },

    /// The service kept answering with a transient status.
    #[error("CATMAID API: max retries exceeded for {url} (last status {status})")]
    RetriesExhausted { url: String, status: u16 },
}

/// Errors in the annotation data of one entity or cell.
#[derive(thiserror::Error, Debug)]
pub enum CellError {
    /// A neuron entity does not have the shape the dataset promises.
    #[error("Malformed entity {name:?}: {reason}")]
    MalformedEntity {
        /// Entity display name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two objects of a cell carry mutually exclusive annotations.
    #[error("Cell {cell}: conflicting {field} annotations ({first} vs {second})")]
    Conflict {
        cell: CellNumber,
        /// Statistic being classified, e.g. `"cell type"`.
        field: &'static str,
        first: String,
        second: String,
    },

    /// The same centriole role appears twice in one pair.
    #[error("Cell {cell}: centriole pair {pair} has two {role} centrioles ({first} and {second})")]
    DuplicateCentriole {
        cell: CellNumber,
        pair: char,
        role: &'static str,
        first: SkeletonId,
        second: SkeletonId,
    },

    /// More than one object of the cell is annotated as a cilium.
    #[error("Cell {cell}: more than one cilium ({first} and {second})")]
    DuplicateCilium {
        cell: CellNumber,
        first: SkeletonId,
        second: SkeletonId,
    },
}

/// Errors in catcell configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Filesystem I/O error reading the configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors writing report files.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    /// Filesystem I/O error writing output.
    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// CSV encoding failed.
    #[error("CSV error writing {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

/// Errors from the centriole location cache.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// Filesystem I/O error on the cache file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache contents could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CatcellError {
    /// Whether a failure raised while processing one cell only concerns that
    /// cell, so a lenient run can skip it and continue.
    ///
    /// Rejected credentials fail every request and end the run. The entity
    /// query never goes through this check: its failures always abort.
    pub fn is_cell_scoped(&self) -> bool {
        match self {
            Self::Cell(_) => true,
            Self::Catmaid(CatmaidError::Status { status, .. }) => !matches!(status, 401 | 403),
            Self::Catmaid(_) => true,
            Self::Config(_) | Self::Output(_) | Self::Cache(_) => false,
        }
    }
}

/// Convenience alias for `Result<T, CatcellError>`.
pub type Result<T> = std::result::Result<T, CatcellError>;
