use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ── Typed ID wrappers ──────────────────────────────────────────────

macro_rules! typed_id {
    ($name:ident, $inner:ty) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(id: $inner) -> Self {
                Self(id)
            }
        }
    };
}

typed_id!(SkeletonId, i64);
typed_id!(CellNumber, u32);

// ── Geometry primitives ────────────────────────────────────────────

/// A location in project space (nanometres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// One node of a compact skeleton.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkeletonNode {
    pub id: i64,
    pub parent: Option<i64>,
    pub location: Point3,
}

// ── Annotated objects ──────────────────────────────────────────────

/// Annotation that ties a skeleton to the cell it belongs to.
pub const CELL_NUMBER_MARKER: &str = "cell #";

/// A skeleton object that belongs to a cell.
///
/// `annotations` is lower-cased and never contains the cell-number
/// annotation itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellObject {
    pub skeleton_id: SkeletonId,
    pub annotations: BTreeSet<String>,
    pub name: String,
}

impl CellObject {
    pub fn new<I, S>(skeleton_id: i64, name: &str, annotations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            skeleton_id: SkeletonId(skeleton_id),
            annotations: annotations
                .into_iter()
                .map(|a| a.as_ref().to_lowercase())
                .collect(),
            name: name.to_string(),
        }
    }

    pub fn has(&self, annotation: &str) -> bool {
        self.annotations.contains(annotation)
    }
}

/// All annotated objects sharing one cell number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub number: CellNumber,
    pub objects: Vec<CellObject>,
}

impl Cell {
    /// Objects carrying the given (lower-case) annotation.
    pub fn objects_with<'a>(&'a self, annotation: &'a str) -> impl Iterator<Item = &'a CellObject> {
        self.objects.iter().filter(move |o| o.has(annotation))
    }

    pub fn any_has(&self, annotation: &str) -> bool {
        self.objects.iter().any(|o| o.has(annotation))
    }
}
