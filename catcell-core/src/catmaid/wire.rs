// Response shapes of the two CATMAID endpoints we consume.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{CatmaidError, Result};
use crate::types::{Point3, SkeletonId, SkeletonNode};

/// One entity of an `annotations/query-targets` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NeuronEntity {
    pub name: String,
    #[serde(default)]
    pub skeleton_ids: Vec<i64>,
    #[serde(default)]
    pub annotations: Vec<AnnotationRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnnotationRef {
    pub name: String,
}

impl NeuronEntity {
    /// Convenience constructor for fixtures.
    pub fn new<I, S>(name: &str, skeleton_id: i64, annotations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            skeleton_ids: vec![skeleton_id],
            annotations: annotations
                .into_iter()
                .map(|a| AnnotationRef { name: a.into() })
                .collect(),
        }
    }

    pub fn annotation_names(&self) -> impl Iterator<Item = &str> {
        self.annotations.iter().map(|a| a.name.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryTargetsResponse {
    pub entities: Vec<NeuronEntity>,
}

/// Form body for `annotations/query-targets`: every neuron, sorted by name,
/// with annotations.
pub const QUERY_TARGETS_BODY: &str =
    "sort_by=name&sort_dir=asc&types[0]=neuron&with_annotations=true&with_timestamps=true";

/// Decode a `compact-skeleton` response.
///
/// The response is a JSON array whose first element is the node list; each
/// node row is `[id, parent_id, user_id, x, y, z, radius, confidence, ...]`.
pub fn parse_compact_skeleton(id: SkeletonId, body: &Value) -> Result<Vec<SkeletonNode>> {
    let rows = body
        .as_array()
        .and_then(|parts| parts.first())
        .and_then(Value::as_array)
        .ok_or_else(|| malformed(id, "response has no node list"))?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| parse_node_row(id, i, row))
        .collect()
}

fn parse_node_row(id: SkeletonId, index: usize, row: &Value) -> Result<SkeletonNode> {
    let fields = row
        .as_array()
        .ok_or_else(|| malformed(id, &format!("node {index} is not an array")))?;
    if fields.len() < 6 {
        return Err(malformed(
            id,
            &format!("node {index} has {} fields, expected at least 6", fields.len()),
        ));
    }

    let node_id = fields[0]
        .as_i64()
        .ok_or_else(|| malformed(id, &format!("node {index} has no integer id")))?;
    let parent = match &fields[1] {
        Value::Null => None,
        v => Some(
            v.as_i64()
                .ok_or_else(|| malformed(id, &format!("node {node_id} has a bad parent")))?,
        ),
    };
    let coord = |k: usize| {
        fields[k]
            .as_f64()
            .ok_or_else(|| malformed(id, &format!("node {node_id} has a non-numeric coordinate")))
    };

    Ok(SkeletonNode {
        id: node_id,
        parent,
        location: Point3::new(coord(3)?, coord(4)?, coord(5)?),
    })
}

fn malformed(skeleton: SkeletonId, reason: &str) -> crate::error::CatcellError {
    CatmaidError::MalformedSkeleton {
        skeleton,
        reason: reason.to_string(),
    }
    .into()
}
