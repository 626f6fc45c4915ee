// Centriole orientation from two-node "vector line" skeletons.

use crate::catmaid::CatmaidSource;
use crate::cells::VectorLine;
use crate::error::CatmaidError;
use crate::geometry::VectorOrientation;
use crate::types::{CellNumber, Point3};

/// Mother centriole position and the direction the line points in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentrioleVector {
    pub cell: CellNumber,
    pub origin: Point3,
    pub orientation: VectorOrientation,
}

/// Measure one vector line. Its skeleton must have exactly two nodes; the
/// first is the mother centriole end.
pub async fn measure_vector(
    source: &dyn CatmaidSource,
    line: VectorLine,
) -> crate::error::Result<CentrioleVector> {
    let nodes = source.compact_skeleton(line.skeleton_id).await?;
    let [origin, tip] = nodes.as_slice() else {
        return Err(CatmaidError::MalformedSkeleton {
            skeleton: line.skeleton_id,
            reason: format!("vector line needs 2 nodes, found {}", nodes.len()),
        }
        .into());
    };

    Ok(CentrioleVector {
        cell: line.cell,
        origin: origin.location,
        orientation: VectorOrientation::between(&origin.location, &tip.location),
    })
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;
    use crate::catmaid::NeuronEntity;
    use crate::types::{SkeletonId, SkeletonNode};

    struct LineSource;

    #[async_trait::async_trait]
    impl CatmaidSource for LineSource {
        async fn query_neurons(&self) -> crate::error::Result<Vec<NeuronEntity>> {
            Ok(Vec::new())
        }

        async fn compact_skeleton(
            &self,
            id: SkeletonId,
        ) -> crate::error::Result<Vec<SkeletonNode>> {
            let mut nodes = vec![
                SkeletonNode {
                    id: 1,
                    parent: None,
                    location: Point3::new(10.0, 20.0, 30.0),
                },
                SkeletonNode {
                    id: 2,
                    parent: Some(1),
                    location: Point3::new(10.0, 24.0, 30.0),
                },
            ];
            if id.0 == 99 {
                nodes.pop();
            }
            Ok(nodes)
        }
    }

    #[tokio::test]
    async fn measures_line_from_first_node() {
        let line = VectorLine {
            cell: CellNumber(8),
            skeleton_id: SkeletonId(1),
        };
        let v = measure_vector(&LineSource, line).await.unwrap();
        assert_eq!(v.cell, CellNumber(8));
        assert_eq!(v.origin, Point3::new(10.0, 20.0, 30.0));
        assert!((v.orientation.r - 4.0).abs() < 1e-12);
        assert!((v.orientation.theta - FRAC_PI_2).abs() < 1e-12);
        assert!(v.orientation.phi.abs() < 1e-12);
    }

    #[tokio::test]
    async fn rejects_lines_without_two_nodes() {
        let line = VectorLine {
            cell: CellNumber(8),
            skeleton_id: SkeletonId(99),
        };
        let err = measure_vector(&LineSource, line).await.unwrap_err();
        assert!(err.to_string().contains("needs 2 nodes"), "{err}");
    }
}
