// Euclidean measurements on skeleton nodes.

use std::collections::HashMap;

use petgraph::graphmap::UnGraphMap;

use crate::types::{Point3, SkeletonNode};

impl Point3 {
    pub fn distance(&self, other: &Point3) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Components reversed, `[z, y, x]`.
    pub fn zyx(&self) -> [f64; 3] {
        [self.z, self.y, self.x]
    }
}

/// Total length of a skeleton's parent/child edges.
///
/// Edges are undirected and counted once; an edge to a parent that is not
/// part of the node list is ignored.
pub fn cable_length(nodes: &[SkeletonNode]) -> f64 {
    let locations: HashMap<i64, Point3> = nodes.iter().map(|n| (n.id, n.location)).collect();

    let mut graph: UnGraphMap<i64, ()> = UnGraphMap::with_capacity(nodes.len(), nodes.len());
    for node in nodes {
        graph.add_node(node.id);
        if let Some(parent) = node.parent {
            if locations.contains_key(&parent) {
                graph.add_edge(node.id, parent, ());
            }
        }
    }

    graph
        .all_edges()
        .map(|(u, v, _)| locations[&u].distance(&locations[&v]))
        .sum()
}

/// Orientation of the segment from `origin` to `tip` in spherical form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorOrientation {
    /// Polar angle from the +z axis.
    pub theta: f64,
    /// Azimuth, measured as `atan2(dx, dy)`.
    pub phi: f64,
    /// Segment length.
    pub r: f64,
}

impl VectorOrientation {
    pub fn between(origin: &Point3, tip: &Point3) -> Self {
        let (dx, dy, dz) = (tip.x - origin.x, tip.y - origin.y, tip.z - origin.z);
        Self {
            theta: dx.hypot(dy).atan2(dz),
            phi: dx.atan2(dy),
            r: origin.distance(tip),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    use super::*;

    fn node(id: i64, parent: Option<i64>, x: f64, y: f64, z: f64) -> SkeletonNode {
        SkeletonNode {
            id,
            parent,
            location: Point3::new(x, y, z),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 12.0);
        assert!(close(a.distance(&b), 13.0));
    }

    #[test]
    fn zyx_reverses_components() {
        assert_eq!(Point3::new(1.0, 2.0, 3.0).zyx(), [3.0, 2.0, 1.0]);
    }

    #[test]
    fn cable_length_sums_edges() {
        let nodes = vec![
            node(1, None, 0.0, 0.0, 0.0),
            node(2, Some(1), 3.0, 4.0, 0.0),
            node(3, Some(2), 3.0, 4.0, 10.0),
            node(4, Some(2), 3.0, 0.0, 0.0),
        ];
        assert!(close(cable_length(&nodes), 5.0 + 10.0 + 4.0));
    }

    #[test]
    fn cable_length_of_single_node_is_zero() {
        assert!(close(cable_length(&[node(1, None, 5.0, 5.0, 5.0)]), 0.0));
        assert!(close(cable_length(&[]), 0.0));
    }

    #[test]
    fn cable_length_ignores_missing_parent() {
        let nodes = vec![node(1, Some(99), 0.0, 0.0, 0.0), node(2, Some(1), 0.0, 2.0, 0.0)];
        assert!(close(cable_length(&nodes), 2.0));
    }

    #[test]
    fn orientation_along_axes() {
        let o = Point3::default();
        let up = VectorOrientation::between(&o, &Point3::new(0.0, 0.0, 2.0));
        assert!(close(up.theta, 0.0));
        assert!(close(up.r, 2.0));

        let along_y = VectorOrientation::between(&o, &Point3::new(0.0, 1.0, 0.0));
        assert!(close(along_y.theta, FRAC_PI_2));
        assert!(close(along_y.phi, 0.0));

        let along_x = VectorOrientation::between(&o, &Point3::new(1.0, 0.0, 0.0));
        assert!(close(along_x.phi, FRAC_PI_2));

        let diagonal = VectorOrientation::between(&o, &Point3::new(1.0, 1.0, 0.0));
        assert!(close(diagonal.phi, FRAC_PI_4));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_point() -> impl Strategy<Value = Point3> {
            (-1e5f64..1e5, -1e5f64..1e5, -1e5f64..1e5).prop_map(|(x, y, z)| Point3::new(x, y, z))
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            #[test]
            fn distance_is_symmetric(a in arb_point(), b in arb_point()) {
                prop_assert!((a.distance(&b) - b.distance(&a)).abs() < 1e-6);
            }

            #[test]
            fn theta_stays_in_half_turn(a in arb_point(), b in arb_point()) {
                let o = VectorOrientation::between(&a, &b);
                prop_assert!(o.theta >= 0.0 && o.theta <= std::f64::consts::PI);
                prop_assert!(o.r >= 0.0);
            }

            #[test]
            fn chain_length_matches_pairwise_sum(
                points in prop::collection::vec(arb_point(), 1..20)
            ) {
                let nodes: Vec<SkeletonNode> = points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| SkeletonNode {
                        id: i as i64,
                        parent: (i > 0).then(|| i as i64 - 1),
                        location: *p,
                    })
                    .collect();
                let expected: f64 = points.windows(2).map(|w| w[0].distance(&w[1])).sum();
                prop_assert!((cable_length(&nodes) - expected).abs() < 1e-6 * expected.max(1.0));
            }
        }
    }
}
