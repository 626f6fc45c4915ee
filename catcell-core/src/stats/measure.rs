// Skeleton-backed measurements for one cell.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::catmaid::CatmaidSource;
use crate::classify::{CentriolePair, CentrioleRoles, PairMembers};
use crate::error::CatmaidError;
use crate::geometry::cable_length;
use crate::types::{CellNumber, Point3, SkeletonId, SkeletonNode};

/// Fetches skeletons on demand, each at most once.
pub struct SkeletonFetcher<'a> {
    source: &'a dyn CatmaidSource,
    fetched: HashMap<SkeletonId, Vec<SkeletonNode>>,
}

impl std::fmt::Debug for SkeletonFetcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkeletonFetcher")
            .field("fetched", &self.fetched.len())
            .finish_non_exhaustive()
    }
}

impl<'a> SkeletonFetcher<'a> {
    pub fn new(source: &'a dyn CatmaidSource) -> Self {
        Self {
            source,
            fetched: HashMap::new(),
        }
    }

    pub async fn nodes(&mut self, id: SkeletonId) -> crate::error::Result<&[SkeletonNode]> {
        if !self.fetched.contains_key(&id) {
            let nodes = self.source.compact_skeleton(id).await?;
            self.fetched.insert(id, nodes);
        }
        Ok(self.fetched.get(&id).map(Vec::as_slice).unwrap_or_default())
    }

    /// Location of the first node.
    pub async fn first_location(&mut self, id: SkeletonId) -> crate::error::Result<Point3> {
        let nodes = self.nodes(id).await?;
        nodes.first().map(|n| n.location).ok_or_else(|| {
            CatmaidError::MalformedSkeleton {
                skeleton: id,
                reason: "skeleton has no nodes".into(),
            }
            .into()
        })
    }

    /// Location of a skeleton that must consist of exactly one node.
    pub async fn point_location(&mut self, id: SkeletonId) -> crate::error::Result<Point3> {
        let nodes = self.nodes(id).await?;
        match nodes {
            [only] => Ok(only.location),
            _ => Err(CatmaidError::MalformedSkeleton {
                skeleton: id,
                reason: format!("expected a single node, found {}", nodes.len()),
            }
            .into()),
        }
    }
}

/// Distance between the mother and daughter of one pair.
pub async fn pair_distance(
    fetcher: &mut SkeletonFetcher<'_>,
    cell: CellNumber,
    pair: CentriolePair,
    members: PairMembers,
) -> crate::error::Result<Option<f64>> {
    let (Some(mother), Some(daughter)) = (members.mother, members.daughter) else {
        // Pair B is optional; only a half-annotated B pair is worth noting.
        let partial = members.mother.is_some() || members.daughter.is_some();
        if pair == CentriolePair::A || partial {
            info!(
                cell = %cell,
                pair = ?pair,
                mother = ?members.mother,
                daughter = ?members.daughter,
                "Centriole pair incomplete"
            );
        }
        return Ok(None);
    };

    let a = fetcher.point_location(mother).await?;
    let b = fetcher.point_location(daughter).await?;
    Ok(Some(a.distance(&b)))
}

/// Depth (y coordinate) of a pair's mother centriole.
pub async fn mother_depth(
    fetcher: &mut SkeletonFetcher<'_>,
    cell: CellNumber,
    pair: CentriolePair,
    members: PairMembers,
) -> crate::error::Result<Option<f64>> {
    let Some(mother) = members.mother else {
        if pair == CentriolePair::A {
            info!(cell = %cell, "No mother centriole in pair A");
        }
        return Ok(None);
    };
    Ok(Some(fetcher.first_location(mother).await?.y))
}

/// Distance between the two mother centrioles.
pub async fn mothers_distance(
    fetcher: &mut SkeletonFetcher<'_>,
    roles: &CentrioleRoles,
) -> crate::error::Result<Option<f64>> {
    let (Some(a), Some(b)) = (roles.a.mother, roles.b.mother) else {
        return Ok(None);
    };
    let a = fetcher.first_location(a).await?;
    let b = fetcher.first_location(b).await?;
    Ok(Some(a.distance(&b)))
}

/// Cable length of the cilium skeleton, zero when the cell has none.
pub async fn cilium_length(
    fetcher: &mut SkeletonFetcher<'_>,
    cilium: Option<SkeletonId>,
) -> crate::error::Result<f64> {
    let Some(id) = cilium else {
        return Ok(0.0);
    };
    let nodes = fetcher.nodes(id).await?;
    let length = cable_length(nodes);
    debug!(skeleton = %id, nodes = nodes.len(), length, "Measured cilium");
    Ok(length)
}
