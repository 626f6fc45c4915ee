// Integration test utilities and fixture datasets for catcell.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use catcell_core::catmaid::{CatmaidSource, NeuronEntity};
use catcell_core::error::{CatmaidError, Result};
use catcell_core::types::{Point3, SkeletonId, SkeletonNode};

/// In-memory stand-in for a CATMAID project.
#[derive(Debug, Default)]
pub struct FixtureSource {
    entities: Vec<NeuronEntity>,
    skeletons: HashMap<SkeletonId, Vec<SkeletonNode>>,
    fail_query: bool,
    timeouts: HashSet<SkeletonId>,
    requests: Mutex<Vec<SkeletonId>>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity whose skeleton is a single node at `location`.
    pub fn point(mut self, name: &str, id: i64, location: [f64; 3], annotations: &[&str]) -> Self {
        let [x, y, z] = location;
        self.entities
            .push(NeuronEntity::new(name, id, annotations.iter().copied()));
        self.skeletons.insert(
            SkeletonId(id),
            vec![SkeletonNode {
                id: id * 100,
                parent: None,
                location: Point3::new(x, y, z),
            }],
        );
        self
    }

    /// Add an entity whose skeleton is a chain through `points`.
    pub fn chain(mut self, name: &str, id: i64, points: &[[f64; 3]], annotations: &[&str]) -> Self {
        self.entities
            .push(NeuronEntity::new(name, id, annotations.iter().copied()));
        let nodes = points
            .iter()
            .enumerate()
            .map(|(i, [x, y, z])| {
                let node_id = id * 100 + i64::try_from(i).unwrap_or(i64::MAX);
                SkeletonNode {
                    id: node_id,
                    parent: (i > 0).then(|| node_id - 1),
                    location: Point3::new(*x, *y, *z),
                }
            })
            .collect();
        self.skeletons.insert(SkeletonId(id), nodes);
        self
    }

    /// Add an entity with no skeleton behind it.
    pub fn entity(mut self, entity: NeuronEntity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Make `query_neurons` fail with a network error.
    pub fn failing_query(mut self) -> Self {
        self.fail_query = true;
        self
    }

    /// Make fetching skeleton `id` fail as if the request timed out.
    pub fn timing_out(mut self, id: i64) -> Self {
        self.timeouts.insert(SkeletonId(id));
        self
    }

    /// Skeleton ids requested so far, in order.
    pub fn requests(&self) -> Vec<SkeletonId> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait::async_trait]
impl CatmaidSource for FixtureSource {
    async fn query_neurons(&self) -> Result<Vec<NeuronEntity>> {
        if self.fail_query {
            return Err(CatmaidError::Network("connection refused".into()).into());
        }
        let mut entities = self.entities.clone();
        entities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entities)
    }

    async fn compact_skeleton(&self, id: SkeletonId) -> Result<Vec<SkeletonNode>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(id);
        }
        if self.timeouts.contains(&id) {
            let reason = format!("skeleton {id}: operation timed out");
            return Err(CatmaidError::Network(reason).into());
        }
        self.skeletons.get(&id).cloned().ok_or_else(|| {
            CatmaidError::Status {
                status: 404,
                url: format!("fixture/{id}/0/1/compact-skeleton"),
                body: "no such skeleton".into(),
            }
            .into()
        })
    }
}

/// A small reconstruction covering every statistic:
///
/// * cell 1: granule cell in the EGL with both centriole pairs, a surface
///   cilium, docked mother, prophase.
/// * cell 2: Bergmann glia in the ML, one pair, migrating.
/// * cell 3: conflicting location annotations.
/// * an object with only a cell number, and one without any cell.
pub fn cerebellum_fixture() -> FixtureSource {
    FixtureSource::new()
        // cell 1
        .point(
            "c1 mother",
            101,
            [100.0, 2000.0, 50.0],
            &["cell #001", "Mother Centriole", "centriole", "docked centriole"],
        )
        .point(
            "c1 daughter",
            102,
            [103.0, 2004.0, 50.0],
            &["cell #001", "Daughter Centriole", "centriole"],
        )
        .point(
            "c1 mother B",
            103,
            [100.0, 2000.0, 80.0],
            &["cell #001", "Mother Centriole", "centriole"],
        )
        .point(
            "c1 daughter 2",
            104,
            [100.0, 2000.0, 86.0],
            &["cell #001", "Daughter Centriole", "centriole", "B"],
        )
        .chain(
            "c1 cilium",
            105,
            &[[100.0, 2000.0, 50.0], [100.0, 1990.0, 50.0], [100.0, 1990.0, 30.0]],
            &["cell #001", "cilium", "surface cilium"],
        )
        .point(
            "c1 soma",
            106,
            [120.0, 2100.0, 60.0],
            &["cell #001", "Granule Cell", "EGL", "prophase", "mitotic", "basal body"],
        )
        .chain(
            "c1 vector",
            107,
            &[[100.0, 2000.0, 50.0], [100.0, 2010.0, 50.0]],
            &["cell #001", "centriole vector line"],
        )
        // cell 2
        .point(
            "c2 mother",
            201,
            [500.0, 800.0, 10.0],
            &["cell #002", "mother centriole", "centriole", "tethered centriole"],
        )
        .point(
            "c2 daughter",
            202,
            [500.0, 800.0, 18.0],
            &["cell #002", "daughter centriole", "centriole"],
        )
        .point(
            "c2 soma",
            203,
            [510.0, 820.0, 12.0],
            &["cell #002", "Bergmann glia", "ML", "migrating"],
        )
        // cell 3
        .point("c3 a", 301, [0.0, 0.0, 0.0], &["cell #003", "ML"])
        .point("c3 b", 302, [0.0, 0.0, 0.0], &["cell #003", "IGL", "centriole"])
        // noise
        .point("bare", 401, [0.0, 0.0, 0.0], &["cell #004"])
        .point("loose", 501, [0.0, 0.0, 0.0], &["EGL boundary"])
}
