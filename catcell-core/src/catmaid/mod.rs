//! Access to the CATMAID REST API.
//!
//! Everything downstream is written against [`CatmaidSource`]; the HTTP
//! client is one implementation, test fixtures are another.

pub mod http;
pub mod wire;

use crate::types::{SkeletonId, SkeletonNode};

pub use http::HttpCatmaidClient;
pub use wire::NeuronEntity;

/// Read-only view of a CATMAID project.
#[async_trait::async_trait]
pub trait CatmaidSource: Send + Sync {
    /// All neuron entities of the project, with their annotations, sorted by
    /// name.
    async fn query_neurons(&self) -> crate::error::Result<Vec<NeuronEntity>>;

    /// The nodes of one skeleton, in the order the service returns them.
    async fn compact_skeleton(&self, id: SkeletonId) -> crate::error::Result<Vec<SkeletonNode>>;
}
