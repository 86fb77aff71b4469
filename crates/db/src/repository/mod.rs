//! The repository contract the core persists through.
//!
//! Every method returns a `Result`; not-found and constraint violations are
//! ordinary error values. Implementations translate entities to the row
//! shapes in [`crate::models`].

pub mod memory;

use async_trait::async_trait;

use domain::{Link, ModelVersion, Node, NodeId, NodeStatus};

use crate::RepositoryError;

#[async_trait]
pub trait FunctionModelRepository: Send + Sync {
    /// Fetch a live node of the given model.
    async fn get_node(&self, model_id: &str, node_id: &NodeId) -> Result<Node, RepositoryError>;

    /// Live nodes of a model, ordered by `execution_order` then creation.
    async fn find_nodes_by_model_id(&self, model_id: &str) -> Result<Vec<Node>, RepositoryError>;

    /// Insert a new node. Fails if the id was ever used.
    async fn save_node(&self, node: &Node) -> Result<(), RepositoryError>;

    /// Overwrite a live node.
    async fn update_node(&self, node: &Node) -> Result<(), RepositoryError>;

    /// Logically delete a node. The id stays reserved.
    async fn delete_node(&self, model_id: &str, node_id: &NodeId) -> Result<(), RepositoryError>;

    /// Atomically check that the node is in `expected` and walk it through
    /// `path`, all or nothing. `Idle` in the path is a reset.
    ///
    /// # Errors
    /// [`RepositoryError::StatusConflict`] if the current status differs
    /// from `expected`; a domain error if any step is illegal.
    async fn transition_status(
        &self,
        node_id: &NodeId,
        expected: NodeStatus,
        path: &[NodeStatus],
    ) -> Result<Node, RepositoryError>;

    /// Insert a link, keeping the same-model link graph acyclic.
    async fn save_link(&self, link: &Link) -> Result<(), RepositoryError>;

    /// Links with either end in the model, in insertion order.
    async fn find_links_by_model_id(&self, model_id: &str) -> Result<Vec<Link>, RepositoryError>;

    /// Versions of a model, oldest first.
    async fn get_versions(&self, model_id: &str) -> Result<Vec<ModelVersion>, RepositoryError>;

    /// Append a version. Its number must follow the latest one.
    async fn create_version(&self, version: &ModelVersion) -> Result<(), RepositoryError>;
}
