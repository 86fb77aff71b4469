//! In-process repository backed by row tables behind a lock.
//!
//! Entities are stored as [`crate::models`] rows, so every read and write
//! goes through the same translation a database-backed store would use.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use domain::{FeatureType, Link, LinkGraph, ModelVersion, Node, NodeId, NodeStatus};

use crate::models::{LinkRow, NodeRow, VersionRow};
use crate::repository::FunctionModelRepository;
use crate::RepositoryError;

#[derive(Debug, Default)]
struct Tables {
    nodes: BTreeMap<Uuid, NodeRow>,
    /// Insertion order is the read order.
    links: Vec<LinkRow>,
    versions: HashMap<String, Vec<VersionRow>>,
}

impl Tables {
    fn live_node(&self, node_id: &NodeId) -> Option<&NodeRow> {
        self.nodes
            .get(&node_id.as_uuid())
            .filter(|row| row.deleted_at.is_none())
    }

    fn check_endpoint(
        &self,
        feature: FeatureType,
        entity_id: &str,
        node_id: Option<NodeId>,
    ) -> Result<(), RepositoryError> {
        let Some(node_id) = node_id else {
            return Ok(());
        };
        if feature != FeatureType::FunctionModel {
            return Ok(());
        }
        match self.live_node(&node_id) {
            Some(row) if row.model_id == entity_id => Ok(()),
            Some(row) => Err(RepositoryError::ConstraintViolation(format!(
                "node '{node_id}' belongs to model '{}', not '{entity_id}'",
                row.model_id
            ))),
            None => Err(RepositoryError::ConstraintViolation(format!(
                "link endpoint node '{node_id}' does not exist"
            ))),
        }
    }
}

/// Thread-safe in-memory [`FunctionModelRepository`].
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load nodes then links, in order, through the normal write path.
    pub async fn seed(nodes: &[Node], links: &[Link]) -> Result<Self, RepositoryError> {
        let repo = Self::new();
        for node in nodes {
            repo.save_node(node).await?;
        }
        for link in links {
            repo.save_link(link).await?;
        }
        Ok(repo)
    }
}

#[async_trait]
impl FunctionModelRepository for InMemoryRepository {
    async fn get_node(&self, model_id: &str, node_id: &NodeId) -> Result<Node, RepositoryError> {
        let tables = self.tables.read().await;
        let row = tables
            .live_node(node_id)
            .filter(|row| row.model_id == model_id)
            .ok_or_else(|| RepositoryError::node_not_found(node_id))?;
        Node::try_from(row.clone())
    }

    async fn find_nodes_by_model_id(&self, model_id: &str) -> Result<Vec<Node>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut nodes = tables
            .nodes
            .values()
            .filter(|row| row.model_id == model_id && row.deleted_at.is_none())
            .cloned()
            .map(Node::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        nodes.sort_by(|a, b| {
            a.execution_order
                .cmp(&b.execution_order)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(nodes)
    }

    async fn save_node(&self, node: &Node) -> Result<(), RepositoryError> {
        node.validate()?;
        let row = NodeRow::try_from(node)?;
        let mut tables = self.tables.write().await;
        if tables.nodes.contains_key(&row.node_id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "node id '{}' already used",
                node.id
            )));
        }
        debug!(node_id = %node.id, model_id = %node.model_id, "node saved");
        tables.nodes.insert(row.node_id, row);
        Ok(())
    }

    async fn update_node(&self, node: &Node) -> Result<(), RepositoryError> {
        node.validate()?;
        let row = NodeRow::try_from(node)?;
        let mut tables = self.tables.write().await;
        if tables.live_node(&node.id).is_none() {
            return Err(RepositoryError::node_not_found(node.id));
        }
        tables.nodes.insert(row.node_id, row);
        Ok(())
    }

    async fn delete_node(&self, model_id: &str, node_id: &NodeId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .nodes
            .get_mut(&node_id.as_uuid())
            .filter(|row| row.deleted_at.is_none() && row.model_id == model_id)
            .ok_or_else(|| RepositoryError::node_not_found(node_id))?;

        let mut node = Node::try_from(row.clone())?;
        node.mark_deleted();
        *row = NodeRow::try_from(&node)?;
        info!(%node_id, %model_id, "node logically deleted");
        Ok(())
    }

    async fn transition_status(
        &self,
        node_id: &NodeId,
        expected: NodeStatus,
        path: &[NodeStatus],
    ) -> Result<Node, RepositoryError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .nodes
            .get_mut(&node_id.as_uuid())
            .filter(|row| row.deleted_at.is_none())
            .ok_or_else(|| RepositoryError::node_not_found(node_id))?;

        let mut node = Node::try_from(row.clone())?;
        if node.status != expected {
            return Err(RepositoryError::StatusConflict {
                expected,
                actual: node.status,
            });
        }
        for &next in path {
            match next {
                NodeStatus::Idle => node.reset()?,
                other => node.transition_to(other)?,
            }
        }
        *row = NodeRow::try_from(&node)?;
        debug!(%node_id, from = %expected, to = %node.status, "status transitioned");
        Ok(node)
    }

    async fn save_link(&self, link: &Link) -> Result<(), RepositoryError> {
        link.validate()?;
        let mut tables = self.tables.write().await;
        tables.check_endpoint(link.source_feature, &link.source_entity_id, link.source_node_id)?;
        tables.check_endpoint(link.target_feature, &link.target_entity_id, link.target_node_id)?;

        let existing = tables
            .links
            .iter()
            .cloned()
            .map(Link::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let mut graph = LinkGraph::from_links(existing)?;
        graph.insert(link.clone())?;

        tables.links.push(LinkRow::try_from(link)?);
        debug!(link_id = %link.link_id, "link saved");
        Ok(())
    }

    async fn find_links_by_model_id(&self, model_id: &str) -> Result<Vec<Link>, RepositoryError> {
        let tables = self.tables.read().await;
        tables
            .links
            .iter()
            .cloned()
            .map(Link::try_from)
            .filter(|link| link.as_ref().map_or(true, |l| l.touches_model(model_id)))
            .collect()
    }

    async fn get_versions(&self, model_id: &str) -> Result<Vec<ModelVersion>, RepositoryError> {
        let tables = self.tables.read().await;
        tables
            .versions
            .get(model_id)
            .into_iter()
            .flatten()
            .cloned()
            .map(ModelVersion::try_from)
            .collect()
    }

    async fn create_version(&self, version: &ModelVersion) -> Result<(), RepositoryError> {
        let row = VersionRow::try_from(version)?;
        let mut tables = self.tables.write().await;
        let history = tables.versions.entry(version.model_id.clone()).or_default();
        let expected = history.last().map_or(1, |v| v.version_number + 1);
        if row.version_number != expected {
            return Err(RepositoryError::ConstraintViolation(format!(
                "model '{}' expects version {expected}, got {}",
                version.model_id, version.version_number
            )));
        }
        info!(model_id = %version.model_id, version = row.version_number, "version created");
        history.push(row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use domain::{
        DomainError, LinkProps, NodeConfiguration, NodeProps, StageConfiguration,
        TetherConfiguration, VersionMetadata,
    };

    const MODEL: &str = "model-1";

    fn stage(name: &str) -> Node {
        Node::create(NodeProps::new(
            MODEL,
            name,
            NodeConfiguration::StageNode(StageConfiguration {
                stage_type: "review".into(),
                container: Default::default(),
            }),
        ))
        .unwrap()
    }

    fn tether(parent: NodeId, order: u32) -> Node {
        Node::create(
            NodeProps::new(
                MODEL,
                format!("tether-{order}"),
                NodeConfiguration::TetherNode(TetherConfiguration {
                    tether_reference_id: "crm".into(),
                    trigger_conditions: vec![],
                    execution_parameters: Default::default(),
                }),
            )
            .with_parent(parent)
            .with_execution_order(order),
        )
        .unwrap()
    }

    fn version(number: u32) -> ModelVersion {
        ModelVersion {
            model_id: MODEL.into(),
            version_number: number,
            nodes: vec![stage("snap")],
            links: vec![],
            metadata: VersionMetadata::default(),
            created_at: Utc::now(),
            created_by: "alice".into(),
            is_published: false,
        }
    }

    #[tokio::test]
    async fn saved_node_reads_back_equal() {
        let repo = InMemoryRepository::new();
        let node = stage("Intake");
        repo.save_node(&node).await.unwrap();
        assert_eq!(repo.get_node(MODEL, &node.id).await.unwrap(), node);
        assert!(matches!(
            repo.get_node("other-model", &node.id).await,
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn nodes_are_listed_by_execution_order() {
        let container = stage("Intake");
        let late = tether(container.id, 5);
        let early = tether(container.id, 1);
        let repo = InMemoryRepository::seed(&[container.clone(), late.clone(), early.clone()], &[])
            .await
            .unwrap();

        let ids: Vec<_> = repo
            .find_nodes_by_model_id(MODEL)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec![container.id, early.id, late.id]);
    }

    #[tokio::test]
    async fn deleted_nodes_are_invisible_and_ids_stay_reserved() {
        let node = stage("Intake");
        let repo = InMemoryRepository::seed(&[node.clone()], &[]).await.unwrap();

        repo.delete_node(MODEL, &node.id).await.unwrap();
        assert!(repo.get_node(MODEL, &node.id).await.is_err());
        assert!(repo.find_nodes_by_model_id(MODEL).await.unwrap().is_empty());
        assert!(matches!(
            repo.save_node(&node).await,
            Err(RepositoryError::ConstraintViolation(_))
        ));
        assert!(repo.update_node(&node).await.is_err());
    }

    #[tokio::test]
    async fn transition_is_compare_and_swap() {
        let node = stage("Intake");
        let repo = InMemoryRepository::seed(&[node.clone()], &[]).await.unwrap();

        let running = repo
            .transition_status(&node.id, NodeStatus::Idle, &[NodeStatus::Running])
            .await
            .unwrap();
        assert_eq!(running.status, NodeStatus::Running);

        let second = repo
            .transition_status(&node.id, NodeStatus::Idle, &[NodeStatus::Running])
            .await;
        assert!(matches!(
            second,
            Err(RepositoryError::StatusConflict {
                actual: NodeStatus::Running,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn illegal_path_leaves_status_untouched() {
        let node = stage("Intake");
        let repo = InMemoryRepository::seed(&[node.clone()], &[]).await.unwrap();

        let err = repo
            .transition_status(
                &node.id,
                NodeStatus::Idle,
                &[NodeStatus::Running, NodeStatus::Retrying],
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Domain(DomainError::IllegalTransition { .. })
        ));
        assert_eq!(
            repo.get_node(MODEL, &node.id).await.unwrap().status,
            NodeStatus::Idle
        );
    }

    #[tokio::test]
    async fn reset_inside_path() {
        let node = stage("Intake");
        let repo = InMemoryRepository::seed(&[node.clone()], &[]).await.unwrap();
        repo.transition_status(
            &node.id,
            NodeStatus::Idle,
            &[NodeStatus::Running, NodeStatus::Completed],
        )
        .await
        .unwrap();

        let again = repo
            .transition_status(
                &node.id,
                NodeStatus::Completed,
                &[NodeStatus::Idle, NodeStatus::Running],
            )
            .await
            .unwrap();
        assert_eq!(again.status, NodeStatus::Running);
    }

    #[tokio::test]
    async fn save_link_rejects_cycles() {
        let container = stage("Intake");
        let (b, c) = (tether(container.id, 1), tether(container.id, 2));
        let forward = [
            Link::create(LinkProps::node_link(MODEL, container.id, b.id)).unwrap(),
            Link::create(LinkProps::node_link(MODEL, b.id, c.id)).unwrap(),
        ];
        let repo = InMemoryRepository::seed(&[container.clone(), b, c.clone()], &forward)
            .await
            .unwrap();

        let back = Link::create(LinkProps::node_link(MODEL, c.id, container.id)).unwrap();
        assert!(matches!(
            repo.save_link(&back).await,
            Err(RepositoryError::Domain(DomainError::CycleDetected { .. }))
        ));
        assert_eq!(repo.find_links_by_model_id(MODEL).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn save_link_requires_existing_endpoints() {
        let container = stage("Intake");
        let repo = InMemoryRepository::seed(&[container.clone()], &[]).await.unwrap();
        let dangling = Link::create(LinkProps::node_link(MODEL, container.id, NodeId::new())).unwrap();
        assert!(matches!(
            repo.save_link(&dangling).await,
            Err(RepositoryError::ConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn versions_must_be_sequential() {
        let repo = InMemoryRepository::new();
        repo.create_version(&version(1)).await.unwrap();
        assert!(repo.create_version(&version(3)).await.is_err());
        repo.create_version(&version(2)).await.unwrap();

        let history = repo.get_versions(MODEL).await.unwrap();
        assert_eq!(
            history.iter().map(|v| v.version_number).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(history[0].nodes.len(), 1);
        assert!(repo.get_versions("unknown").await.unwrap().is_empty());
    }
}
