//! Version history: node-set aggregation, edge counting, diffs, and
//! snapshot creation.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use db::FunctionModelRepository;
use domain::{Complexity, Link, LinkId, ModelVersion, Node, NodeId, NodeStatus, VersionMetadata};

use crate::EngineError;

/// Summarize a node snapshot. `total_edges` is left at zero; compose with
/// [`count_edges`] via [`VersionMetadata::with_total_edges`].
///
/// Complexity starts at `simple`, rises to the highest level any node
/// declares, and stops rising once a node declares `complex`.
pub fn aggregate_version_metadata(nodes: &[Node]) -> VersionMetadata {
    let mut metadata = VersionMetadata::default();
    for node in nodes.iter().filter(|n| !n.is_deleted()) {
        metadata.total_nodes += 1;
        *metadata.node_types.entry(node.kind()).or_insert(0) += 1;
        *metadata.execution_types.entry(node.execution_mode).or_insert(0) += 1;
        metadata.estimated_duration_ms = metadata
            .estimated_duration_ms
            .saturating_add(node.metadata.estimated_duration_ms.unwrap_or(0));

        if metadata.complexity != Complexity::Complex {
            if let Some(declared) = node.metadata.complexity {
                metadata.complexity = metadata.complexity.max(declared);
            }
        }
    }
    metadata
}

/// Number of distinct links.
pub fn count_edges(links: &[Link]) -> usize {
    links.iter().map(|l| l.link_id).collect::<HashSet<_>>().len()
}

/// Ids that differ between two versions of a model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionDiff {
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub modified_nodes: Vec<NodeId>,
    pub added_links: Vec<LinkId>,
    pub removed_links: Vec<LinkId>,
    pub modified_links: Vec<LinkId>,
}

impl VersionDiff {
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.modified_nodes.is_empty()
            && self.added_links.is_empty()
            && self.removed_links.is_empty()
            && self.modified_links.is_empty()
    }
}

/// Compare two versions by id. Execution status and `updated_at` are
/// runtime state and do not count as modifications.
pub fn diff_versions(old: &ModelVersion, new: &ModelVersion) -> VersionDiff {
    let old_nodes: BTreeMap<NodeId, Node> = old.nodes.iter().map(|n| (n.id, structural(n))).collect();
    let new_nodes: BTreeMap<NodeId, Node> = new.nodes.iter().map(|n| (n.id, structural(n))).collect();
    let old_links: BTreeMap<LinkId, &Link> = old.links.iter().map(|l| (l.link_id, l)).collect();
    let new_links: BTreeMap<LinkId, &Link> = new.links.iter().map(|l| (l.link_id, l)).collect();

    let (added_nodes, removed_nodes, modified_nodes) = compare(&old_nodes, &new_nodes);
    let (added_links, removed_links, modified_links) = compare(&old_links, &new_links);
    VersionDiff {
        added_nodes,
        removed_nodes,
        modified_nodes,
        added_links,
        removed_links,
        modified_links,
    }
}

fn structural(node: &Node) -> Node {
    let mut copy = node.clone();
    copy.status = NodeStatus::Idle;
    copy.updated_at = copy.created_at;
    copy
}

fn compare<K: Ord + Copy, V: PartialEq>(
    old: &BTreeMap<K, V>,
    new: &BTreeMap<K, V>,
) -> (Vec<K>, Vec<K>, Vec<K>) {
    let keys: BTreeSet<K> = old.keys().chain(new.keys()).copied().collect();
    let (mut added, mut removed, mut modified) = (Vec::new(), Vec::new(), Vec::new());
    for key in keys {
        match (old.get(&key), new.get(&key)) {
            (None, Some(_)) => added.push(key),
            (Some(_), None) => removed.push(key),
            (Some(a), Some(b)) if a != b => modified.push(key),
            _ => {}
        }
    }
    (added, removed, modified)
}

/// Freeze the model's current nodes and links as its next version.
///
/// # Errors
/// Any repository error, including a lost race for the version number.
pub async fn create_version_snapshot(
    repository: &dyn FunctionModelRepository,
    model_id: &str,
    created_by: &str,
) -> Result<ModelVersion, EngineError> {
    let nodes = repository.find_nodes_by_model_id(model_id).await?;
    let links = repository.find_links_by_model_id(model_id).await?;
    let version_number = repository
        .get_versions(model_id)
        .await?
        .last()
        .map_or(1, |v| v.version_number + 1);

    let metadata = aggregate_version_metadata(&nodes).with_total_edges(count_edges(&links));
    let version = ModelVersion {
        model_id: model_id.to_owned(),
        version_number,
        nodes,
        links,
        metadata,
        created_at: Utc::now(),
        created_by: created_by.to_owned(),
        is_published: false,
    };
    repository.create_version(&version).await?;
    info!(
        %model_id,
        version = version_number,
        nodes = version.metadata.total_nodes,
        edges = version.metadata.total_edges,
        "version snapshot created"
    );
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::InMemoryRepository;
    use domain::{
        ExecutionMode, IoConfiguration, IoType, LinkProps, NodeConfiguration, NodeKind,
        NodeMetadata, NodeProps, StageConfiguration,
    };

    const MODEL: &str = "release";

    fn io(duration: Option<u64>, complexity: Option<Complexity>) -> Node {
        Node::create(
            NodeProps::new(
                MODEL,
                "Input",
                NodeConfiguration::IoNode(IoConfiguration {
                    io_type: IoType::Input,
                    data_contract: vec![],
                    container: Default::default(),
                }),
            )
            .with_metadata(NodeMetadata {
                estimated_duration_ms: duration,
                complexity,
                tags: vec![],
            }),
        )
        .unwrap()
    }

    fn stage(duration: Option<u64>, complexity: Option<Complexity>) -> Node {
        Node::create(
            NodeProps::new(
                MODEL,
                "Stage",
                NodeConfiguration::StageNode(StageConfiguration {
                    stage_type: "build".into(),
                    container: Default::default(),
                }),
            )
            .with_execution_mode(ExecutionMode::Parallel)
            .with_metadata(NodeMetadata {
                estimated_duration_ms: duration,
                complexity,
                tags: vec![],
            }),
        )
        .unwrap()
    }

    #[test]
    fn aggregates_counts_duration_and_complexity() {
        let meta = aggregate_version_metadata(&[
            io(Some(10), Some(Complexity::Simple)),
            stage(Some(20), Some(Complexity::Complex)),
        ]);
        assert_eq!(meta.total_nodes, 2);
        assert_eq!(meta.total_edges, 0);
        assert_eq!(meta.estimated_duration_ms, 30);
        assert_eq!(meta.complexity, Complexity::Complex);
        assert_eq!(meta.node_types.get(&NodeKind::IoNode), Some(&1));
        assert_eq!(meta.node_types.get(&NodeKind::StageNode), Some(&1));
        assert_eq!(meta.execution_types.get(&ExecutionMode::Sequential), Some(&1));
        assert_eq!(meta.execution_types.get(&ExecutionMode::Parallel), Some(&1));
    }

    #[test]
    fn absent_estimates_count_as_zero() {
        let meta = aggregate_version_metadata(&[io(None, None), stage(Some(5), None)]);
        assert_eq!(meta.estimated_duration_ms, 5);
        assert_eq!(meta.complexity, Complexity::Simple);
    }

    #[test]
    fn complex_dominates_regardless_of_order() {
        let meta = aggregate_version_metadata(&[
            stage(None, Some(Complexity::Complex)),
            io(None, Some(Complexity::Moderate)),
        ]);
        assert_eq!(meta.complexity, Complexity::Complex);

        let moderate = aggregate_version_metadata(&[
            io(None, Some(Complexity::Moderate)),
            io(None, Some(Complexity::Simple)),
        ]);
        assert_eq!(moderate.complexity, Complexity::Moderate);
    }

    #[test]
    fn edge_count_composes_with_aggregation() {
        let (a, b) = (stage(None, None), stage(None, None));
        let link = Link::create(LinkProps::node_link(MODEL, a.id, b.id)).unwrap();
        let meta = aggregate_version_metadata(&[a, b])
            .with_total_edges(count_edges(&[link.clone(), link]));
        assert_eq!(meta.total_edges, 1);
        assert_eq!(meta.total_nodes, 2);
    }

    #[test]
    fn diff_reports_changes_by_id() {
        let (kept, dropped) = (io(None, None), stage(None, None));
        let old = ModelVersion {
            model_id: MODEL.into(),
            version_number: 1,
            nodes: vec![kept.clone(), dropped.clone()],
            links: vec![],
            metadata: VersionMetadata::default(),
            created_at: Utc::now(),
            created_by: "alice".into(),
            is_published: true,
        };

        let mut renamed = kept.clone();
        renamed.update_name("Renamed input").unwrap();
        let mut running = dropped.clone();
        running.transition_to(NodeStatus::Running).unwrap();
        let added = stage(None, None);

        let mut new = old.clone();
        new.version_number = 2;
        new.nodes = vec![renamed, added.clone()];
        assert_eq!(
            diff_versions(&old, &new),
            VersionDiff {
                added_nodes: vec![added.id],
                removed_nodes: vec![dropped.id],
                modified_nodes: vec![kept.id],
                ..VersionDiff::default()
            }
        );

        let mut status_only = old.clone();
        status_only.nodes = vec![kept, running];
        assert!(diff_versions(&old, &status_only).is_empty());
    }

    #[tokio::test]
    async fn snapshots_are_numbered_sequentially() {
        let (a, b) = (stage(Some(7), None), io(Some(3), None));
        let link = Link::create(LinkProps::node_link(MODEL, a.id, b.id)).unwrap();
        let repo = InMemoryRepository::seed(&[a, b], &[link]).await.unwrap();

        let first = create_version_snapshot(&repo, MODEL, "alice").await.unwrap();
        let second = create_version_snapshot(&repo, MODEL, "bob").await.unwrap();

        assert_eq!(first.version_number, 1);
        assert_eq!(second.version_number, 2);
        assert_eq!(second.metadata.total_nodes, 2);
        assert_eq!(second.metadata.total_edges, 1);
        assert_eq!(second.metadata.estimated_duration_ms, 10);
        assert_eq!(repo.get_versions(MODEL).await.unwrap(), vec![first, second]);
    }
}
