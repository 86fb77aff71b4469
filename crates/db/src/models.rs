//! Row structs that map 1-to-1 onto storage tables.
//!
//! These are *persistence* models: snake_case columns, enums stored as
//! their string form, and the structured parts of an entity kept as JSON
//! blobs. Translation to and from the `domain` entities is lossless.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use domain::{
    DomainError, ExecutionMode, FeatureType, Link, LinkId, LinkType, ModelVersion, Node,
    NodeConfiguration, NodeId, NodeKind, NodeMetadata, NodeStatus, Position, RetryPolicy,
    VersionMetadata,
};

use crate::RepositoryError;

fn parse_enum<T: FromStr>(kind: &'static str, value: &str) -> Result<T, RepositoryError> {
    T::from_str(value).map_err(|_| {
        RepositoryError::Domain(DomainError::UnknownVariant {
            kind,
            value: value.to_owned(),
        })
    })
}

// ---------------------------------------------------------------------------
// function_model_nodes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRow {
    pub node_id: Uuid,
    pub parent_node_id: Option<Uuid>,
    pub model_id: String,
    pub name: String,
    pub description: String,
    pub position_x: f64,
    pub position_y: f64,
    /// Type tag, e.g. `stageNode`. Must agree with `configuration`.
    pub node_type: String,
    pub status: String,
    pub execution_order: i64,
    pub execution_mode: String,
    pub priority: i32,
    pub configuration: Value,
    pub retry_policy: Option<Value>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<&Node> for NodeRow {
    type Error = RepositoryError;

    fn try_from(node: &Node) -> Result<Self, Self::Error> {
        Ok(Self {
            node_id: node.id.as_uuid(),
            parent_node_id: node.parent_id.map(|p| p.as_uuid()),
            model_id: node.model_id.clone(),
            name: node.name.clone(),
            description: node.description.clone(),
            position_x: node.position.x,
            position_y: node.position.y,
            node_type: node.kind().to_string(),
            status: node.status.to_string(),
            execution_order: i64::from(node.execution_order),
            execution_mode: node.execution_mode.to_string(),
            priority: node.priority,
            configuration: serde_json::to_value(&node.configuration)?,
            retry_policy: node
                .retry_policy
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
            metadata: serde_json::to_value(&node.metadata)?,
            created_at: node.created_at,
            updated_at: node.updated_at,
            deleted_at: node.deleted_at,
        })
    }
}

impl TryFrom<NodeRow> for Node {
    type Error = RepositoryError;

    fn try_from(row: NodeRow) -> Result<Self, Self::Error> {
        let declared: NodeKind = parse_enum("node type", &row.node_type)?;
        let configuration: NodeConfiguration = serde_json::from_value(row.configuration)?;
        if configuration.kind() != declared {
            return Err(DomainError::ConfigurationMismatch {
                expected: declared,
                found: configuration.kind(),
            }
            .into());
        }
        let retry_policy: Option<RetryPolicy> =
            row.retry_policy.map(serde_json::from_value).transpose()?;
        let metadata: NodeMetadata = serde_json::from_value(row.metadata)?;
        let execution_order = u32::try_from(row.execution_order).map_err(|_| {
            RepositoryError::Translation(format!(
                "execution_order {} out of range",
                row.execution_order
            ))
        })?;

        Ok(Node {
            id: NodeId::from(row.node_id),
            parent_id: row.parent_node_id.map(NodeId::from),
            model_id: row.model_id,
            name: row.name,
            description: row.description,
            position: Position {
                x: row.position_x,
                y: row.position_y,
            },
            status: parse_enum::<NodeStatus>("node status", &row.status)?,
            execution_order,
            execution_mode: parse_enum::<ExecutionMode>("execution mode", &row.execution_mode)?,
            priority: row.priority,
            configuration,
            retry_policy,
            metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

// ---------------------------------------------------------------------------
// function_model_links
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRow {
    pub link_id: Uuid,
    pub source_feature: String,
    pub target_feature: String,
    pub source_entity_id: String,
    pub target_entity_id: String,
    pub source_node_id: Option<Uuid>,
    pub target_node_id: Option<Uuid>,
    pub link_type: String,
    pub link_strength: f64,
    pub link_context: Value,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl TryFrom<&Link> for LinkRow {
    type Error = RepositoryError;

    fn try_from(link: &Link) -> Result<Self, Self::Error> {
        Ok(Self {
            link_id: link.link_id.as_uuid(),
            source_feature: link.source_feature.to_string(),
            target_feature: link.target_feature.to_string(),
            source_entity_id: link.source_entity_id.clone(),
            target_entity_id: link.target_entity_id.clone(),
            source_node_id: link.source_node_id.map(|n| n.as_uuid()),
            target_node_id: link.target_node_id.map(|n| n.as_uuid()),
            link_type: link.link_type.to_string(),
            link_strength: link.link_strength,
            link_context: serde_json::to_value(&link.link_context)?,
            created_at: link.created_at,
            created_by: link.created_by.clone(),
        })
    }
}

impl TryFrom<LinkRow> for Link {
    type Error = RepositoryError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        Ok(Link {
            link_id: LinkId::from(row.link_id),
            source_feature: parse_enum::<FeatureType>("feature", &row.source_feature)?,
            target_feature: parse_enum::<FeatureType>("feature", &row.target_feature)?,
            source_entity_id: row.source_entity_id,
            target_entity_id: row.target_entity_id,
            source_node_id: row.source_node_id.map(NodeId::from),
            target_node_id: row.target_node_id.map(NodeId::from),
            link_type: parse_enum::<LinkType>("link type", &row.link_type)?,
            link_strength: row.link_strength,
            link_context: serde_json::from_value(row.link_context)?,
            created_at: row.created_at,
            created_by: row.created_by,
        })
    }
}

// ---------------------------------------------------------------------------
// function_model_versions
// ---------------------------------------------------------------------------

/// One frozen model version. The node and link snapshots are stored as
/// arrays of rows, so they go through the same translation as live data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRow {
    pub model_id: String,
    pub version_number: i32,
    pub nodes: Value,
    pub links: Value,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub is_published: bool,
}

impl TryFrom<&ModelVersion> for VersionRow {
    type Error = RepositoryError;

    fn try_from(version: &ModelVersion) -> Result<Self, Self::Error> {
        let nodes = version
            .nodes
            .iter()
            .map(NodeRow::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let links = version
            .links
            .iter()
            .map(LinkRow::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let version_number = i32::try_from(version.version_number).map_err(|_| {
            RepositoryError::Translation(format!(
                "version number {} out of range",
                version.version_number
            ))
        })?;

        Ok(Self {
            model_id: version.model_id.clone(),
            version_number,
            nodes: serde_json::to_value(nodes)?,
            links: serde_json::to_value(links)?,
            metadata: serde_json::to_value(&version.metadata)?,
            created_at: version.created_at,
            created_by: version.created_by.clone(),
            is_published: version.is_published,
        })
    }
}

impl TryFrom<VersionRow> for ModelVersion {
    type Error = RepositoryError;

    fn try_from(row: VersionRow) -> Result<Self, Self::Error> {
        let node_rows: Vec<NodeRow> = serde_json::from_value(row.nodes)?;
        let link_rows: Vec<LinkRow> = serde_json::from_value(row.links)?;
        let metadata: VersionMetadata = serde_json::from_value(row.metadata)?;
        let version_number = u32::try_from(row.version_number).map_err(|_| {
            RepositoryError::Translation(format!(
                "version number {} out of range",
                row.version_number
            ))
        })?;

        Ok(ModelVersion {
            model_id: row.model_id,
            version_number,
            nodes: node_rows
                .into_iter()
                .map(Node::try_from)
                .collect::<Result<_, _>>()?,
            links: link_rows
                .into_iter()
                .map(Link::try_from)
                .collect::<Result<_, _>>()?,
            metadata,
            created_at: row.created_at,
            created_by: row.created_by,
            is_published: row.is_published,
        })
    }
}
