//! Version snapshot value types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Complexity, ExecutionMode, Link, Node, NodeKind};

/// Summary of a node snapshot, stored alongside each version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMetadata {
    pub total_nodes: usize,
    /// Filled in by the caller once edges have been counted.
    pub total_edges: usize,
    pub node_types: BTreeMap<NodeKind, usize>,
    pub execution_types: BTreeMap<ExecutionMode, usize>,
    pub complexity: Complexity,
    /// Sum of per-node estimates, in milliseconds.
    pub estimated_duration_ms: u64,
}

impl VersionMetadata {
    pub fn with_total_edges(mut self, total_edges: usize) -> Self {
        self.total_edges = total_edges;
        self
    }
}

/// A frozen copy of a model's nodes and links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub model_id: String,
    /// Starts at 1 and increases by one per snapshot.
    pub version_number: u32,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub metadata: VersionMetadata,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default)]
    pub is_published: bool,
}

/// A model as handed to validation and tooling: its live nodes and links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub model_id: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}
