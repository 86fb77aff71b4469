//! Domain-level error type.

use thiserror::Error;

use crate::{LinkId, NodeId, NodeKind, NodeStatus};

/// Errors produced when creating or mutating nodes and links.
///
/// Every mutation validates before it writes, so receiving one of these
/// means the entity was left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    // ------ Node errors ------

    /// Node names must contain at least one non-whitespace character.
    #[error("node name must not be empty")]
    EmptyName,

    /// A configuration field is missing or malformed.
    #[error("invalid configuration field '{field}': {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },

    /// The configuration payload belongs to a different node type.
    #[error("configuration for '{found}' does not match node type '{expected}'")]
    ConfigurationMismatch { expected: NodeKind, found: NodeKind },

    /// A container-only mutation was applied to an action node.
    #[error("node '{node_id}' is a {kind}, not a container")]
    NotAContainer { node_id: NodeId, kind: NodeKind },

    /// The retry policy violates one of its bounds.
    #[error("invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    /// The node's parent reference is inconsistent with its kind.
    #[error("invalid parent for node '{node_id}': {reason}")]
    InvalidParent { node_id: NodeId, reason: String },

    /// The status state machine does not allow this move.
    #[error("illegal status transition {from} -> {to}")]
    IllegalTransition { from: NodeStatus, to: NodeStatus },

    /// A string could not be parsed into one of the closed enumerations.
    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    // ------ Link errors ------

    /// Source and target are the same node.
    #[error("link '{0}' points a node at itself")]
    SelfLink(LinkId),

    /// `link_strength` must be a finite value in `[0, 1]`.
    #[error("link strength {0} is outside [0, 1]")]
    LinkStrengthOutOfRange(f64),

    /// An endpoint is not addressable.
    #[error("invalid link endpoint: {0}")]
    InvalidEndpoint(String),

    /// A link with this id is already part of the graph.
    #[error("duplicate link id '{0}'")]
    DuplicateLink(LinkId),

    /// Adding the link would close a cycle among same-model nodes.
    #[error("link '{link_id}' ({source_node} -> {target_node}) would create a cycle")]
    CycleDetected {
        link_id: LinkId,
        source_node: NodeId,
        target_node: NodeId,
    },
}
