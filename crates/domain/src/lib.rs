//! `domain` crate: node and link entities, retry policy, status state
//! machine, and the link graph that keeps same-model edges acyclic.
//!
//! Nothing here performs I/O. Entities are referenced by id only; the
//! [`LinkGraph`] is the arena the other crates traverse.

pub mod configuration;
pub mod error;
pub mod ids;
pub mod link;
pub mod link_graph;
pub mod node;
pub mod retry;
pub mod status;
pub mod version;

pub use configuration::{
    CommunicationPattern, ContainerConfiguration, ContextInheritance, ContextIsolation,
    ErrorHandling, ExecutionPolicy, IntegrationStyle, IoConfiguration, IoType, KbAccessType,
    KbConfiguration, NestedModelConfiguration, NodeConfiguration, NodeKind, OrchestrationMode,
    StageConfiguration, StateManagement, TetherConfiguration,
};
pub use error::DomainError;
pub use ids::{LinkId, NodeId};
pub use link::{FeatureType, Link, LinkProps, LinkType};
pub use link_graph::LinkGraph;
pub use node::{Complexity, ExecutionMode, Node, NodeMetadata, NodeProps, Position};
pub use retry::{BackoffStrategy, RetryPolicy};
pub use status::NodeStatus;
pub use version::{ModelSnapshot, ModelVersion, VersionMetadata};
