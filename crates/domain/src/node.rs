//! Node entity.
//!
//! Nodes are created through [`Node::create`] and changed only through the
//! mutators below. Every mutator validates the piece it touches before
//! writing, so a failed call leaves the node exactly as it was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    ContextInheritance, DomainError, ExecutionPolicy, IntegrationStyle, NodeConfiguration,
    NodeId, NodeKind, NodeStatus, OrchestrationMode, RetryPolicy,
};

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// Canvas position. Carried for round-tripping only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Scheduling discipline for a container's children.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
    Conditional,
    Priority,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Complexity {
    #[default]
    Simple,
    Moderate,
    Complex,
}

/// Planning hints consumed by version aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(default)]
    pub estimated_duration_ms: Option<u64>,
    #[serde(default)]
    pub complexity: Option<Complexity>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input to [`Node::create`].
#[derive(Debug, Clone)]
pub struct NodeProps {
    pub model_id: String,
    pub parent_id: Option<NodeId>,
    pub name: String,
    pub description: String,
    pub position: Position,
    pub execution_order: u32,
    pub execution_mode: ExecutionMode,
    pub priority: i32,
    pub configuration: NodeConfiguration,
    pub retry_policy: Option<RetryPolicy>,
    pub metadata: NodeMetadata,
}

impl NodeProps {
    /// Props with defaults for everything except the identifying fields.
    pub fn new(
        model_id: impl Into<String>,
        name: impl Into<String>,
        configuration: NodeConfiguration,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            parent_id: None,
            name: name.into(),
            description: String::new(),
            position: Position::default(),
            execution_order: 0,
            execution_mode: ExecutionMode::default(),
            priority: 0,
            configuration,
            retry_policy: None,
            metadata: NodeMetadata::default(),
        }
    }

    pub fn with_parent(mut self, parent_id: NodeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_execution_order(mut self, order: u32) -> Self {
        self.execution_order = order;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn with_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub model_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub execution_order: u32,
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    #[serde(default)]
    pub priority: i32,
    pub configuration: NodeConfiguration,
    #[serde(default)]
    pub retry_policy: Option<RetryPolicy>,
    #[serde(default)]
    pub metadata: NodeMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Node {
    /// Create a node with a fresh id in `idle` status.
    ///
    /// # Errors
    /// - [`DomainError::EmptyName`] for a blank name.
    /// - [`DomainError::InvalidConfiguration`] for a malformed payload.
    /// - [`DomainError::InvalidRetryPolicy`] for an out-of-bounds policy.
    /// - [`DomainError::InvalidParent`] when a container has a parent or an
    ///   action has none.
    pub fn create(props: NodeProps) -> Result<Self, DomainError> {
        let now = Utc::now();
        let node = Self {
            id: NodeId::new(),
            parent_id: props.parent_id,
            model_id: props.model_id,
            name: props.name,
            description: props.description,
            position: props.position,
            status: NodeStatus::Idle,
            execution_order: props.execution_order,
            execution_mode: props.execution_mode,
            priority: props.priority,
            configuration: props.configuration,
            retry_policy: props.retry_policy,
            metadata: props.metadata,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        node.validate()?;
        Ok(node)
    }

    /// Check every entity invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_name(&self.name)?;
        if self.model_id.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration {
                field: "model_id",
                reason: "required".into(),
            });
        }
        self.configuration.validate()?;
        if let Some(policy) = &self.retry_policy {
            policy.validate()?;
        }
        self.validate_parent()
    }

    fn validate_parent(&self) -> Result<(), DomainError> {
        match (self.kind().is_container(), self.parent_id) {
            (true, Some(_)) => Err(DomainError::InvalidParent {
                node_id: self.id,
                reason: "container nodes cannot have a parent".into(),
            }),
            (false, None) => Err(DomainError::InvalidParent {
                node_id: self.id,
                reason: "action nodes must reference a container".into(),
            }),
            (false, Some(parent)) if parent == self.id => Err(DomainError::InvalidParent {
                node_id: self.id,
                reason: "a node cannot be its own parent".into(),
            }),
            _ => Ok(()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.configuration.kind()
    }

    pub fn is_container(&self) -> bool {
        self.kind().is_container()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    // ------------------------------------------------------------------
    // Plain field mutators
    // ------------------------------------------------------------------

    pub fn update_name(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        let name = name.into();
        validate_name(&name)?;
        self.name = name;
        self.touch();
        Ok(())
    }

    pub fn update_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.touch();
    }

    pub fn update_position(&mut self, position: Position) {
        self.position = position;
        self.touch();
    }

    pub fn update_execution_mode(&mut self, mode: ExecutionMode) {
        self.execution_mode = mode;
        self.touch();
    }

    pub fn update_priority(&mut self, priority: i32) {
        self.priority = priority;
        self.touch();
    }

    pub fn update_execution_order(&mut self, order: u32) {
        self.execution_order = order;
        self.touch();
    }

    pub fn set_retry_policy(&mut self, policy: Option<RetryPolicy>) -> Result<(), DomainError> {
        if let Some(policy) = &policy {
            policy.validate()?;
        }
        self.retry_policy = policy;
        self.touch();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Container sub-object mutators
    // ------------------------------------------------------------------

    pub fn update_orchestration_mode(&mut self, mode: OrchestrationMode) -> Result<(), DomainError> {
        self.container_mut()?.orchestration_mode = mode;
        self.touch();
        Ok(())
    }

    /// Set the orchestration mode from a bare integration style string such
    /// as `"embedded"`. Communication and state management take the defaults
    /// documented on [`OrchestrationMode::from_style`].
    pub fn update_orchestration_style(&mut self, style: &str) -> Result<(), DomainError> {
        let style: IntegrationStyle = style.parse().map_err(|_| DomainError::UnknownVariant {
            kind: "integration style",
            value: style.to_owned(),
        })?;
        self.update_orchestration_mode(OrchestrationMode::from_style(style))
    }

    pub fn update_execution_policy(&mut self, policy: ExecutionPolicy) -> Result<(), DomainError> {
        policy.validate()?;
        self.container_mut()?.execution_policy = policy;
        self.touch();
        Ok(())
    }

    pub fn update_context_inheritance(
        &mut self,
        inheritance: ContextInheritance,
    ) -> Result<(), DomainError> {
        inheritance.validate()?;
        self.container_mut()?.context_inheritance = inheritance;
        self.touch();
        Ok(())
    }

    /// Add a context id to the inherited set. Adding an id that is already
    /// present succeeds without changing anything.
    pub fn add_inherited_context(&mut self, context_id: &str) -> Result<(), DomainError> {
        if context_id.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration {
                field: "context_inheritance.inherited_contexts",
                reason: "context id must not be blank".into(),
            });
        }
        let inheritance = &mut self.container_mut()?.context_inheritance;
        if inheritance.inherited_contexts.iter().any(|c| c == context_id) {
            return Ok(());
        }
        inheritance.inherited_contexts.push(context_id.to_owned());
        self.touch();
        Ok(())
    }

    /// Remove a context id. Returns whether it was present.
    pub fn remove_inherited_context(&mut self, context_id: &str) -> Result<bool, DomainError> {
        let inheritance = &mut self.container_mut()?.context_inheritance;
        let before = inheritance.inherited_contexts.len();
        inheritance.inherited_contexts.retain(|c| c != context_id);
        let removed = inheritance.inherited_contexts.len() != before;
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    fn container_mut(&mut self) -> Result<&mut crate::ContainerConfiguration, DomainError> {
        let kind = self.kind();
        let node_id = self.id;
        self.configuration
            .container_mut()
            .ok_or(DomainError::NotAContainer { node_id, kind })
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Move along the status state machine.
    ///
    /// # Errors
    /// [`DomainError::IllegalTransition`] if the move is not allowed.
    pub fn transition_to(&mut self, next: NodeStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    /// Return a settled node to `idle`.
    pub fn reset(&mut self) -> Result<(), DomainError> {
        if !self.status.can_reset() {
            return Err(DomainError::IllegalTransition {
                from: self.status,
                to: NodeStatus::Idle,
            });
        }
        self.status = NodeStatus::Idle;
        self.touch();
        Ok(())
    }

    /// Logically delete the node. Its id is never handed out again.
    pub fn mark_deleted(&mut self) {
        if self.deleted_at.is_none() {
            let now = Utc::now();
            self.deleted_at = Some(now);
            self.updated_at = now;
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::EmptyName);
    }
    Ok(())
}
