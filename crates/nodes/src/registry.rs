//! Type-tag to behavior dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use domain::NodeKind;

use crate::behaviors::{
    IoBehavior, KnowledgeBaseBehavior, NestedModelBehavior, StageBehavior, TetherBehavior,
};
use crate::NodeBehavior;

/// Resolves the behavior for a node type.
///
/// Every kind has a built-in behavior chosen by an exhaustive match, so
/// adding a [`NodeKind`] variant fails to compile until it is handled here.
/// Hosts and tests may override any kind with [`NodeRegistry::register`].
#[derive(Clone, Default)]
pub struct NodeRegistry {
    overrides: HashMap<NodeKind, Arc<dyn NodeBehavior>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the behavior for `behavior.kind()`. Returns the previous
    /// override, if any.
    pub fn register(&mut self, behavior: Arc<dyn NodeBehavior>) -> Option<Arc<dyn NodeBehavior>> {
        let kind = behavior.kind();
        debug!(%kind, "registering node behavior");
        self.overrides.insert(kind, behavior)
    }

    /// Builder form of [`NodeRegistry::register`].
    pub fn with(mut self, behavior: Arc<dyn NodeBehavior>) -> Self {
        self.register(behavior);
        self
    }

    pub fn resolve(&self, kind: NodeKind) -> Arc<dyn NodeBehavior> {
        if let Some(behavior) = self.overrides.get(&kind) {
            return Arc::clone(behavior);
        }
        match kind {
            NodeKind::IoNode => Arc::new(IoBehavior),
            NodeKind::StageNode => Arc::new(StageBehavior),
            NodeKind::TetherNode => Arc::new(TetherBehavior),
            NodeKind::KbNode => Arc::new(KnowledgeBaseBehavior),
            NodeKind::FunctionModelContainer => Arc::new(NestedModelBehavior),
        }
    }

    pub fn is_overridden(&self, kind: NodeKind) -> bool {
        self.overrides.contains_key(&kind)
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.overrides.keys().collect();
        kinds.sort();
        f.debug_struct("NodeRegistry").field("overrides", &kinds).finish()
    }
}
