//! Built-in behaviors, one per node type.

mod io;
mod knowledge_base;
mod nested_model;
mod stage;
mod tether;

pub use io::IoBehavior;
pub use knowledge_base::KnowledgeBaseBehavior;
pub use nested_model::NestedModelBehavior;
pub use stage::StageBehavior;
pub use tether::TetherBehavior;

use domain::{Node, NodeKind};

use crate::NodeError;

/// The registry handed a node to the wrong behavior.
fn mismatch(node: &Node, expected: NodeKind) -> NodeError {
    NodeError::Fatal(format!(
        "node '{}' is a {}, expected {}",
        node.id,
        node.kind(),
        expected
    ))
}
