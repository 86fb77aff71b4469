use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use domain::{IoType, Node, NodeConfiguration, NodeKind};

use crate::{ExecutionContext, NodeBehavior, NodeError};

use super::mismatch;

/// Boundary node: gathers the fields named by its data contract from the
/// context parameters. Input boundaries require every field; output
/// boundaries report whichever fields are present.
pub struct IoBehavior;

#[async_trait]
impl NodeBehavior for IoBehavior {
    fn kind(&self) -> NodeKind {
        NodeKind::IoNode
    }

    async fn execute(&self, node: &Node, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let NodeConfiguration::IoNode(io) = &node.configuration else {
            return Err(mismatch(node, NodeKind::IoNode));
        };

        let mut values = Map::new();
        let mut missing = Vec::new();
        for field in &io.data_contract {
            match ctx.parameter(field) {
                Some(value) => {
                    values.insert(field.clone(), value.clone());
                }
                None => missing.push(field.as_str()),
            }
        }

        if io.io_type != IoType::Output && !missing.is_empty() {
            return Err(NodeError::Fatal(format!(
                "missing input fields: {}",
                missing.join(", ")
            )));
        }

        debug!(node_id = %node.id, fields = values.len(), "io boundary resolved");
        Ok(json!({
            "ioType": io.io_type.as_ref(),
            "values": values,
            "missing": missing,
        }))
    }
}
