use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use domain::{Node, NodeConfiguration, NodeKind};

use crate::{ExecutionContext, NodeBehavior, NodeError};

use super::mismatch;

/// Nested function-model container. Builds the child model's input by
/// mapping parent parameters through `context_mapping`; every mapped parent
/// key must be present.
pub struct NestedModelBehavior;

#[async_trait]
impl NodeBehavior for NestedModelBehavior {
    fn kind(&self) -> NodeKind {
        NodeKind::FunctionModelContainer
    }

    async fn execute(&self, node: &Node, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let NodeConfiguration::FunctionModelContainer(nested) = &node.configuration else {
            return Err(mismatch(node, NodeKind::FunctionModelContainer));
        };

        let mut inputs = Map::new();
        for (child_key, parent_key) in &nested.context_mapping {
            let value = ctx.parameter(parent_key).ok_or_else(|| {
                NodeError::Fatal(format!(
                    "parent parameter '{parent_key}' not available for '{child_key}'"
                ))
            })?;
            inputs.insert(child_key.clone(), value.clone());
        }

        debug!(
            node_id = %node.id,
            nested_model = %nested.nested_model_id,
            inputs = inputs.len(),
            "nested model prepared"
        );
        Ok(json!({
            "nestedModelId": nested.nested_model_id,
            "inputs": inputs,
            "outputExtraction": nested.output_extraction,
        }))
    }
}
