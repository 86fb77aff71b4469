use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use domain::{Node, NodeConfiguration, NodeKind};

use crate::{ExecutionContext, NodeBehavior, NodeError};

use super::mismatch;

/// Workflow stage. A stage does no work of its own; executing it resolves
/// its policy and the contexts its children will inherit.
pub struct StageBehavior;

#[async_trait]
impl NodeBehavior for StageBehavior {
    fn kind(&self) -> NodeKind {
        NodeKind::StageNode
    }

    async fn execute(&self, node: &Node, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let NodeConfiguration::StageNode(stage) = &node.configuration else {
            return Err(mismatch(node, NodeKind::StageNode));
        };
        let container = &stage.container;

        // Every trigger condition must be a truthy parameter.
        let unmet: Vec<&str> = container
            .execution_policy
            .trigger_conditions
            .iter()
            .filter(|c| !is_truthy(ctx.parameter(c)))
            .map(String::as_str)
            .collect();

        debug!(node_id = %node.id, stage_type = %stage.stage_type, "stage resolved");
        Ok(json!({
            "stage": node.name,
            "stageType": stage.stage_type,
            "executionMode": node.execution_mode.as_ref(),
            "triggered": unmet.is_empty(),
            "unmetConditions": unmet,
            "errorHandling": container.execution_policy.error_handling.as_ref(),
            "integrationStyle": container.orchestration_mode.integration_style.as_ref(),
            "inheritedContexts": container.context_inheritance.inherited_contexts,
        }))
    }
}

pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(_)) => true,
    }
}
