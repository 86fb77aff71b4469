use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use domain::{Node, NodeConfiguration, NodeKind};

use crate::{ExecutionContext, NodeBehavior, NodeError};

use super::mismatch;
use super::stage::is_truthy;

/// External integration action.
///
/// The core owns no transport, so dispatching a tether means producing the
/// request the integration layer will send: the configured execution
/// parameters overlaid with the invocation's parameters. When a trigger
/// condition is not satisfied the tether is skipped rather than failed.
pub struct TetherBehavior;

#[async_trait]
impl NodeBehavior for TetherBehavior {
    fn kind(&self) -> NodeKind {
        NodeKind::TetherNode
    }

    async fn execute(&self, node: &Node, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let NodeConfiguration::TetherNode(tether) = &node.configuration else {
            return Err(mismatch(node, NodeKind::TetherNode));
        };

        if let Some(unmet) = tether
            .trigger_conditions
            .iter()
            .find(|c| !is_truthy(ctx.parameter(c)))
        {
            debug!(node_id = %node.id, condition = %unmet, "tether trigger not met");
            return Ok(json!({
                "tetherReferenceId": tether.tether_reference_id,
                "dispatched": false,
                "skippedOn": unmet,
            }));
        }

        let mut parameters: Map<String, Value> = tether
            .execution_parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (k, v) in &ctx.parameters {
            parameters.insert(k.clone(), v.clone());
        }

        info!(
            node_id = %node.id,
            tether = %tether.tether_reference_id,
            environment = %ctx.environment,
            "tether dispatched"
        );
        Ok(json!({
            "tetherReferenceId": tether.tether_reference_id,
            "dispatched": true,
            "environment": ctx.environment.as_ref(),
            "requestedBy": ctx.user_id,
            "parameters": parameters,
        }))
    }
}
