//! Execution log hook.

use async_trait::async_trait;
use tracing::{error, info};

use crate::ExecutionResult;

/// Called once per execution, after the outcome is known, when
/// `log_execution` is set. It observes the result and cannot change it.
#[async_trait]
pub trait ExecutionLogger: Send + Sync {
    async fn record(&self, result: &ExecutionResult);
}

/// Writes one `tracing` event per execution.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingExecutionLogger;

#[async_trait]
impl ExecutionLogger for TracingExecutionLogger {
    async fn record(&self, result: &ExecutionResult) {
        let meta = &result.metadata;
        match &result.error {
            None => info!(
                target: "function_model::execution",
                node_id = %meta.node_id,
                entity_id = %meta.entity_id,
                user_id = %meta.context.user_id,
                attempts = result.attempts,
                elapsed_ms = result.execution_time_ms,
                "execution succeeded"
            ),
            Some(err) => error!(
                target: "function_model::execution",
                node_id = %meta.node_id,
                entity_id = %meta.entity_id,
                user_id = %meta.context.user_id,
                attempts = result.attempts,
                elapsed_ms = result.execution_time_ms,
                reason = %err.reason(),
                "execution failed: {err}"
            ),
        }
    }
}
