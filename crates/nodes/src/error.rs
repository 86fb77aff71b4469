//! Node-level error type.

use thiserror::Error;

/// Errors returned by a behavior's `execute` method.
///
/// The orchestrator uses the variant to decide retry behaviour:
/// - `Retryable`: eligible for another attempt under the node's retry policy.
/// - `Fatal`: the execution fails immediately, whatever the policy says.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// Transient failure; the node may be attempted again.
    #[error("retryable node error: {0}")]
    Retryable(String),

    /// Permanent failure; no retry should be attempted.
    #[error("fatal node error: {0}")]
    Fatal(String),
}

impl NodeError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, NodeError::Retryable(_))
    }
}
