//! Per-invocation controls and the uniform result of an execution.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use domain::{FeatureType, NodeId, NodeStatus};
use nodes::ExecutionContext;

use crate::validation::ValidationIssue;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Controls for a single `execute_node` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Run the node-scoped validation pass before dispatching.
    pub validate_before_execute: bool,
    /// Deadline for each attempt. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub retry_on_failure: bool,
    /// Caps the retries the node's policy allows. `None` leaves the policy
    /// in charge.
    pub max_retries: Option<u32>,
    /// Invoke the execution log hook on completion.
    pub log_execution: bool,
    /// Reset a `completed` or `failed` node to `idle` before claiming it.
    /// Without it such a node is rejected with [`ExecutionError::IllegalState`].
    pub reset_settled: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            validate_before_execute: true,
            timeout: None,
            retry_on_failure: true,
            max_retries: None,
            log_execution: false,
            reset_settled: false,
        }
    }
}

impl ExecutionOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn without_validation(mut self) -> Self {
        self.validate_before_execute = false;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_logging(mut self) -> Self {
        self.log_execution = true;
        self
    }

    pub fn with_reset_settled(mut self) -> Self {
        self.reset_settled = true;
        self
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an execution did not succeed.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum ExecutionError {
    #[error("node '{0}' not found")]
    NodeNotFound(NodeId),

    /// Only function-model nodes are executable.
    #[error("feature '{0}' has no executable nodes")]
    UnsupportedFeature(FeatureType),

    #[error("node failed validation with {} error(s)", .issues.len())]
    ValidationFailed { issues: Vec<ValidationIssue> },

    #[error("node '{0}' is already executing")]
    ConcurrentExecutionConflict(NodeId),

    /// The node has settled and was not reset to `idle`.
    #[error("node '{node_id}' is {status}; reset it to idle before executing")]
    IllegalState { node_id: NodeId, status: NodeStatus },

    /// The node's behavior reported an error.
    #[error("behavior failed: {message}")]
    Behavior { message: String, retryable: bool },

    #[error("attempt timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Retries were made and the attempt budget ran out.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<ExecutionError>,
    },

    /// Status bookkeeping failed.
    #[error("repository error: {0}")]
    Repository(String),
}

/// Flat projection of [`ExecutionError`] for callers that only branch on
/// the kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize,
    strum::Display, strum::AsRefStr,
)]
pub enum FailureReason {
    NodeNotFound,
    UnsupportedFeature,
    ValidationFailed,
    ConcurrentExecutionConflict,
    IllegalState,
    BehaviorFailed,
    Timeout,
    RetriesExhausted,
    Repository,
}

impl ExecutionError {
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::NodeNotFound(_) => FailureReason::NodeNotFound,
            Self::UnsupportedFeature(_) => FailureReason::UnsupportedFeature,
            Self::ValidationFailed { .. } => FailureReason::ValidationFailed,
            Self::ConcurrentExecutionConflict(_) => FailureReason::ConcurrentExecutionConflict,
            Self::IllegalState { .. } => FailureReason::IllegalState,
            Self::Behavior { .. } => FailureReason::BehaviorFailed,
            Self::Timeout { .. } => FailureReason::Timeout,
            Self::RetriesExhausted { .. } => FailureReason::RetriesExhausted,
            Self::Repository(_) => FailureReason::Repository,
        }
    }

    /// Whether another attempt could succeed. Timeouts count as retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Behavior { retryable, .. } => *retryable,
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

impl From<nodes::NodeError> for ExecutionError {
    fn from(err: nodes::NodeError) -> Self {
        let retryable = err.is_retryable();
        let message = match err {
            nodes::NodeError::Retryable(msg) | nodes::NodeError::Fatal(msg) => msg,
        };
        Self::Behavior { message, retryable }
    }
}

impl From<db::RepositoryError> for ExecutionError {
    fn from(err: db::RepositoryError) -> Self {
        Self::Repository(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Where and for whom an execution ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionMetadata {
    pub node_id: NodeId,
    pub feature_type: FeatureType,
    pub entity_id: String,
    pub context: ExecutionContext,
}

/// Outcome of `execute_node`. Failures are carried in `error`, never
/// raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Behavior output on success, `null` otherwise.
    pub output: Value,
    pub error: Option<ExecutionError>,
    pub execution_time_ms: u64,
    /// Behavior invocations made, including the first.
    pub attempts: u32,
    pub metadata: ExecutionMetadata,
}

impl ExecutionResult {
    pub(crate) fn succeeded(
        output: Value,
        attempts: u32,
        execution_time_ms: u64,
        metadata: ExecutionMetadata,
    ) -> Self {
        Self {
            success: true,
            output,
            error: None,
            execution_time_ms,
            attempts,
            metadata,
        }
    }

    pub(crate) fn failed(
        error: ExecutionError,
        attempts: u32,
        execution_time_ms: u64,
        metadata: ExecutionMetadata,
    ) -> Self {
        Self {
            success: false,
            output: Value::Null,
            error: Some(error),
            execution_time_ms,
            attempts,
            metadata,
        }
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        self.error.as_ref().map(ExecutionError::reason)
    }
}
