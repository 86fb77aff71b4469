//! Node execution orchestrator.
//!
//! `NodeExecutor::execute_node` drives one node through its lifecycle:
//! 1. Resolves the node through the repository.
//! 2. Optionally runs the node-scoped validation pass.
//! 3. Claims the node with a compare-and-swap on `status`, so a second
//!    concurrent execution of the same node is rejected. Settled nodes are
//!    rejected too unless the caller asks for them to be reset.
//! 4. Dispatches to the behavior for the node's type, racing each attempt
//!    against the timeout.
//! 5. On failure, retries per the node's `RetryPolicy`
//!    (`failed -> retrying -> running`), sleeping the policy's backoff
//!    between attempts.
//!
//! Steps 3 to 5 run on a spawned task that owns the node's status until it
//! settles, so dropping the `execute_node` future never leaves a node
//! stuck in `running`.
//!
//! Every outcome, including lookups that fail, is returned as an
//! [`ExecutionResult`]; nothing is raised to the caller.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn, Instrument};

use db::{FunctionModelRepository, RepositoryError};
use domain::{FeatureType, Node, NodeId, NodeStatus};
use nodes::{ExecutionContext, NodeBehavior, NodeRegistry};

use crate::logging::{ExecutionLogger, TracingExecutionLogger};
use crate::options::{ExecutionError, ExecutionMetadata, ExecutionOptions, ExecutionResult};
use crate::validation::validate_node;

/// Stateless orchestrator; the only state it touches is the node's
/// `status`, through the repository.
///
/// Construct one per process and share it; calls for different nodes may
/// run concurrently.
pub struct NodeExecutor {
    repository: Arc<dyn FunctionModelRepository>,
    registry: NodeRegistry,
    defaults: ExecutionOptions,
    logger: Arc<dyn ExecutionLogger>,
}

impl NodeExecutor {
    pub fn new(repository: Arc<dyn FunctionModelRepository>, registry: NodeRegistry) -> Self {
        Self {
            repository,
            registry,
            defaults: ExecutionOptions::default(),
            logger: Arc::new(TracingExecutionLogger),
        }
    }

    /// Options used when a call passes none.
    pub fn with_defaults(mut self, defaults: ExecutionOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ExecutionLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Execute one node and report the outcome.
    #[instrument(
        skip_all,
        fields(feature = %feature_type, entity_id = %entity_id, node_id = %node_id)
    )]
    pub async fn execute_node(
        &self,
        feature_type: FeatureType,
        entity_id: &str,
        node_id: &NodeId,
        context: Option<ExecutionContext>,
        options: Option<ExecutionOptions>,
    ) -> ExecutionResult {
        let started = Instant::now();
        let options = options.unwrap_or_else(|| self.defaults.clone());
        let metadata = ExecutionMetadata {
            node_id: *node_id,
            feature_type,
            entity_id: entity_id.to_owned(),
            context: context.unwrap_or_else(ExecutionContext::system),
        };

        let outcome = self.run(&metadata, &options).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let result = match outcome {
            Ok((output, attempts)) => {
                info!(attempts, elapsed_ms, "node execution succeeded");
                ExecutionResult::succeeded(output, attempts, elapsed_ms, metadata)
            }
            Err((err, attempts)) => {
                error!(attempts, elapsed_ms, reason = %err.reason(), "node execution failed: {err}");
                ExecutionResult::failed(err, attempts, elapsed_ms, metadata)
            }
        };

        if options.log_execution {
            self.logger.record(&result).await;
        }
        result
    }

    // -----------------------------------------------------------------------
    // Internal: resolve and validate here, then hand off to a detached run.
    // -----------------------------------------------------------------------

    async fn run(
        &self,
        meta: &ExecutionMetadata,
        options: &ExecutionOptions,
    ) -> Result<(Value, u32), (ExecutionError, u32)> {
        if meta.feature_type != FeatureType::FunctionModel {
            return Err((ExecutionError::UnsupportedFeature(meta.feature_type), 0));
        }

        let node = match self.repository.get_node(&meta.entity_id, &meta.node_id).await {
            Ok(node) => node,
            Err(RepositoryError::NotFound { .. }) => {
                return Err((ExecutionError::NodeNotFound(meta.node_id), 0))
            }
            Err(other) => return Err((other.into(), 0)),
        };

        if options.validate_before_execute {
            let links = self
                .repository
                .find_links_by_model_id(&meta.entity_id)
                .await
                .map_err(|e| (ExecutionError::from(e), 0))?;
            let report = validate_node(&node, &links);
            if !report.is_valid {
                return Err((ExecutionError::ValidationFailed { issues: report.errors }, 0));
            }
        }

        let run = Run {
            repository: Arc::clone(&self.repository),
            behavior: self.registry.resolve(node.kind()),
            context: meta.context.clone(),
            options: options.clone(),
        };
        // The run owns the status bookkeeping from the claim on, so it settles
        // the node even if this call is dropped.
        let handle = tokio::spawn(run.drive(node).in_current_span());
        match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => Err((
                ExecutionError::Behavior {
                    message: format!("execution task ended abnormally: {join_err}"),
                    retryable: false,
                },
                0,
            )),
        }
    }
}

/// One claimed execution of a node, detached from the caller.
struct Run {
    repository: Arc<dyn FunctionModelRepository>,
    behavior: Arc<dyn NodeBehavior>,
    context: ExecutionContext,
    options: ExecutionOptions,
}

impl Run {
    async fn drive(self, node: Node) -> Result<(Value, u32), (ExecutionError, u32)> {
        let node = self.claim(&node).await.map_err(|e| (e, 0))?;
        let outcome = self.attempt_loop(&node).await;
        if let Err((ExecutionError::Repository(_), _)) = &outcome {
            self.release(&node).await;
        }
        outcome
    }

    /// Move the node to `running`. A node another execution holds is a
    /// conflict; a settled node is only reset when the options ask for it.
    async fn claim(&self, node: &Node) -> Result<Node, ExecutionError> {
        let path: &[NodeStatus] = match node.status {
            NodeStatus::Running | NodeStatus::Retrying => {
                return Err(ExecutionError::ConcurrentExecutionConflict(node.id))
            }
            NodeStatus::Idle => &[NodeStatus::Running],
            NodeStatus::Completed | NodeStatus::Failed if self.options.reset_settled => {
                &[NodeStatus::Idle, NodeStatus::Running]
            }
            status @ (NodeStatus::Completed | NodeStatus::Failed) => {
                return Err(ExecutionError::IllegalState {
                    node_id: node.id,
                    status,
                })
            }
        };
        match self.repository.transition_status(&node.id, node.status, path).await {
            Ok(claimed) => Ok(claimed),
            Err(RepositoryError::StatusConflict { .. }) => {
                Err(ExecutionError::ConcurrentExecutionConflict(node.id))
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn attempt_loop(&self, node: &Node) -> Result<(Value, u32), (ExecutionError, u32)> {
        let node_id = node.id;
        let options = &self.options;
        let permitted = permitted_attempts(node, options);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let outcome =
                run_attempt(Arc::clone(&self.behavior), node, &self.context, options.timeout).await;

            let err = match outcome {
                Ok(output) => {
                    self.step(&node_id, NodeStatus::Running, NodeStatus::Completed)
                        .await
                        .map_err(|e| (e, attempt))?;
                    return Ok((output, attempt));
                }
                Err(err) => err,
            };

            self.step(&node_id, NodeStatus::Running, NodeStatus::Failed)
                .await
                .map_err(|e| (e, attempt))?;

            let wants_retry = options.retry_on_failure && err.is_retryable();
            let policy = match &node.retry_policy {
                Some(policy) if wants_retry && attempt < permitted && policy.permits_retry(attempt) => {
                    policy
                }
                Some(_) if wants_retry && attempt > 1 => {
                    let exhausted = ExecutionError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    };
                    return Err((exhausted, attempt));
                }
                _ => return Err((err, attempt)),
            };

            let delay = policy.compute_delay(attempt);
            warn!(
                %node_id,
                attempt,
                permitted,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "attempt failed, retrying: {err}"
            );
            self.step(&node_id, NodeStatus::Failed, NodeStatus::Retrying)
                .await
                .map_err(|e| (e, attempt))?;
            tokio::time::sleep(delay).await;
            self.step(&node_id, NodeStatus::Retrying, NodeStatus::Running)
                .await
                .map_err(|e| (e, attempt))?;
        }
    }

    async fn step(&self, node_id: &NodeId, from: NodeStatus, to: NodeStatus) -> Result<(), ExecutionError> {
        self.repository
            .transition_status(node_id, from, &[to])
            .await
            .map(|_| ())
            .map_err(ExecutionError::from)
    }

    /// Bookkeeping broke partway: move a node still held by this run to
    /// `failed` so later executions are not locked out.
    async fn release(&self, node: &Node) {
        let current = match self.repository.get_node(&node.model_id, &node.id).await {
            Ok(current) => current.status,
            Err(err) => {
                error!(node_id = %node.id, "cannot release node: {err}");
                return;
            }
        };
        if !current.is_active() {
            return;
        }
        match self
            .repository
            .transition_status(&node.id, current, &[NodeStatus::Failed])
            .await
        {
            Ok(_) => warn!(node_id = %node.id, from = %current, "node released as failed"),
            Err(err) => error!(node_id = %node.id, "cannot release node: {err}"),
        }
    }
}

/// Attempts allowed for this call: the policy's `max_attempts`, capped by
/// `max_retries + 1` when the caller sets it. One without a policy.
fn permitted_attempts(node: &Node, options: &ExecutionOptions) -> u32 {
    let Some(policy) = &node.retry_policy else {
        return 1;
    };
    match options.max_retries {
        Some(max_retries) => policy.max_attempts.min(max_retries.saturating_add(1)),
        None => policy.max_attempts,
    }
}

/// Run the behavior on its own task and race it against the deadline. On
/// timeout the task is aborted; whatever it would have returned is dropped.
async fn run_attempt(
    behavior: Arc<dyn NodeBehavior>,
    node: &Node,
    ctx: &ExecutionContext,
    timeout: Option<Duration>,
) -> Result<Value, ExecutionError> {
    let task_node = node.clone();
    let task_ctx = ctx.clone();
    let mut handle =
        tokio::spawn(async move { behavior.execute(&task_node, &task_ctx).await });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return Err(ExecutionError::Timeout {
                    timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                });
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(node_err)) => Err(node_err.into()),
        Err(join_err) => Err(ExecutionError::Behavior {
            message: format!("behavior task ended abnormally: {join_err}"),
            retryable: false,
        }),
    }
}
