//! `MockNode`, a test double for `NodeBehavior`.
//!
//! Useful in unit and integration tests where a real behavior is either
//! unavailable or irrelevant. Register it in a [`crate::NodeRegistry`] in
//! place of the built-in behavior for its kind.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use domain::{Node, NodeId, NodeKind};

use crate::{ExecutionContext, NodeBehavior, NodeError};

/// Behaviour injected into `MockNode` at construction time.
pub enum MockBehaviour {
    /// Return a specific JSON value.
    ReturnValue(Value),
    /// Fail with a `Retryable` error.
    FailRetryable(String),
    /// Fail with a `Fatal` error.
    FailFatal(String),
    /// Fail retryably for the first `n` calls, then return the value.
    FailTimes(usize, Value),
    /// Fail retryably for the first `n` calls, then fatally.
    FailTimesThenFatal(usize, String),
    /// Sleep, then return the value.
    Delayed(Duration, Value),
}

/// A mock behavior that records every call it receives and returns a
/// programmer-specified result.
pub struct MockNode {
    kind: NodeKind,
    /// What the node will do when `execute` is called.
    pub behaviour: MockBehaviour,
    /// Ids of the nodes this behavior ran for (in call order).
    pub calls: Arc<Mutex<Vec<NodeId>>>,
}

impl MockNode {
    fn with(kind: NodeKind, behaviour: MockBehaviour) -> Self {
        Self {
            kind,
            behaviour,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always succeeds with the given value.
    pub fn returning(kind: NodeKind, value: Value) -> Self {
        Self::with(kind, MockBehaviour::ReturnValue(value))
    }

    /// Create a mock that always fails with a `Fatal` error.
    pub fn failing_fatal(kind: NodeKind, msg: impl Into<String>) -> Self {
        Self::with(kind, MockBehaviour::FailFatal(msg.into()))
    }

    /// Create a mock that always fails with a `Retryable` error.
    pub fn failing_retryable(kind: NodeKind, msg: impl Into<String>) -> Self {
        Self::with(kind, MockBehaviour::FailRetryable(msg.into()))
    }

    /// Create a mock that fails `failures` times before succeeding.
    pub fn flaky(kind: NodeKind, failures: usize, value: Value) -> Self {
        Self::with(kind, MockBehaviour::FailTimes(failures, value))
    }

    /// Create a mock that fails retryably `failures` times, then fatally.
    pub fn flaky_then_fatal(kind: NodeKind, failures: usize, msg: impl Into<String>) -> Self {
        Self::with(kind, MockBehaviour::FailTimesThenFatal(failures, msg.into()))
    }

    /// Create a mock that answers only after `delay`.
    pub fn delayed(kind: NodeKind, delay: Duration, value: Value) -> Self {
        Self::with(kind, MockBehaviour::Delayed(delay, value))
    }

    /// Number of times this behavior has been executed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl NodeBehavior for MockNode {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    async fn execute(&self, node: &Node, _ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(node.id);
            calls.len()
        };

        match &self.behaviour {
            MockBehaviour::ReturnValue(v) => Ok(tagged(node, v)),
            MockBehaviour::FailRetryable(msg) => Err(NodeError::Retryable(msg.clone())),
            MockBehaviour::FailFatal(msg) => Err(NodeError::Fatal(msg.clone())),
            MockBehaviour::FailTimes(n, v) => {
                if call_number <= *n {
                    Err(NodeError::Retryable(format!("failure {call_number} of {n}")))
                } else {
                    Ok(tagged(node, v))
                }
            }
            MockBehaviour::FailTimesThenFatal(n, msg) => {
                if call_number <= *n {
                    Err(NodeError::Retryable(format!("failure {call_number} of {n}")))
                } else {
                    Err(NodeError::Fatal(msg.clone()))
                }
            }
            MockBehaviour::Delayed(delay, v) => {
                tokio::time::sleep(*delay).await;
                Ok(tagged(node, v))
            }
        }
    }
}

/// Merge the node's name into the configured output so tests can trace
/// which node produced it.
fn tagged(node: &Node, v: &Value) -> Value {
    let mut out = json!({ "node": node.name });
    if let (Some(out_obj), Some(v_obj)) = (out.as_object_mut(), v.as_object()) {
        for (k, val) in v_obj {
            out_obj.insert(k.clone(), val.clone());
        }
    }
    out
}
