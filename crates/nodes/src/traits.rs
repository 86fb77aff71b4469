//! The `NodeBehavior` trait: the contract every node type must fulfil.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use domain::{Node, NodeKind};

use crate::NodeError;

/// Deployment target of an invocation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Per-invocation parameters passed to every behavior.
///
/// Defined here (in the nodes crate) so both the engine and individual
/// behaviors can import it without a circular dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Actor on whose behalf the node runs.
    pub user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Free-form parameter bag.
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub environment: Environment,
}

impl ExecutionContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: None,
            timestamp: Utc::now(),
            parameters: Map::new(),
            environment: Environment::default(),
        }
    }

    /// Context used when the caller supplies none.
    pub fn system() -> Self {
        Self::new("system")
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }
}

/// Type-specific work performed when a node executes.
///
/// Built-in implementations exist for every [`NodeKind`]; tests and hosts
/// can register their own through [`crate::NodeRegistry`].
#[async_trait]
pub trait NodeBehavior: Send + Sync {
    /// The node type this behavior serves.
    fn kind(&self) -> NodeKind;

    /// Run the node and return its raw JSON output.
    async fn execute(&self, node: &Node, ctx: &ExecutionContext) -> Result<Value, NodeError>;
}
