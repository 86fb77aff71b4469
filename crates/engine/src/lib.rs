//! `engine` crate: model validation, the node execution orchestrator, and
//! version history helpers.

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod options;
pub mod validation;
pub mod version;

pub use config::{load_config, ExecutorConfig};
pub use error::EngineError;
pub use executor::NodeExecutor;
pub use logging::{ExecutionLogger, TracingExecutionLogger};
pub use options::{
    ExecutionError, ExecutionMetadata, ExecutionOptions, ExecutionResult, FailureReason,
};
pub use validation::{
    execution_plan, validate_model, validate_node, validate_semantics, validate_structure,
    ValidationCode, ValidationIssue, ValidationResult,
};
pub use version::{
    aggregate_version_metadata, count_edges, create_version_snapshot, diff_versions, VersionDiff,
};
