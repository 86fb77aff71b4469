//! Executor configuration, loadable from TOML.
//!
//! ```toml
//! validate_before_execute = true
//! timeout_ms = 30000
//! retry_on_failure = true
//! max_retries = 2
//! log_execution = false
//! reset_settled = false
//! ```
//!
//! Every key is optional; missing keys take the [`ExecutionOptions`]
//! defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{EngineError, ExecutionOptions};

/// Default options applied when a call passes none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    pub validate_before_execute: bool,
    pub timeout_ms: Option<u64>,
    pub retry_on_failure: bool,
    pub max_retries: Option<u32>,
    pub log_execution: bool,
    pub reset_settled: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        let defaults = ExecutionOptions::default();
        Self {
            validate_before_execute: defaults.validate_before_execute,
            timeout_ms: None,
            retry_on_failure: defaults.retry_on_failure,
            max_retries: defaults.max_retries,
            log_execution: defaults.log_execution,
            reset_settled: defaults.reset_settled,
        }
    }
}

impl ExecutorConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, EngineError> {
        Ok(toml::from_str(input)?)
    }

    pub fn options(&self) -> ExecutionOptions {
        ExecutionOptions {
            validate_before_execute: self.validate_before_execute,
            timeout: self.timeout_ms.map(Duration::from_millis),
            retry_on_failure: self.retry_on_failure,
            max_retries: self.max_retries,
            log_execution: self.log_execution,
            reset_settled: self.reset_settled,
        }
    }
}

/// Read and parse a TOML config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<ExecutorConfig, EngineError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    ExecutorConfig::from_toml_str(&raw)
}
