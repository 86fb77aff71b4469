//! Engine-level error types.
//!
//! Execution failures are not here: they are values inside
//! [`crate::ExecutionResult`]. `EngineError` covers the engine's own
//! plumbing (configuration loading and version snapshots).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The config file could not be read.
    #[error("cannot read config '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::ExecutorConfig`].
    #[error("invalid executor config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Persistence error from the db crate.
    #[error("repository error: {0}")]
    Repository(#[from] db::RepositoryError),

    #[error(transparent)]
    Domain(#[from] domain::DomainError),
}
