//! Typed error type for the db crate.

use thiserror::Error;

use domain::{DomainError, NodeStatus};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepositoryError {
    /// No live row with this id.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// The write would break a uniqueness or referential rule.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Compare-and-swap guard on `status` did not match.
    #[error("status conflict: expected {expected}, found {actual}")]
    StatusConflict {
        expected: NodeStatus,
        actual: NodeStatus,
    },

    /// A stored row could not be turned back into an entity.
    #[error("row translation failed: {0}")]
    Translation(String),

    /// The entity rejected the change.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl RepositoryError {
    pub(crate) fn node_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "node",
            id: id.to_string(),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Translation(err.to_string())
    }
}
