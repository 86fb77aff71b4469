//! `db` crate: the repository contract the core persists through, the
//! row shapes stored behind it, and an in-process implementation.
//!
//! No business logic lives here beyond the invariants a store must keep
//! (compare-and-swap status updates and the acyclic link graph).

pub mod error;
pub mod models;
pub mod repository;

pub use error::RepositoryError;
pub use repository::memory::InMemoryRepository;
pub use repository::FunctionModelRepository;
