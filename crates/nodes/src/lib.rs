//! `nodes` crate: the `NodeBehavior` trait, the built-in behavior for each
//! node type, and the registry the engine dispatches through.
//!
//! Behaviors perform a node's type-specific work and hand back raw JSON.
//! They never touch node status; that belongs to the engine.

pub mod behaviors;
pub mod error;
pub mod mock;
pub mod registry;
pub mod traits;

pub use error::NodeError;
pub use registry::NodeRegistry;
pub use traits::{Environment, ExecutionContext, NodeBehavior};
