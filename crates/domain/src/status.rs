//! Node execution status and its legal transitions.
//!
//! ```text
//! idle -> running -> completed
//!            |
//!            v
//!          failed -> retrying -> running
//!                       |
//!                       v
//!                     failed
//! ```
//!
//! `completed` and `failed` only leave through an explicit reset to `idle`.

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
    Retrying,
}

impl NodeStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// Resets are not transitions; see [`NodeStatus::can_reset`].
    pub fn can_transition_to(self, next: NodeStatus) -> bool {
        use NodeStatus::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Failed, Retrying)
                | (Retrying, Running)
                | (Retrying, Failed)
        )
    }

    /// Only settled nodes can be reset to `idle`.
    pub fn can_reset(self) -> bool {
        matches!(self, NodeStatus::Completed | NodeStatus::Failed)
    }

    /// `true` while an execution owns the node.
    pub fn is_active(self) -> bool {
        matches!(self, NodeStatus::Running | NodeStatus::Retrying)
    }
}

#[cfg(test)]
mod tests {
    use super::NodeStatus::*;
    use super::*;

    #[test]
    fn happy_path_is_legal() {
        assert!(Idle.can_transition_to(Running));
        assert!(Running.can_transition_to(Completed));
    }

    #[test]
    fn retry_loop_is_legal() {
        assert!(Running.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Retrying));
        assert!(Retrying.can_transition_to(Running));
        assert!(Retrying.can_transition_to(Failed));
    }

    #[test]
    fn settled_states_do_not_restart_without_reset() {
        assert!(!Completed.can_transition_to(Running));
        assert!(!Failed.can_transition_to(Running));
        assert!(!Completed.can_transition_to(Idle));
        assert!(Completed.can_reset());
        assert!(Failed.can_reset());
    }

    #[test]
    fn active_states_cannot_be_reset() {
        assert!(!Running.can_reset());
        assert!(!Retrying.can_reset());
        assert!(!Idle.can_reset());
    }

    #[test]
    fn idle_cannot_skip_running() {
        assert!(!Idle.can_transition_to(Completed));
        assert!(!Idle.can_transition_to(Failed));
    }
}
