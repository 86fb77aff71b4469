//! Per-type node configuration.
//!
//! Each node type carries exactly one configuration variant; the variant is
//! the node's type tag, so shapes of different types can never be mixed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::DomainError;

// ---------------------------------------------------------------------------
// Node kind
// ---------------------------------------------------------------------------

/// Type tag of a node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr, strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum NodeKind {
    IoNode,
    StageNode,
    TetherNode,
    KbNode,
    FunctionModelContainer,
}

impl NodeKind {
    /// Containers bound execution and own action nodes.
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::IoNode | NodeKind::StageNode)
    }

    pub fn is_action(self) -> bool {
        !self.is_container()
    }
}

// ---------------------------------------------------------------------------
// Container sub-objects
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorHandling {
    #[default]
    Stop,
    Continue,
    Retry,
}

/// When a container starts and what counts as done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPolicy {
    #[serde(default)]
    pub trigger_conditions: Vec<String>,
    #[serde(default)]
    pub completion_criteria: Vec<String>,
    #[serde(default)]
    pub error_handling: ErrorHandling,
}

impl ExecutionPolicy {
    pub fn validate(&self) -> Result<(), DomainError> {
        non_blank_entries("execution_policy.trigger_conditions", &self.trigger_conditions)?;
        non_blank_entries("execution_policy.completion_criteria", &self.completion_criteria)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IntegrationStyle {
    #[default]
    Embedded,
    Federated,
    Delegated,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CommunicationPattern {
    #[default]
    Synchronous,
    Asynchronous,
    EventDriven,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateManagement {
    #[default]
    Isolated,
    Shared,
}

/// How a container coordinates with the nodes it owns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationMode {
    pub integration_style: IntegrationStyle,
    #[serde(default)]
    pub communication_pattern: CommunicationPattern,
    #[serde(default)]
    pub state_management: StateManagement,
}

impl OrchestrationMode {
    /// Build a mode from its integration style alone.
    ///
    /// The remaining fields take their documented defaults:
    /// `synchronous` communication and `isolated` state.
    pub fn from_style(integration_style: IntegrationStyle) -> Self {
        Self {
            integration_style,
            communication_pattern: CommunicationPattern::default(),
            state_management: StateManagement::default(),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContextIsolation {
    #[default]
    Shared,
    ReadOnly,
    Isolated,
}

/// Which parent contexts a container can see.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextInheritance {
    #[serde(default)]
    pub inherited_contexts: Vec<String>,
    #[serde(default)]
    pub isolation: ContextIsolation,
}

impl ContextInheritance {
    pub fn validate(&self) -> Result<(), DomainError> {
        non_blank_entries("context_inheritance.inherited_contexts", &self.inherited_contexts)?;
        let mut seen = std::collections::HashSet::new();
        for context in &self.inherited_contexts {
            if !seen.insert(context.as_str()) {
                return Err(DomainError::InvalidConfiguration {
                    field: "context_inheritance.inherited_contexts",
                    reason: format!("'{context}' listed twice"),
                });
            }
        }
        Ok(())
    }
}

/// Sub-objects shared by both container kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfiguration {
    #[serde(default)]
    pub execution_policy: ExecutionPolicy,
    #[serde(default)]
    pub orchestration_mode: OrchestrationMode,
    #[serde(default)]
    pub context_inheritance: ContextInheritance,
}

impl ContainerConfiguration {
    pub fn validate(&self) -> Result<(), DomainError> {
        self.execution_policy.validate()?;
        self.context_inheritance.validate()
    }
}

// ---------------------------------------------------------------------------
// Per-type payloads
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IoType {
    Input,
    Output,
    InputOutput,
}

/// Boundary node: declares the fields that cross into or out of the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoConfiguration {
    pub io_type: IoType,
    #[serde(default)]
    pub data_contract: Vec<String>,
    #[serde(default)]
    pub container: ContainerConfiguration,
}

/// Workflow stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfiguration {
    pub stage_type: String,
    #[serde(default)]
    pub container: ContainerConfiguration,
}

/// External integration action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TetherConfiguration {
    pub tether_reference_id: String,
    #[serde(default)]
    pub trigger_conditions: Vec<String>,
    #[serde(default)]
    pub execution_parameters: BTreeMap<String, Value>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KbAccessType {
    Read,
    Write,
    Reference,
}

/// Knowledge-base reference action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbConfiguration {
    pub kb_reference_id: String,
    pub access_type: KbAccessType,
    #[serde(default)]
    pub search_keywords: Vec<String>,
}

/// Nested function-model container action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedModelConfiguration {
    pub nested_model_id: String,
    /// child input key -> parent parameter key
    #[serde(default)]
    pub context_mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub output_extraction: Vec<String>,
}

/// Configuration payload, tagged by node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeConfiguration {
    IoNode(IoConfiguration),
    StageNode(StageConfiguration),
    TetherNode(TetherConfiguration),
    KbNode(KbConfiguration),
    FunctionModelContainer(NestedModelConfiguration),
}

impl NodeConfiguration {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeConfiguration::IoNode(_) => NodeKind::IoNode,
            NodeConfiguration::StageNode(_) => NodeKind::StageNode,
            NodeConfiguration::TetherNode(_) => NodeKind::TetherNode,
            NodeConfiguration::KbNode(_) => NodeKind::KbNode,
            NodeConfiguration::FunctionModelContainer(_) => NodeKind::FunctionModelContainer,
        }
    }

    /// Container sub-objects, if this is a container.
    pub fn container(&self) -> Option<&ContainerConfiguration> {
        match self {
            NodeConfiguration::IoNode(io) => Some(&io.container),
            NodeConfiguration::StageNode(stage) => Some(&stage.container),
            _ => None,
        }
    }

    pub fn container_mut(&mut self) -> Option<&mut ContainerConfiguration> {
        match self {
            NodeConfiguration::IoNode(io) => Some(&mut io.container),
            NodeConfiguration::StageNode(stage) => Some(&mut stage.container),
            _ => None,
        }
    }

    /// Check the required fields for this type.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            NodeConfiguration::IoNode(io) => {
                non_blank_entries("data_contract", &io.data_contract)?;
                io.container.validate()
            }
            NodeConfiguration::StageNode(stage) => {
                required("stage_type", &stage.stage_type)?;
                stage.container.validate()
            }
            NodeConfiguration::TetherNode(tether) => {
                required("tether_reference_id", &tether.tether_reference_id)?;
                non_blank_entries("trigger_conditions", &tether.trigger_conditions)
            }
            NodeConfiguration::KbNode(kb) => {
                required("kb_reference_id", &kb.kb_reference_id)?;
                non_blank_entries("search_keywords", &kb.search_keywords)
            }
            NodeConfiguration::FunctionModelContainer(nested) => {
                required("nested_model_id", &nested.nested_model_id)?;
                for (child, parent) in &nested.context_mapping {
                    if child.trim().is_empty() || parent.trim().is_empty() {
                        return Err(DomainError::InvalidConfiguration {
                            field: "context_mapping",
                            reason: "mapping keys must not be blank".into(),
                        });
                    }
                }
                non_blank_entries("output_extraction", &nested.output_extraction)
            }
        }
    }
}

fn required(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidConfiguration {
            field,
            reason: "required".into(),
        });
    }
    Ok(())
}

fn non_blank_entries(field: &'static str, values: &[String]) -> Result<(), DomainError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(DomainError::InvalidConfiguration {
            field,
            reason: "entries must not be blank".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_follows_variant() {
        let config = NodeConfiguration::KbNode(KbConfiguration {
            kb_reference_id: "kb-1".into(),
            access_type: KbAccessType::Read,
            search_keywords: vec![],
        });
        assert_eq!(config.kind(), NodeKind::KbNode);
        assert!(config.container().is_none());
    }

    #[test]
    fn missing_reference_is_rejected() {
        let config = NodeConfiguration::TetherNode(TetherConfiguration {
            tether_reference_id: "  ".into(),
            trigger_conditions: vec![],
            execution_parameters: BTreeMap::new(),
        });
        assert!(matches!(
            config.validate(),
            Err(DomainError::InvalidConfiguration { field: "tether_reference_id", .. })
        ));
    }

    #[test]
    fn duplicate_inherited_context_is_rejected() {
        let inheritance = ContextInheritance {
            inherited_contexts: vec!["a".into(), "a".into()],
            isolation: ContextIsolation::Shared,
        };
        assert!(inheritance.validate().is_err());
    }

    #[test]
    fn tag_selects_the_shape() {
        let config: NodeConfiguration = serde_json::from_value(json!({
            "type": "stageNode",
            "stage_type": "review"
        }))
        .expect("stage config should parse");
        assert_eq!(config.kind(), NodeKind::StageNode);
        assert_eq!(config.container(), Some(&ContainerConfiguration::default()));
    }

    #[test]
    fn foreign_fields_do_not_satisfy_a_shape() {
        // A tether payload tagged as a knowledge-base node is missing its own fields.
        let parsed = serde_json::from_value::<NodeConfiguration>(json!({
            "type": "kbNode",
            "tether_reference_id": "t-1"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn orchestration_defaults_from_style() {
        let mode = OrchestrationMode::from_style(IntegrationStyle::Federated);
        assert_eq!(mode.communication_pattern, CommunicationPattern::Synchronous);
        assert_eq!(mode.state_management, StateManagement::Isolated);
    }

    #[test]
    fn kind_strings_are_camel_case() {
        assert_eq!(NodeKind::FunctionModelContainer.to_string(), "functionModelContainer");
        assert_eq!("kbNode".parse::<NodeKind>().unwrap(), NodeKind::KbNode);
    }
}
