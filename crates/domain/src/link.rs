//! Node links and cross-feature links.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DomainError, LinkId, NodeId};

/// Product area a link endpoint lives in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FeatureType {
    FunctionModel,
    KnowledgeBase,
    EventStorm,
    Spindle,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LinkType {
    Dependency,
    Documents,
    Implements,
    References,
    Supports,
    Nested,
}

/// Input to [`Link::create`].
#[derive(Debug, Clone)]
pub struct LinkProps {
    pub source_feature: FeatureType,
    pub target_feature: FeatureType,
    pub source_entity_id: String,
    pub target_entity_id: String,
    pub source_node_id: Option<NodeId>,
    pub target_node_id: Option<NodeId>,
    pub link_type: LinkType,
    pub link_strength: f64,
    pub link_context: BTreeMap<String, Value>,
    pub created_by: String,
}

impl LinkProps {
    /// A dependency edge between two nodes of the same function model.
    pub fn node_link(model_id: impl Into<String>, source: NodeId, target: NodeId) -> Self {
        let model_id = model_id.into();
        Self {
            source_feature: FeatureType::FunctionModel,
            target_feature: FeatureType::FunctionModel,
            source_entity_id: model_id.clone(),
            target_entity_id: model_id,
            source_node_id: Some(source),
            target_node_id: Some(target),
            link_type: LinkType::Dependency,
            link_strength: 1.0,
            link_context: BTreeMap::new(),
            created_by: String::new(),
        }
    }

    pub fn with_link_type(mut self, link_type: LinkType) -> Self {
        self.link_type = link_type;
        self
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.link_strength = strength;
        self
    }

    pub fn created_by(mut self, actor: impl Into<String>) -> Self {
        self.created_by = actor.into();
        self
    }
}

/// Directed, typed edge between two entities, optionally down to the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub link_id: LinkId,
    pub source_feature: FeatureType,
    pub target_feature: FeatureType,
    pub source_entity_id: String,
    pub target_entity_id: String,
    #[serde(default)]
    pub source_node_id: Option<NodeId>,
    #[serde(default)]
    pub target_node_id: Option<NodeId>,
    pub link_type: LinkType,
    pub link_strength: f64,
    #[serde(default)]
    pub link_context: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
}

impl Link {
    /// Create a validated link with a fresh id.
    ///
    /// # Errors
    /// See [`Link::validate`].
    pub fn create(props: LinkProps) -> Result<Self, DomainError> {
        let link = Self {
            link_id: LinkId::new(),
            source_feature: props.source_feature,
            target_feature: props.target_feature,
            source_entity_id: props.source_entity_id,
            target_entity_id: props.target_entity_id,
            source_node_id: props.source_node_id,
            target_node_id: props.target_node_id,
            link_type: props.link_type,
            link_strength: props.link_strength,
            link_context: props.link_context,
            created_at: Utc::now(),
            created_by: props.created_by,
        };
        link.validate()?;
        Ok(link)
    }

    /// Check the link's own invariants (not whether its endpoints exist).
    ///
    /// # Errors
    /// - [`DomainError::InvalidEndpoint`] for a blank entity id or a node id
    ///   on a non function-model end.
    /// - [`DomainError::LinkStrengthOutOfRange`] outside `[0, 1]`.
    /// - [`DomainError::SelfLink`] when both ends name the same node.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.source_entity_id.trim().is_empty() || self.target_entity_id.trim().is_empty() {
            return Err(DomainError::InvalidEndpoint(format!(
                "link '{}' has a blank entity id",
                self.link_id
            )));
        }
        if self.source_node_id.is_some() && self.source_feature != FeatureType::FunctionModel {
            return Err(DomainError::InvalidEndpoint(format!(
                "link '{}' names a source node outside the function-model feature",
                self.link_id
            )));
        }
        if self.target_node_id.is_some() && self.target_feature != FeatureType::FunctionModel {
            return Err(DomainError::InvalidEndpoint(format!(
                "link '{}' names a target node outside the function-model feature",
                self.link_id
            )));
        }
        if !self.link_strength.is_finite() || !(0.0..=1.0).contains(&self.link_strength) {
            return Err(DomainError::LinkStrengthOutOfRange(self.link_strength));
        }
        if let (Some(source), Some(target)) = (self.source_node_id, self.target_node_id) {
            if source == target {
                return Err(DomainError::SelfLink(self.link_id));
            }
        }
        Ok(())
    }

    /// Both ends are different features.
    pub fn is_cross_feature(&self) -> bool {
        self.source_feature != self.target_feature
    }

    /// Node-to-node edge inside a single function model. Only these edges
    /// take part in cycle detection.
    pub fn same_model_edge(&self) -> Option<(NodeId, NodeId)> {
        let same_model = self.source_feature == FeatureType::FunctionModel
            && self.target_feature == FeatureType::FunctionModel
            && self.source_entity_id == self.target_entity_id;
        match (same_model, self.source_node_id, self.target_node_id) {
            (true, Some(source), Some(target)) => Some((source, target)),
            _ => None,
        }
    }

    /// Whether either end belongs to the given function model.
    pub fn touches_model(&self, model_id: &str) -> bool {
        (self.source_feature == FeatureType::FunctionModel && self.source_entity_id == model_id)
            || (self.target_feature == FeatureType::FunctionModel
                && self.target_entity_id == model_id)
    }

    /// Whether either end names the given node.
    pub fn touches_node(&self, node_id: &NodeId) -> bool {
        self.source_node_id.as_ref() == Some(node_id) || self.target_node_id.as_ref() == Some(node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_outside_unit_interval_is_rejected() {
        for strength in [-0.1, 1.01, f64::NAN, f64::INFINITY] {
            let props = LinkProps::node_link("m", NodeId::new(), NodeId::new()).with_strength(strength);
            assert!(matches!(
                Link::create(props),
                Err(DomainError::LinkStrengthOutOfRange(_))
            ));
        }
    }

    #[test]
    fn boundary_strengths_are_accepted() {
        for strength in [0.0, 1.0] {
            let props = LinkProps::node_link("m", NodeId::new(), NodeId::new()).with_strength(strength);
            assert!(Link::create(props).is_ok());
        }
    }

    #[test]
    fn self_link_is_rejected() {
        let node = NodeId::new();
        assert!(matches!(
            Link::create(LinkProps::node_link("m", node, node)),
            Err(DomainError::SelfLink(_))
        ));
    }

    #[test]
    fn node_id_on_foreign_feature_is_rejected() {
        let mut props = LinkProps::node_link("m", NodeId::new(), NodeId::new());
        props.target_feature = FeatureType::KnowledgeBase;
        assert!(matches!(Link::create(props), Err(DomainError::InvalidEndpoint(_))));
    }

    #[test]
    fn cross_model_edge_is_not_a_same_model_edge() {
        let mut props = LinkProps::node_link("m1", NodeId::new(), NodeId::new());
        props.target_entity_id = "m2".into();
        let link = Link::create(props).unwrap();
        assert!(link.same_model_edge().is_none());
        assert!(link.touches_model("m1"));
        assert!(link.touches_model("m2"));
    }

    #[test]
    fn feature_strings_are_kebab_case() {
        assert_eq!(FeatureType::FunctionModel.to_string(), "function-model");
        assert_eq!("event-storm".parse::<FeatureType>().unwrap(), FeatureType::EventStorm);
    }
}
