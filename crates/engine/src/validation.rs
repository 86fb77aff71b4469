//! Model validation. Run this before executing or publishing a model.
//!
//! Two passes over a [`ModelSnapshot`]:
//!
//! 1. **Structural**: unique node ids, every action has a container parent
//!    in the model, containers have no parent, every link is well formed and
//!    its in-model endpoints resolve, conditional containers do not reach
//!    into other models through plain node links, and the same-model link
//!    graph is acyclic.
//! 2. **Semantic**: per-type configuration, retry policies, and sibling
//!    priority ordering.
//!
//! Violations are aggregated, never fail-fast, and reported in snapshot
//! order so two runs over the same snapshot give identical results.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use domain::{
    DomainError, ExecutionMode, FeatureType, Link, LinkGraph, LinkId, ModelSnapshot, Node, NodeId,
};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize,
    strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValidationCode {
    DuplicateNodeId,
    ForeignNode,
    OrphanNode,
    InvalidParent,
    InvalidLink,
    DuplicateLinkId,
    UnresolvedEndpoint,
    CrossModelConditionalEdge,
    CycleDetected,
    InvalidConfiguration,
    InvalidRetryPolicy,
    MissingRetryPolicy,
    DuplicatePriority,
    // warnings
    EmptyContainer,
    DuplicateExecutionOrder,
}

/// One finding, pointing at the node or link at fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub code: ValidationCode,
    pub message: String,
    pub node_id: Option<NodeId>,
    pub link_id: Option<LinkId>,
}

impl ValidationIssue {
    fn node(code: ValidationCode, node_id: NodeId, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            node_id: Some(node_id),
            link_id: None,
        }
    }

    fn link(code: ValidationCode, link_id: LinkId, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            node_id: None,
            link_id: Some(link_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// True iff `errors` is empty. Warnings never affect it.
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    fn from_issues(errors: Vec<ValidationIssue>, warnings: Vec<ValidationIssue>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Append another result's findings.
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.is_valid = self.errors.is_empty();
        self
    }

    pub fn has_error(&self, code: ValidationCode) -> bool {
        self.errors.iter().any(|issue| issue.code == code)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run both passes over the model's live nodes and its links.
pub fn validate_model(snapshot: &ModelSnapshot) -> ValidationResult {
    let result = validate_structure(snapshot).merge(validate_semantics(snapshot));
    debug!(
        model_id = %snapshot.model_id,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "model validated"
    );
    result
}

/// Structural pass.
pub fn validate_structure(snapshot: &ModelSnapshot) -> ValidationResult {
    let nodes = live_nodes(snapshot);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // -----------------------------------------------------------------------
    // 1. Node identity and model membership
    // -----------------------------------------------------------------------
    let mut seen: HashSet<NodeId> = HashSet::new();
    for node in &nodes {
        if !seen.insert(node.id) {
            errors.push(ValidationIssue::node(
                ValidationCode::DuplicateNodeId,
                node.id,
                format!("node id '{}' appears more than once", node.id),
            ));
        }
        if node.model_id != snapshot.model_id {
            errors.push(ValidationIssue::node(
                ValidationCode::ForeignNode,
                node.id,
                format!(
                    "node '{}' belongs to model '{}', not '{}'",
                    node.name, node.model_id, snapshot.model_id
                ),
            ));
        }
    }

    let by_id: HashMap<NodeId, &Node> = nodes.iter().map(|n| (n.id, *n)).collect();

    // -----------------------------------------------------------------------
    // 2. Parent/child membership
    // -----------------------------------------------------------------------
    for node in &nodes {
        match (node.is_container(), node.parent_id) {
            (true, Some(_)) => errors.push(ValidationIssue::node(
                ValidationCode::InvalidParent,
                node.id,
                format!("container '{}' cannot have a parent", node.name),
            )),
            (true, None) => {
                if !nodes.iter().any(|n| n.parent_id == Some(node.id)) {
                    warnings.push(ValidationIssue::node(
                        ValidationCode::EmptyContainer,
                        node.id,
                        format!("container '{}' has no action nodes", node.name),
                    ));
                }
            }
            (false, None) => errors.push(ValidationIssue::node(
                ValidationCode::OrphanNode,
                node.id,
                format!("action '{}' has no parent container", node.name),
            )),
            (false, Some(parent_id)) => match by_id.get(&parent_id) {
                None => errors.push(ValidationIssue::node(
                    ValidationCode::OrphanNode,
                    node.id,
                    format!("parent '{parent_id}' of action '{}' is not in the model", node.name),
                )),
                Some(parent) if !parent.is_container() => errors.push(ValidationIssue::node(
                    ValidationCode::InvalidParent,
                    node.id,
                    format!("parent '{}' of action '{}' is not a container", parent.name, node.name),
                )),
                Some(_) => {}
            },
        }
    }

    // -----------------------------------------------------------------------
    // 3. Links: shape, endpoints, cross-model reach, cycles
    // -----------------------------------------------------------------------
    let mut graph = LinkGraph::new();
    for link in &snapshot.links {
        if let Err(err) = link.validate() {
            errors.push(ValidationIssue::link(ValidationCode::InvalidLink, link.link_id, err.to_string()));
            continue;
        }

        let unresolved = unresolved_endpoints(link, &snapshot.model_id, &by_id);
        let resolved = unresolved.is_empty();
        for node_id in unresolved {
            errors.push(ValidationIssue::link(
                ValidationCode::UnresolvedEndpoint,
                link.link_id,
                format!("link '{}' references missing node '{node_id}'", link.link_id),
            ));
        }

        if let Some(source) = conditional_container_source(link, &snapshot.model_id, &by_id) {
            errors.push(ValidationIssue::link(
                ValidationCode::CrossModelConditionalEdge,
                link.link_id,
                format!(
                    "conditional container '{}' links into model '{}' without a cross-feature link",
                    source.name, link.target_entity_id
                ),
            ));
        }

        if !resolved {
            continue;
        }
        match graph.insert(link.clone()) {
            Ok(()) => {}
            Err(DomainError::CycleDetected { .. }) => errors.push(ValidationIssue::link(
                ValidationCode::CycleDetected,
                link.link_id,
                format!(
                    "link '{}' closes a cycle among nodes of model '{}'",
                    link.link_id, snapshot.model_id
                ),
            )),
            Err(DomainError::DuplicateLink(id)) => errors.push(ValidationIssue::link(
                ValidationCode::DuplicateLinkId,
                id,
                format!("link id '{id}' appears more than once"),
            )),
            Err(other) => errors.push(ValidationIssue::link(
                ValidationCode::InvalidLink,
                link.link_id,
                other.to_string(),
            )),
        }
    }

    ValidationResult::from_issues(errors, warnings)
}

/// Semantic pass.
///
/// A node in `priority` mode must not share its priority with any sibling
/// (same `parent_id`) that is not in `parallel` mode. Siblings outside
/// `priority` mode never clash with each other.
pub fn validate_semantics(snapshot: &ModelSnapshot) -> ValidationResult {
    let nodes = live_nodes(snapshot);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for &node in &nodes {
        check_node_semantics(node, &mut errors);
    }

    // Siblings share a parent; top-level containers are siblings of each other.
    let mut siblings: BTreeMap<Option<NodeId>, Vec<&Node>> = BTreeMap::new();
    for &node in &nodes {
        siblings.entry(node.parent_id).or_default().push(node);
    }
    for group in siblings.values() {
        let mut priorities: HashMap<i32, Vec<&Node>> = HashMap::new();
        let mut orders: HashMap<u32, &Node> = HashMap::new();
        for &node in group {
            if node.execution_mode != ExecutionMode::Parallel {
                let peers = priorities.entry(node.priority).or_default();
                let clash = peers.iter().find(|peer| {
                    peer.execution_mode == ExecutionMode::Priority
                        || node.execution_mode == ExecutionMode::Priority
                });
                if let Some(first) = clash {
                    errors.push(ValidationIssue::node(
                        ValidationCode::DuplicatePriority,
                        node.id,
                        format!(
                            "'{}' and '{}' share priority {} in the same container",
                            first.name, node.name, node.priority
                        ),
                    ));
                }
                peers.push(node);
            }
            if let Some(first) = orders.insert(node.execution_order, node) {
                warnings.push(ValidationIssue::node(
                    ValidationCode::DuplicateExecutionOrder,
                    node.id,
                    format!(
                        "'{}' and '{}' share execution order {}",
                        first.name, node.name, node.execution_order
                    ),
                ));
            }
        }
    }

    ValidationResult::from_issues(errors, warnings)
}

/// The semantic checks for a single node and the shape of its direct links.
/// Used by the executor before dispatching.
pub fn validate_node(node: &Node, links: &[Link]) -> ValidationResult {
    let mut errors = Vec::new();
    check_node_semantics(node, &mut errors);
    for link in links.iter().filter(|l| l.touches_node(&node.id)) {
        if let Err(err) = link.validate() {
            errors.push(ValidationIssue::link(ValidationCode::InvalidLink, link.link_id, err.to_string()));
        }
    }
    ValidationResult::from_issues(errors, Vec::new())
}

/// Same-model nodes in dependency order, ties broken by `execution_order`
/// then snapshot position. `None` when the links contain a cycle.
pub fn execution_plan(snapshot: &ModelSnapshot) -> Option<Vec<NodeId>> {
    let nodes = live_nodes(snapshot);
    let rank: HashMap<NodeId, (u32, usize)> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id, (n.execution_order, i)))
        .collect();

    let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut in_degree: HashMap<NodeId, usize> = rank.keys().map(|id| (*id, 0)).collect();
    for (source, target) in snapshot.links.iter().filter_map(Link::same_model_edge) {
        if !rank.contains_key(&source) || !rank.contains_key(&target) {
            continue;
        }
        adjacency.entry(source).or_default().push(target);
        *in_degree.entry(target).or_insert(0) += 1;
    }

    // Kahn's algorithm with an ordered ready set.
    let mut ready: BTreeSet<((u32, usize), NodeId)> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(id, _)| (rank[id], *id))
        .collect();
    let mut sorted = Vec::with_capacity(rank.len());
    while let Some(entry) = ready.pop_first() {
        let (_, node_id) = entry;
        sorted.push(node_id);
        for next in adjacency.get(&node_id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert((rank[next], *next));
                }
            }
        }
    }

    (sorted.len() == rank.len()).then_some(sorted)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn live_nodes(snapshot: &ModelSnapshot) -> Vec<&Node> {
    snapshot.nodes.iter().filter(|n| !n.is_deleted()).collect()
}

fn check_node_semantics(node: &Node, errors: &mut Vec<ValidationIssue>) {
    if node.name.trim().is_empty() {
        errors.push(ValidationIssue::node(
            ValidationCode::InvalidConfiguration,
            node.id,
            DomainError::EmptyName.to_string(),
        ));
    }
    if let Err(err) = node.configuration.validate() {
        errors.push(ValidationIssue::node(
            ValidationCode::InvalidConfiguration,
            node.id,
            format!("node '{}': {err}", node.name),
        ));
    }
    match &node.retry_policy {
        Some(policy) => {
            if let Err(err) = policy.validate() {
                errors.push(ValidationIssue::node(
                    ValidationCode::InvalidRetryPolicy,
                    node.id,
                    format!("node '{}': {err}", node.name),
                ));
            }
        }
        None if node.execution_mode == ExecutionMode::Conditional => {
            errors.push(ValidationIssue::node(
                ValidationCode::MissingRetryPolicy,
                node.id,
                format!("conditional node '{}' needs a retry policy", node.name),
            ));
        }
        None => {}
    }
}

/// Node ids on in-model function-model ends that do not resolve. Ends in
/// other models or features are resolved by their owners.
fn unresolved_endpoints(link: &Link, model_id: &str, by_id: &HashMap<NodeId, &Node>) -> Vec<NodeId> {
    [
        (link.source_feature, link.source_entity_id.as_str(), link.source_node_id),
        (link.target_feature, link.target_entity_id.as_str(), link.target_node_id),
    ]
    .into_iter()
    .filter(|(feature, entity, _)| *feature == FeatureType::FunctionModel && *entity == model_id)
    .filter_map(|(_, _, node_id)| node_id)
    .filter(|node_id| !by_id.contains_key(node_id))
    .collect()
}

/// The source container when a conditional container in this model points
/// a plain node link at a node of another model.
fn conditional_container_source<'a>(
    link: &Link,
    model_id: &str,
    by_id: &HashMap<NodeId, &'a Node>,
) -> Option<&'a Node> {
    let plain_node_link = link.source_feature == FeatureType::FunctionModel
        && link.target_feature == FeatureType::FunctionModel
        && link.target_node_id.is_some();
    if !plain_node_link
        || link.source_entity_id != model_id
        || link.target_entity_id == model_id
    {
        return None;
    }
    let source = by_id.get(&link.source_node_id?)?;
    (source.is_container() && source.execution_mode == ExecutionMode::Conditional).then_some(*source)
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;
    use domain::{
        BackoffStrategy, IoConfiguration, IoType, KbAccessType, KbConfiguration, LinkProps,
        NodeConfiguration, NodeProps, RetryPolicy, StageConfiguration, TetherConfiguration,
    };

    const MODEL: &str = "order-flow";

    fn stage(name: &str) -> Node {
        Node::create(NodeProps::new(
            MODEL,
            name,
            NodeConfiguration::StageNode(StageConfiguration {
                stage_type: "review".into(),
                container: Default::default(),
            }),
        ))
        .unwrap()
    }

    fn action(name: &str, parent: &Node) -> Node {
        Node::create(
            NodeProps::new(
                MODEL,
                name,
                NodeConfiguration::KbNode(KbConfiguration {
                    kb_reference_id: "kb-1".into(),
                    access_type: KbAccessType::Read,
                    search_keywords: vec![],
                }),
            )
            .with_parent(parent.id),
        )
        .unwrap()
    }

    fn link(from: &Node, to: &Node) -> Link {
        Link::create(LinkProps::node_link(MODEL, from.id, to.id)).unwrap()
    }

    fn snapshot(nodes: Vec<Node>, links: Vec<Link>) -> ModelSnapshot {
        ModelSnapshot {
            model_id: MODEL.into(),
            nodes,
            links,
        }
    }

    #[test]
    fn well_formed_model_is_valid() {
        let a = stage("A");
        let (b, c) = (action("B", &a), action("C", &a).tap_order(1));
        let snap = snapshot(vec![a.clone(), b.clone(), c.clone()], vec![link(&a, &b), link(&b, &c)]);

        let result = validate_model(&snap);
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn closing_link_is_the_only_cycle_error() {
        let a = stage("A");
        let (b, c) = (action("B", &a), action("C", &a).tap_order(1));
        let back = link(&c, &a);
        let snap = snapshot(
            vec![a.clone(), b.clone(), c.clone()],
            vec![link(&a, &b), link(&b, &c), back.clone()],
        );

        let result = validate_model(&snap);
        let cycles: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.code == ValidationCode::CycleDetected)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].link_id, Some(back.link_id));
        assert!(!result.is_valid);
    }

    #[test]
    fn validation_is_idempotent() {
        let a = stage("A");
        let mut orphan = action("B", &a);
        orphan.parent_id = Some(NodeId::new());
        let snap = snapshot(vec![a.clone(), orphan.clone()], vec![link(&orphan, &a), link(&a, &orphan)]);

        assert_eq!(validate_model(&snap), validate_model(&snap));
    }

    #[test]
    fn all_violations_are_reported_together() {
        let a = stage("A");
        let mut orphan = action("Orphan", &a);
        orphan.parent_id = Some(NodeId::new());
        let mut broken = action("Broken", &a);
        broken.configuration = NodeConfiguration::TetherNode(TetherConfiguration {
            tether_reference_id: " ".into(),
            trigger_conditions: vec![],
            execution_parameters: Default::default(),
        });
        let dangling = Link::create(LinkProps::node_link(MODEL, a.id, NodeId::new())).unwrap();

        let result = validate_model(&snapshot(vec![a, orphan, broken], vec![dangling]));
        assert!(result.has_error(ValidationCode::OrphanNode));
        assert!(result.has_error(ValidationCode::InvalidConfiguration));
        assert!(result.has_error(ValidationCode::UnresolvedEndpoint));
    }

    #[test]
    fn action_under_action_is_rejected() {
        let a = stage("A");
        let b = action("B", &a);
        let mut c = action("C", &a);
        c.parent_id = Some(b.id);
        let result = validate_structure(&snapshot(vec![a, b, c.clone()], vec![]));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ValidationCode::InvalidParent);
        assert_eq!(result.errors[0].node_id, Some(c.id));
    }

    #[test]
    fn conditional_mode_requires_a_retry_policy() {
        let a = stage("A");
        let mut b = action("B", &a);
        b.execution_mode = ExecutionMode::Conditional;
        let mut c = action("C", &a).tap_order(1);
        c.execution_mode = ExecutionMode::Conditional;
        c.retry_policy = Some(RetryPolicy::new(2, BackoffStrategy::Fixed, 10, 0).unwrap());

        let result = validate_semantics(&snapshot(vec![a, b.clone(), c], vec![]));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ValidationCode::MissingRetryPolicy);
        assert_eq!(result.errors[0].node_id, Some(b.id));
    }

    #[test]
    fn priority_siblings_need_distinct_priorities() {
        let a = stage("A");
        let other = stage("Other");
        let mut b = action("B", &a);
        let mut c = action("C", &a).tap_order(1);
        let mut d = action("D", &other);
        for node in [&mut b, &mut c, &mut d] {
            node.execution_mode = ExecutionMode::Priority;
            node.priority = 5;
        }

        let result = validate_semantics(&snapshot(vec![a, other, b, c.clone(), d], vec![]));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ValidationCode::DuplicatePriority);
        assert_eq!(result.errors[0].node_id, Some(c.id));
    }

    #[test]
    fn priority_node_clashes_with_sequential_sibling() {
        let a = stage("A");
        let mut b = action("B", &a);
        let mut c = action("C", &a).tap_order(1);
        b.execution_mode = ExecutionMode::Priority;
        b.priority = 5;
        c.priority = 5;

        let result = validate_semantics(&snapshot(vec![a, b, c.clone()], vec![]));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ValidationCode::DuplicatePriority);
        assert_eq!(result.errors[0].node_id, Some(c.id));
    }

    #[test]
    fn sequential_siblings_may_share_priority() {
        let a = stage("A");
        let (b, c) = (action("B", &a), action("C", &a).tap_order(1));
        assert!(validate_semantics(&snapshot(vec![a, b, c], vec![])).is_valid);
    }

    #[test]
    fn parallel_siblings_may_share_priority() {
        let a = stage("A");
        let mut b = action("B", &a);
        let mut c = action("C", &a).tap_order(1);
        for node in [&mut b, &mut c] {
            node.execution_mode = ExecutionMode::Parallel;
            node.priority = 5;
        }
        assert!(validate_semantics(&snapshot(vec![a, b, c], vec![])).is_valid);
    }

    #[test]
    fn warnings_do_not_block() {
        let a = stage("A");
        let lonely = stage("Lonely").tap_order(1);
        let b = action("B", &a);
        let c = action("C", &a);

        let result = validate_model(&snapshot(vec![a, lonely, b, c], vec![]));
        assert!(result.is_valid);
        let codes: Vec<_> = result.warnings.iter().map(|w| w.code).collect();
        assert_eq!(
            codes,
            vec![ValidationCode::EmptyContainer, ValidationCode::DuplicateExecutionOrder]
        );
    }

    #[test]
    fn conditional_container_cannot_reach_into_another_model() {
        let mut a = stage("A");
        a.execution_mode = ExecutionMode::Conditional;
        a.retry_policy = Some(RetryPolicy::new(1, BackoffStrategy::Fixed, 0, 0).unwrap());
        let b = action("B", &a);
        let mut props = LinkProps::node_link(MODEL, a.id, NodeId::new());
        props.target_entity_id = "billing".into();
        let across = Link::create(props).unwrap();

        let result = validate_structure(&snapshot(vec![a, b], vec![across.clone()]));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ValidationCode::CrossModelConditionalEdge);
        assert_eq!(result.errors[0].link_id, Some(across.link_id));
    }

    #[test]
    fn cross_feature_link_from_conditional_container_is_allowed() {
        let mut a = stage("A");
        a.execution_mode = ExecutionMode::Conditional;
        let b = action("B", &a);
        let mut props = LinkProps::node_link(MODEL, a.id, b.id);
        props.target_feature = FeatureType::KnowledgeBase;
        props.target_entity_id = "kb-9".into();
        props.target_node_id = None;
        let across = Link::create(props).unwrap();

        assert!(validate_structure(&snapshot(vec![a, b], vec![across])).is_valid);
    }

    #[test]
    fn deleted_nodes_are_ignored() {
        let a = stage("A");
        let mut gone = stage("Gone").tap_order(1);
        gone.mark_deleted();
        let b = action("B", &a);
        let result = validate_model(&snapshot(vec![a, gone, b], vec![]));
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn node_scope_checks_only_the_node_and_its_links() {
        let io = Node::create(NodeProps::new(
            MODEL,
            "Input",
            NodeConfiguration::IoNode(IoConfiguration {
                io_type: IoType::Input,
                data_contract: vec!["order_id".into()],
                container: Default::default(),
            }),
        ))
        .unwrap();
        let mut bad_link = link(&io, &stage("Elsewhere"));
        bad_link.link_strength = 2.0;

        let result = validate_node(&io, &[bad_link.clone()]);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].link_id, Some(bad_link.link_id));
        assert!(validate_node(&io, &[]).is_valid);
    }

    #[test]
    fn execution_plan_follows_links_then_order() {
        let a = stage("A");
        let b = action("B", &a).tap_order(2);
        let c = action("C", &a).tap_order(1);
        let snap = snapshot(vec![a.clone(), b.clone(), c.clone()], vec![link(&b, &c)]);
        assert_eq!(execution_plan(&snap), Some(vec![a.id, b.id, c.id]));

        let cyclic = snapshot(vec![a.clone(), b.clone()], vec![link(&a, &b), link(&b, &a)]);
        assert_eq!(execution_plan(&cyclic), None);
    }

    trait TapOrder {
        fn tap_order(self, order: u32) -> Self;
    }

    impl TapOrder for Node {
        fn tap_order(mut self, order: u32) -> Self {
            self.execution_order = order;
            self
        }
    }
}
