//! Link arena with adjacency for same-model edges.
//!
//! Links are stored by id; traversal goes through id lookups only. Every
//! insertion of a same-model node edge runs an incremental DFS from the new
//! edge's target: if the source is reachable the edge would close a cycle
//! and is rejected, so the accepted edges always form a DAG.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::{DomainError, Link, LinkId, NodeId};

#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    links: BTreeMap<LinkId, Link>,
    /// Insertion order, so iteration is stable across runs.
    order: Vec<LinkId>,
    /// node -> targets of its same-model outgoing edges
    adjacency: HashMap<NodeId, Vec<NodeId>>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph by inserting links in the given order.
    ///
    /// # Errors
    /// The first error returned by [`LinkGraph::insert`].
    pub fn from_links<I>(links: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = Link>,
    {
        let mut graph = Self::new();
        for link in links {
            graph.insert(link)?;
        }
        Ok(graph)
    }

    /// Validate and insert a link.
    ///
    /// # Errors
    /// - Any error from [`Link::validate`].
    /// - [`DomainError::DuplicateLink`] if the id is already present.
    /// - [`DomainError::CycleDetected`] if the edge would close a cycle.
    pub fn insert(&mut self, link: Link) -> Result<(), DomainError> {
        link.validate()?;
        if self.links.contains_key(&link.link_id) {
            return Err(DomainError::DuplicateLink(link.link_id));
        }
        if let Some((source, target)) = link.same_model_edge() {
            if self.would_close_cycle(source, target) {
                debug!(link_id = %link.link_id, %source, %target, "link would close a cycle");
                return Err(DomainError::CycleDetected {
                    link_id: link.link_id,
                    source_node: source,
                    target_node: target,
                });
            }
            self.adjacency.entry(source).or_default().push(target);
        }
        self.order.push(link.link_id);
        self.links.insert(link.link_id, link);
        Ok(())
    }

    /// Whether adding `source -> target` would make `source` reachable
    /// from itself.
    pub fn would_close_cycle(&self, source: NodeId, target: NodeId) -> bool {
        if source == target {
            return true;
        }
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut stack = vec![target];
        while let Some(current) = stack.pop() {
            if current == source {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(next) = self.adjacency.get(&current) {
                stack.extend(next.iter().copied().filter(|n| !visited.contains(n)));
            }
        }
        false
    }

    pub fn get(&self, link_id: &LinkId) -> Option<&Link> {
        self.links.get(link_id)
    }

    /// All links in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.order.iter().filter_map(|id| self.links.get(id))
    }

    /// Links with either end in the given function model.
    pub fn links_for_model<'a>(&'a self, model_id: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.iter().filter(move |link| link.touches_model(model_id))
    }

    /// Links with either end on the given node.
    pub fn links_for_node<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a Link> + 'a {
        self.iter().filter(move |link| link.touches_node(node_id))
    }

    /// Targets of the node's same-model outgoing edges.
    pub fn successors(&self, node_id: &NodeId) -> &[NodeId] {
        self.adjacency.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn into_links(self) -> Vec<Link> {
        let Self { mut links, order, .. } = self;
        order.into_iter().filter_map(|id| links.remove(&id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinkProps;

    fn edge(model: &str, from: NodeId, to: NodeId) -> Link {
        Link::create(LinkProps::node_link(model, from, to)).expect("valid link")
    }

    #[test]
    fn linear_chain_is_accepted() {
        let (a, b, c) = (NodeId::new(), NodeId::new(), NodeId::new());
        let graph = LinkGraph::from_links([edge("m", a, b), edge("m", b, c)]).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.successors(&a), &[b]);
    }

    #[test]
    fn diamond_is_accepted() {
        //   A
        //  / \
        // B   C
        //  \ /
        //   D
        let (a, b, c, d) = (NodeId::new(), NodeId::new(), NodeId::new(), NodeId::new());
        let graph = LinkGraph::from_links([
            edge("m", a, b),
            edge("m", a, c),
            edge("m", b, d),
            edge("m", c, d),
        ]);
        assert!(graph.is_ok());
    }

    #[test]
    fn closing_edge_is_rejected_in_every_insertion_order() {
        let (a, b, c) = (NodeId::new(), NodeId::new(), NodeId::new());
        let edges = [edge("m", a, b), edge("m", b, c), edge("m", c, a)];
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

        for order in orders {
            let mut graph = LinkGraph::new();
            let mut rejected = Vec::new();
            for i in order {
                if let Err(err) = graph.insert(edges[i].clone()) {
                    assert!(matches!(err, DomainError::CycleDetected { .. }));
                    rejected.push(i);
                }
            }
            assert_eq!(rejected.len(), 1, "order {order:?}");
            assert_eq!(rejected[0], order[2], "the last edge closes the cycle");
        }
    }

    #[test]
    fn rejected_edge_leaves_graph_unchanged() {
        let (a, b) = (NodeId::new(), NodeId::new());
        let mut graph = LinkGraph::from_links([edge("m", a, b)]).unwrap();
        assert!(graph.insert(edge("m", b, a)).is_err());
        assert_eq!(graph.len(), 1);
        assert!(graph.successors(&b).is_empty());
    }

    #[test]
    fn cross_model_edges_do_not_participate_in_cycles() {
        let (a, b) = (NodeId::new(), NodeId::new());
        let mut back = LinkProps::node_link("m1", b, a);
        back.target_entity_id = "m2".into();
        let back = Link::create(back).unwrap();

        let graph = LinkGraph::from_links([edge("m1", a, b), back]);
        assert!(graph.is_ok());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let link = edge("m", NodeId::new(), NodeId::new());
        let mut graph = LinkGraph::new();
        graph.insert(link.clone()).unwrap();
        assert!(matches!(graph.insert(link), Err(DomainError::DuplicateLink(_))));
    }

    #[test]
    fn lookups_by_model_and_node() {
        let (a, b, c) = (NodeId::new(), NodeId::new(), NodeId::new());
        let graph = LinkGraph::from_links([edge("m1", a, b), edge("m2", c, NodeId::new())]).unwrap();
        assert_eq!(graph.links_for_model("m1").count(), 1);
        assert_eq!(graph.links_for_node(&b).count(), 1);
        assert_eq!(graph.links_for_node(&c).count(), 1);
        assert_eq!(graph.into_links().len(), 2);
    }
}
