//! The hypergraph data model: nodes, edges, rules, and the goal pointer.
//!
//! Every edge is connected to exactly one head (the node whose `edges`
//! list contains it), and no cycle is reachable from `goal`.

use std::rc::Rc;

use crate::attribute::AttributeMap;
use crate::feature::FeatureVector;
use crate::rule::Rule;

/// A node id, or the sentinel `NodeId::INVALID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(u32::MAX);

    pub fn is_valid(&self) -> bool {
        *self != NodeId::INVALID
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// An edge id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub u32);

impl EdgeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A hypergraph node: the set of edges that terminate here (i.e. have
/// `head == this node's id`).
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub edges: Vec<EdgeId>,
}

/// A hyperedge: a rule instantiation connecting `tails` to `head`, carrying
/// accumulated feature contributions and side-channel attributes.
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub head: NodeId,
    pub tails: Vec<NodeId>,
    pub rule: Option<Rc<Rule>>,
    pub features: FeatureVector,
    pub attributes: AttributeMap,
}

impl Edge {
    fn detached(tails: Vec<NodeId>, rule: Option<Rc<Rule>>, features: FeatureVector, attributes: AttributeMap) -> Self {
        Edge {
            id: EdgeId(0),
            head: NodeId::INVALID,
            tails,
            rule,
            features,
            attributes,
        }
    }
}

/// A directed hypergraph with a single designated goal node.
#[derive(Debug, Clone, Default)]
pub struct Hypergraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub goal: NodeId,
}

impl Hypergraph {
    pub fn new() -> Self {
        Hypergraph {
            nodes: Vec::new(),
            edges: Vec::new(),
            goal: NodeId::INVALID,
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.goal = NodeId::INVALID;
    }

    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::default());
        id
    }

    /// Appends a new, as-yet-unconnected edge. Call [`Hypergraph::connect_edge`]
    /// to assign its head and register it on that node's `edges` list.
    pub fn add_edge(
        &mut self,
        tails: Vec<NodeId>,
        rule: Option<Rc<Rule>>,
        features: FeatureVector,
        attributes: AttributeMap,
    ) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        let mut edge = Edge::detached(tails, rule, features, attributes);
        edge.id = id;
        self.edges.push(edge);
        id
    }

    pub fn connect_edge(&mut self, edge: EdgeId, head: NodeId) {
        self.edges[edge.index()].head = head;
        self.nodes[head.index()].edges.push(edge);
    }

    /// Convenience: builds a node, an edge into it, and connects the two.
    pub fn add_edge_to_new_node(
        &mut self,
        tails: Vec<NodeId>,
        rule: Option<Rc<Rule>>,
        features: FeatureVector,
        attributes: AttributeMap,
    ) -> NodeId {
        let head = self.add_node();
        let edge = self.add_edge(tails, rule, features, attributes);
        self.connect_edge(edge, head);
        head
    }

    /// `true` iff `goal` points at a real node. Does *not* check
    /// acyclicity — use [`crate::sort::topological_sort`] for that (it
    /// returns `Err(CycleDetected)` when the goal subgraph is cyclic).
    pub fn has_goal(&self) -> bool {
        self.goal.is_valid() && self.goal.index() < self.nodes.len()
    }

    /// Full validity: a real goal and an acyclic goal subgraph.
    pub fn is_valid(&self) -> bool {
        if !self.has_goal() {
            return false;
        }
        crate::sort::topological_sort(self, |_| false).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureVector;
    use crate::symbol::Symbol;

    #[test]
    fn empty_graph_has_no_goal() {
        let g = Hypergraph::new();
        assert!(!g.has_goal());
        assert!(!g.is_valid());
    }

    #[test]
    fn single_edge_graph_is_valid() {
        let mut g = Hypergraph::new();
        let rule = crate::rule::intern_rule(Symbol::intern("[S]"), vec![Symbol::intern("a")]);
        let leaf = g.add_node();
        let head = g.add_edge_to_new_node(vec![], Some(rule), FeatureVector::new(), Default::default());
        assert_eq!(leaf, NodeId(0));
        g.goal = head;
        assert!(g.is_valid());
    }

    #[test]
    fn self_loop_is_invalid() {
        let mut g = Hypergraph::new();
        let node = g.add_node();
        let edge = g.add_edge(vec![node], None, FeatureVector::new(), Default::default());
        g.connect_edge(edge, node);
        g.goal = node;
        assert!(!g.is_valid());
    }
}
