//! Tree-to-tree composer: matches tree-rule fragments against
//! an input parse forest bottom-up and builds the corresponding output
//! forest, sharing internal target nodes by structural dedup. Grounded on
//! `cicada`'s `ComposeTree`, simplified from its precompiled tree-transducer
//! automaton to direct recursive fragment matching against forest edges —
//! the same "drop the on-disk automaton, keep the matching semantics"
//! simplification `TrieGrammar` already makes for phrase composition. Every
//! outgoing edge at a node is tried against a fragment, and every successful
//! match becomes its own alternative edge at the rewritten node, so
//! ambiguity in the input forest survives into the output forest instead of
//! collapsing to whichever edge matched first.

use std::collections::HashMap;
use std::rc::Rc;

use forge_core::feature::FeatureVector;
use forge_core::hypergraph::{Edge, Hypergraph, NodeId};
use forge_core::rule::{intern_rule, Rule};
use forge_core::symbol::Symbol;
use forge_core::tree_rule::TreeRule;

use crate::error::ComposeError;

/// One `(source pattern, target pattern, feature contribution)` entry.
pub struct TreeGrammar {
    entries: Vec<(TreeRule, TreeRule, FeatureVector)>,
}

impl TreeGrammar {
    pub fn new() -> Self {
        TreeGrammar { entries: Vec::new() }
    }

    pub fn insert(&mut self, source: TreeRule, target: TreeRule, features: FeatureVector) {
        self.entries.push((source, target, features));
    }
}

impl Default for TreeGrammar {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TreeComposer<'g> {
    goal: Symbol,
    grammar: &'g TreeGrammar,
    rule_goal: Rc<Rule>,
}

impl<'g> TreeComposer<'g> {
    pub fn new(goal: Symbol, grammar: &'g TreeGrammar) -> Self {
        let rule_goal = intern_rule(Symbol::goal(), vec![goal.non_terminal()]);
        TreeComposer { goal, grammar, rule_goal }
    }

    pub fn compose(&self, forest: &Hypergraph) -> Result<Hypergraph, ComposeError> {
        if !forest.is_valid() {
            return Ok(Hypergraph::new());
        }

        let mut graph = Hypergraph::new();
        let mut node_map: HashMap<NodeId, HashMap<Symbol, NodeId>> = HashMap::new();
        let mut dedup: HashMap<(Vec<NodeId>, Vec<Symbol>, Symbol), NodeId> = HashMap::new();

        for idx in 0..forest.nodes.len() {
            let node_id = NodeId(idx as u32);
            tracing::trace!(node = idx, "tree composer matching fragments at node");
            let edges = &forest.nodes[node_id.index()].edges;
            let Some(&first_edge) = edges.first() else { continue };
            let Some(root_label) = forest.edges[first_edge.index()].rule.as_ref().map(|r| r.lhs.non_terminal()) else {
                continue;
            };

            for (source, target, features) in &self.grammar.entries {
                if source.label.non_terminal() != root_label {
                    continue;
                }
                for frontier in Self::match_source(forest, node_id, source) {
                    self.apply_rule(&mut graph, node_id, target, &frontier, features.clone(), &mut node_map, &mut dedup);
                }
            }
        }

        let goal_label = self.goal.non_terminal();
        if let Some(&out_node) = node_map.get(&forest.goal).and_then(|m| m.get(&goal_label)) {
            let edge = graph.add_edge(vec![out_node], Some(Rc::clone(&self.rule_goal)), FeatureVector::new(), Default::default());
            graph.goal = graph.add_node();
            graph.connect_edge(edge, graph.goal);
            graph = forge_core::sort::topological_sort_unfiltered(&graph)?;
        }

        Ok(graph)
    }

    /// Tries to match `fragment` (an internal tree-rule node) against every
    /// outgoing edge at `node_id`, not just the first one that fits.
    /// Returns every successful match's frontier-variable bindings, each in
    /// the fragment's left-to-right order — one entry per alternative
    /// derivation the input forest offers at this node.
    fn match_source(forest: &Hypergraph, node_id: NodeId, fragment: &TreeRule) -> Vec<Vec<NodeId>> {
        let mut matches = Vec::new();
        for &edge_id in &forest.nodes[node_id.index()].edges {
            let edge = &forest.edges[edge_id.index()];
            let Some(rule) = &edge.rule else { continue };
            if rule.lhs.non_terminal() != fragment.label.non_terminal() {
                continue;
            }
            matches.extend(Self::match_rhs(forest, rule, edge, &fragment.antecedents));
        }
        matches
    }

    /// Matches one edge's rule against `antecedents`, returning every
    /// alternative frontier binding the edge supports. A non-leaf
    /// antecedent recurses via [`Self::match_source`], which may itself
    /// offer several alternatives at its tail node; those are combined with
    /// whatever the rest of the rhs produces, so ambiguity nested several
    /// levels deep still surfaces as distinct top-level matches.
    fn match_rhs(forest: &Hypergraph, rule: &Rule, edge: &Edge, antecedents: &[TreeRule]) -> Vec<Vec<NodeId>> {
        if rule.rhs.len() != antecedents.len() {
            return Vec::new();
        }
        let mut partial: Vec<Vec<NodeId>> = vec![Vec::new()];
        let mut tail_idx = 0usize;
        for (rhs_sym, child) in rule.rhs.iter().zip(antecedents) {
            if rhs_sym.is_non_terminal() {
                let Some(&tail) = edge.tails.get(tail_idx) else { return Vec::new() };
                tail_idx += 1;
                if child.is_leaf() {
                    if !child.label.is_non_terminal() {
                        return Vec::new();
                    }
                    for bound in &mut partial {
                        bound.push(tail);
                    }
                } else {
                    let sub_matches = Self::match_source(forest, tail, child);
                    if sub_matches.is_empty() {
                        return Vec::new();
                    }
                    let mut combined = Vec::with_capacity(partial.len() * sub_matches.len());
                    for bound in &partial {
                        for sub in &sub_matches {
                            let mut next = bound.clone();
                            next.extend(sub.iter().copied());
                            combined.push(next);
                        }
                    }
                    partial = combined;
                }
            } else if !(child.is_leaf() && !child.label.is_non_terminal() && child.label == *rhs_sym) {
                return Vec::new();
            }
        }
        partial
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_rule(
        &self,
        graph: &mut Hypergraph,
        root_input: NodeId,
        target: &TreeRule,
        frontier: &[NodeId],
        features: FeatureVector,
        node_map: &mut HashMap<NodeId, HashMap<Symbol, NodeId>>,
        dedup: &mut HashMap<(Vec<NodeId>, Vec<Symbol>, Symbol), NodeId>,
    ) {
        let label = target.label.non_terminal();
        let head = *node_map.entry(root_input).or_default().entry(label).or_insert_with(|| graph.add_node());

        let mut pos = 0usize;
        let (rhs, tails) = Self::build_rhs_and_tails(&target.antecedents, frontier, &mut pos, graph, dedup);
        let rule = intern_rule(label, rhs);
        let edge = graph.add_edge(tails, Some(rule), features, Default::default());
        graph.connect_edge(edge, head);
    }

    /// Builds an internal target-tree node, reusing a prior node with the
    /// same `(tails, rhs, label)` shape instead of creating a duplicate.
    fn construct_internal(
        fragment: &TreeRule,
        frontier: &[NodeId],
        pos: &mut usize,
        graph: &mut Hypergraph,
        dedup: &mut HashMap<(Vec<NodeId>, Vec<Symbol>, Symbol), NodeId>,
    ) -> NodeId {
        let (rhs, tails) = Self::build_rhs_and_tails(&fragment.antecedents, frontier, pos, graph, dedup);
        let label = fragment.label.non_terminal();
        let key = (tails.clone(), rhs.clone(), label);
        if let Some(&node) = dedup.get(&key) {
            return node;
        }
        let rule = intern_rule(label, rhs);
        let head = graph.add_edge_to_new_node(tails, Some(rule), FeatureVector::new(), Default::default());
        dedup.insert(key, head);
        head
    }

    fn build_rhs_and_tails(
        antecedents: &[TreeRule],
        frontier: &[NodeId],
        pos: &mut usize,
        graph: &mut Hypergraph,
        dedup: &mut HashMap<(Vec<NodeId>, Vec<Symbol>, Symbol), NodeId>,
    ) -> (Vec<Symbol>, Vec<NodeId>) {
        let mut rhs = Vec::new();
        let mut tails = Vec::new();
        for child in antecedents {
            if child.is_leaf() && child.label.is_non_terminal() {
                let bound = match child.label.non_terminal_index() {
                    Some(k) if k > 0 => frontier[k - 1],
                    _ => {
                        let p = *pos;
                        *pos += 1;
                        frontier[p]
                    }
                };
                rhs.push(child.label.non_terminal());
                tails.push(bound);
            } else if child.is_leaf() {
                rhs.push(child.label);
            } else {
                let node = Self::construct_internal(child, frontier, pos, graph, dedup);
                rhs.push(child.label.non_terminal());
                tails.push(node);
            }
        }
        (rhs, tails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    fn build_input_forest() -> Hypergraph {
        // (NP (DT the) (NN dog)) as a two-edge forest: [NP] -> [DT] [NN],
        // each a unary edge over its terminal.
        let mut g = Hypergraph::new();
        let dt = g.add_edge_to_new_node(vec![], Some(intern_rule(sym("[DT]"), vec![sym("the")])), FeatureVector::new(), Default::default());
        let nn = g.add_edge_to_new_node(vec![], Some(intern_rule(sym("[NN]"), vec![sym("dog")])), FeatureVector::new(), Default::default());
        let np = g.add_edge_to_new_node(vec![dt, nn], Some(intern_rule(sym("[NP]"), vec![sym("[DT,1]"), sym("[NN,2]")])), FeatureVector::new(), Default::default());
        g.goal = np;
        g
    }

    #[test]
    fn matches_and_rewrites_a_two_child_fragment() {
        let forest = build_input_forest();

        let source = TreeRule::internal(sym("[NP]"), vec![TreeRule::leaf(sym("[DT,1]")), TreeRule::leaf(sym("[NN,2]"))]);
        let target = TreeRule::internal(sym("[NP]"), vec![TreeRule::leaf(sym("[NN,2]")), TreeRule::leaf(sym("[DT,1]"))]);

        let mut grammar = TreeGrammar::new();
        grammar.insert(source, target, FeatureVector::new());

        let composer = TreeComposer::new(sym("[NP]"), &grammar);
        let out = composer.compose(&forest).unwrap();
        assert!(out.has_goal());
        assert!(out.is_valid());
    }

    #[test]
    fn no_matching_rule_yields_empty_goal() {
        let forest = build_input_forest();
        let grammar = TreeGrammar::new();
        let composer = TreeComposer::new(sym("[NP]"), &grammar);
        let out = composer.compose(&forest).unwrap();
        assert!(!out.has_goal());
    }

    #[test]
    fn invalid_input_forest_yields_empty_graph() {
        let forest = Hypergraph::new();
        let grammar = TreeGrammar::new();
        let composer = TreeComposer::new(sym("[NP]"), &grammar);
        let out = composer.compose(&forest).unwrap();
        assert!(!out.has_goal());
    }
}
