//! CKY parsing of a lattice against one or more phrase grammars. Grounded
//! on `cicada`'s `QueryTreeCKY`, keeping only its flat-grammar half (the
//! tree-grammar half belongs to tree-to-tree composition, already covered
//! by `forge_compose::tree`): active items
//! advance span-by-span consuming terminals and passive (already-reduced)
//! items; completed actives become passive items and a hyperedge; a
//! stall-capped unary closure saturates each cell before it feeds larger
//! spans.

use std::collections::HashMap;
use std::rc::Rc;

use forge_core::feature::FeatureVector;
use forge_core::hypergraph::{Hypergraph, NodeId};
use forge_core::lattice::Lattice;
use forge_core::rule::{intern_rule, Rule};
use forge_core::symbol::Symbol;

use forge_compose::{PhraseTransducer, TransducerNode};

use crate::config::ParseConfig;
use crate::error::ParseError;

#[derive(Clone)]
struct Active {
    node: TransducerNode,
    tails: Vec<NodeId>,
}

type Span = (usize, usize);

pub struct CkyParser<'g> {
    grammars: &'g [Box<dyn PhraseTransducer>],
    goal: Symbol,
    config: ParseConfig,
    rule_goal: Rc<Rule>,
}

impl<'g> CkyParser<'g> {
    pub fn new(goal: Symbol, grammars: &'g [Box<dyn PhraseTransducer>], config: ParseConfig) -> Self {
        let rule_goal = intern_rule(Symbol::goal(), vec![goal.non_terminal()]);
        CkyParser { grammars, goal, config, rule_goal }
    }

    pub fn parse(&self, lattice: &Lattice) -> Result<Hypergraph, ParseError> {
        if !lattice.is_well_formed() {
            return Err(ParseError::MalformedLattice);
        }

        let mut graph = Hypergraph::new();
        let len = lattice.len();
        if len == 0 {
            return Ok(graph);
        }

        let mut actives: Vec<HashMap<Span, Vec<Active>>> = vec![HashMap::new(); self.grammars.len()];
        let mut passives: HashMap<Span, Vec<(Symbol, NodeId)>> = HashMap::new();

        for (t, grammar) in self.grammars.iter().enumerate() {
            for pos in 0..len {
                actives[t].entry((pos, pos)).or_default().push(Active { node: grammar.root(), tails: Vec::new() });
            }
        }

        for length in 1..=len {
            for first in 0..=(len - length) {
                let last = first + length;
                tracing::trace!(first, last, "cky parser processing span");

                for t in 0..self.grammars.len() {
                    self.extend_with_passives(t, first, last, &mut actives, &passives);
                    self.extend_with_terminal(t, first, last, lattice, &mut actives);
                }

                self.complete(first, last, &actives, &mut passives, &mut graph);
                self.unary_closure(first, last, &mut passives, &mut graph);
                self.sort_by_label(first, last, &mut passives);

                for t in 0..self.grammars.len() {
                    self.extend_root(t, first, last, &mut actives, &passives);
                }
            }
        }

        self.attach_goal(len, &passives, &mut graph)?;
        Ok(graph)
    }

    fn extend_with_passives(&self, t: usize, first: usize, last: usize, actives: &mut [HashMap<Span, Vec<Active>>], passives: &HashMap<Span, Vec<(Symbol, NodeId)>>) {
        for middle in (first + 1)..last {
            let Some(left) = actives[t].get(&(first, middle)).cloned() else { continue };
            let Some(right) = passives.get(&(middle, last)) else { continue };
            for act in &left {
                for &(label, node) in right {
                    if let Some(next) = self.grammars[t].next(act.node, label) {
                        let mut tails = act.tails.clone();
                        tails.push(node);
                        actives[t].entry((first, last)).or_default().push(Active { node: next, tails });
                    }
                }
            }
        }
    }

    fn extend_with_terminal(&self, t: usize, first: usize, last: usize, lattice: &Lattice, actives: &mut [HashMap<Span, Vec<Active>>]) {
        if last == 0 {
            return;
        }
        let Some(base) = actives[t].get(&(first, last - 1)).cloned() else { return };
        if base.is_empty() {
            return;
        }
        for arc in lattice.arcs_at(last - 1) {
            let dest = last - 1 + arc.distance;
            if arc.is_epsilon() {
                for act in &base {
                    actives[t].entry((first, dest)).or_default().push(act.clone());
                }
            } else {
                for act in &base {
                    if let Some(next) = self.grammars[t].next(act.node, arc.label) {
                        actives[t].entry((first, dest)).or_default().push(Active { node: next, tails: act.tails.clone() });
                    }
                }
            }
        }
    }

    fn extend_root(&self, t: usize, first: usize, last: usize, actives: &mut [HashMap<Span, Vec<Active>>], passives: &HashMap<Span, Vec<(Symbol, NodeId)>>) {
        let Some(roots) = actives[t].get(&(first, first)).cloned() else { return };
        let Some(items) = passives.get(&(first, last)) else { return };
        for act in &roots {
            for &(label, node) in items {
                if let Some(next) = self.grammars[t].next(act.node, label) {
                    let mut tails = act.tails.clone();
                    tails.push(node);
                    actives[t].entry((first, last)).or_default().push(Active { node: next, tails });
                }
            }
        }
    }

    fn complete(&self, first: usize, last: usize, actives: &[HashMap<Span, Vec<Active>>], passives: &mut HashMap<Span, Vec<(Symbol, NodeId)>>, graph: &mut Hypergraph) {
        for (t, grammar) in self.grammars.iter().enumerate() {
            let Some(cell) = actives[t].get(&(first, last)) else { continue };
            for act in cell {
                let rules = grammar.rules(act.node);
                for (rule, features) in rules {
                    let head = graph.add_node();
                    let edge = graph.add_edge(act.tails.clone(), Some(Rc::clone(rule)), features.clone(), Default::default());
                    graph.connect_edge(edge, head);
                    passives.entry((first, last)).or_default().push((rule.lhs, head));
                }
            }
        }
    }

    /// Applies unary rules (grammar entries with a single source symbol) to
    /// newly produced passive items until no new label becomes reachable.
    /// `closure` records, for each label that has ever entered this span's
    /// closure, the round it first appeared — re-deriving a label already
    /// in `closure` (at any round) is a no-op, so the frontier of labels
    /// still being expanded shrinks to nothing within at most
    /// `|distinct labels|` rounds even for a cyclic unary grammar (`A -> A`,
    /// or `A -> B`, `B -> A`). `node_map` mirrors `node_map_type`: it
    /// fetches-or-creates the one hypergraph node standing for `(lhs,
    /// round)`, so a label never gets a second, redundant node within the
    /// round that first produces it. `unary_closure_stall_limit` is a
    /// pathological-case backstop on round count, not the primary bound.
    fn unary_closure(&self, first: usize, last: usize, passives: &mut HashMap<Span, Vec<(Symbol, NodeId)>>, graph: &mut Hypergraph) {
        let Some(seed) = passives.get(&(first, last)).cloned() else { return };

        let mut closure: HashMap<Symbol, u32> = HashMap::new();
        let mut node_map: HashMap<(Symbol, u32), NodeId> = HashMap::new();
        for &(label, node) in &seed {
            closure.entry(label).or_insert(0);
            node_map.entry((label, 0)).or_insert(node);
        }

        let mut frontier = seed;
        let mut round = 0u32;

        while !frontier.is_empty() {
            round += 1;
            if round > self.config.unary_closure_stall_limit {
                break;
            }

            let mut next_frontier = Vec::new();
            for &(label, node) in &frontier {
                for grammar in self.grammars {
                    let Some(next) = grammar.next(grammar.root(), label) else { continue };
                    for (rule, features) in grammar.rules(next) {
                        if closure.contains_key(&rule.lhs) {
                            continue;
                        }
                        closure.insert(rule.lhs, round);

                        let key = (rule.lhs, round);
                        let head = *node_map.entry(key).or_insert_with(|| graph.add_node());
                        let edge = graph.add_edge(vec![node], Some(Rc::clone(rule)), features.clone(), Default::default());
                        graph.connect_edge(edge, head);
                        passives.entry((first, last)).or_default().push((rule.lhs, head));
                        next_frontier.push((rule.lhs, head));
                    }
                }
            }

            frontier = next_frontier;
        }
    }

    fn sort_by_label(&self, first: usize, last: usize, passives: &mut HashMap<Span, Vec<(Symbol, NodeId)>>) {
        if let Some(items) = passives.get_mut(&(first, last)) {
            items.sort_by_key(|(label, node)| (*label, *node));
        }
    }

    fn attach_goal(&self, len: usize, passives: &HashMap<Span, Vec<(Symbol, NodeId)>>, graph: &mut Hypergraph) -> Result<(), ParseError> {
        let goal_label = self.goal.non_terminal();
        let matches: Vec<NodeId> = passives
            .get(&(0, len))
            .map(|items| items.iter().filter(|(label, _)| *label == goal_label).map(|(_, node)| *node).collect())
            .unwrap_or_default();

        if matches.is_empty() {
            return Ok(());
        }

        graph.goal = graph.add_node();
        let chosen = if self.config.unique_goal { matches.as_slice() } else { &matches[..1] };
        for &node in chosen {
            let edge = graph.add_edge(vec![node], Some(Rc::clone(&self.rule_goal)), FeatureVector::new(), Default::default());
            graph.connect_edge(edge, graph.goal);
        }

        *graph = forge_core::sort::topological_sort_unfiltered(graph)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_compose::TrieGrammar;

    /// Builds a trie keyed by each rule's *full* rhs (non-terminals
    /// stripped to their bare category), the same sequence the CKY loop
    /// walks via `next` whether the next symbol is a lattice terminal or an
    /// already-reduced passive item.
    fn grammar_with(entries: &[(&str, &[&str])]) -> TrieGrammar {
        let mut g = TrieGrammar::new();
        for (lhs, rhs) in entries {
            let rhs_symbols: Vec<Symbol> = rhs.iter().map(|s| Symbol::intern(s)).collect();
            let source: Vec<Symbol> = rhs_symbols.iter().map(|s| s.non_terminal()).collect();
            let rule = intern_rule(Symbol::intern(lhs), rhs_symbols);
            g.insert(&source, rule, FeatureVector::new());
        }
        g
    }

    #[test]
    fn parses_a_simple_binary_sentence() {
        let grammar = grammar_with(&[("[NP]", &["the", "dog"]), ("[S]", &["[NP]"])]);
        let grammars: Vec<Box<dyn PhraseTransducer>> = vec![Box::new(grammar)];
        let parser = CkyParser::new(Symbol::intern("[S]"), &grammars, ParseConfig::default());

        let lattice = Lattice::from_sentence([Symbol::intern("the"), Symbol::intern("dog")]);
        let graph = parser.parse(&lattice).unwrap();
        assert!(graph.has_goal());
        assert!(graph.is_valid());
    }

    #[test]
    fn empty_lattice_has_no_goal() {
        let grammars: Vec<Box<dyn PhraseTransducer>> = vec![Box::new(TrieGrammar::new())];
        let parser = CkyParser::new(Symbol::intern("[S]"), &grammars, ParseConfig::default());
        let graph = parser.parse(&Lattice::default()).unwrap();
        assert!(!graph.has_goal());
    }

    #[test]
    fn unreachable_goal_has_no_goal_node() {
        let grammar = grammar_with(&[("[NP]", &["the", "dog"])]);
        let grammars: Vec<Box<dyn PhraseTransducer>> = vec![Box::new(grammar)];
        let parser = CkyParser::new(Symbol::intern("[S]"), &grammars, ParseConfig::default());
        let lattice = Lattice::from_sentence([Symbol::intern("the"), Symbol::intern("dog")]);
        let graph = parser.parse(&lattice).unwrap();
        assert!(!graph.has_goal());
    }
}
