//! Phrase/lattice composer: Huang & Chiang's forest-of-phrases
//! construction — bitset-coverage breadth-first search over a lattice
//! against one or more phrase grammars, producing a hypergraph with
//! binary `[X] -> [X1] [X2]` glue structure and reordering bounded by
//! `max_distortion`. Grounded on `cicada`'s `ComposePhrase`.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use forge_core::coverage::Coverage;
use forge_core::feature::{accumulate, FeatureVector};
use forge_core::hypergraph::{Hypergraph, NodeId};
use forge_core::lattice::Lattice;
use forge_core::rule::{intern_rule, Rule};
use forge_core::symbol::Symbol;

use crate::error::ComposeError;
use crate::transducer::{PhraseTransducer, TransducerNode};

struct State {
    coverage: Coverage,
    grammar_id: usize,
    node: TransducerNode,
    first: usize,
    last: usize,
    features: FeatureVector,
}

/// Composes a phrase-translation forest over `lattice` against `grammars`,
/// reusing the non-terminal `x` for every intermediate span (`x` itself,
/// `x,1`, `x,2` for the glue rule's antecedents).
pub struct PhraseComposer<'g> {
    grammars: &'g [Box<dyn PhraseTransducer>],
    max_distortion: usize,
    rule_goal: Rc<Rule>,
    rule_glue: Rc<Rule>,
}

impl<'g> PhraseComposer<'g> {
    pub fn new(x: Symbol, grammars: &'g [Box<dyn PhraseTransducer>], max_distortion: usize) -> Self {
        let rule_goal = intern_rule(Symbol::goal(), vec![x.non_terminal_with_index(1)]);
        let rule_glue = intern_rule(x.non_terminal(), vec![x.non_terminal_with_index(1), x.non_terminal_with_index(2)]);
        PhraseComposer {
            grammars,
            max_distortion,
            rule_goal,
            rule_glue,
        }
    }

    pub fn compose(&self, lattice: &Lattice) -> Result<Hypergraph, ComposeError> {
        if !lattice.is_well_formed() {
            return Err(ComposeError::MalformedLattice);
        }

        let mut graph = Hypergraph::new();
        if lattice.is_empty() {
            return Ok(graph);
        }
        let len = lattice.len();

        let epsilons = self.epsilon_closure(lattice);

        let coverage_start = Coverage::new();
        let coverage_goal = Coverage::new().with_span(0, len);

        let mut nodes: HashMap<Coverage, Option<NodeId>> = HashMap::new();
        nodes.insert(coverage_start, None);

        let mut queue: VecDeque<State> = VecDeque::new();
        let seed_last = len.min(self.max_distortion + 1);
        for i in 0..seed_last {
            for (grammar_id, grammar) in self.grammars.iter().enumerate() {
                queue.push_back(State {
                    coverage: coverage_start,
                    grammar_id,
                    node: grammar.root(),
                    first: i,
                    last: i,
                    features: FeatureVector::new(),
                });
            }
        }

        while let Some(state) = queue.pop_front() {
            tracing::trace!(first = state.first, last = state.last, queued = queue.len(), "phrase composer expanding state");

            let grammar = &self.grammars[state.grammar_id];
            let rules = grammar.rules(state.node);

            if !rules.is_empty() {
                let new_coverage = state.coverage.with_span(state.first, state.last);
                let is_new = !nodes.contains_key(&new_coverage);

                if is_new {
                    if let Some(first) = new_coverage.first_uncovered(0, len) {
                        let last = len.min(first + self.max_distortion + 1);
                        for i in first..last {
                            if !new_coverage.test(i) {
                                for (grammar_id, grammar) in self.grammars.iter().enumerate() {
                                    queue.push_back(State {
                                        coverage: new_coverage,
                                        grammar_id,
                                        node: grammar.root(),
                                        first: i,
                                        last: i,
                                        features: FeatureVector::new(),
                                    });
                                }
                            }
                        }
                    }
                }

                let head = graph.add_node();
                for (rule, rule_features) in rules {
                    let mut edge_features = rule_features.clone();
                    accumulate(&mut edge_features, &state.features);
                    let edge = graph.add_edge(vec![], Some(Rc::clone(rule)), edge_features, Default::default());
                    graph.connect_edge(edge, head);
                }

                let precedent = *nodes.get(&state.coverage).expect("state.coverage was seeded before being dequeued");
                match precedent {
                    None => {
                        nodes.insert(new_coverage, Some(head));
                    }
                    Some(prev) => {
                        let dest = *nodes.entry(new_coverage).or_insert_with(|| Some(graph.add_node())).get_or_insert(head);
                        let glue = graph.add_edge(vec![prev, head], Some(Rc::clone(&self.rule_glue)), FeatureVector::new(), Default::default());
                        graph.connect_edge(glue, dest);
                    }
                }
            }

            if state.last != len {
                for arc in lattice.arcs_at(state.last) {
                    let Some(next_node) = grammar.next(state.node, arc.label) else { continue };
                    for (last, eps_features) in &epsilons[state.last + arc.distance] {
                        let rank_first = state.coverage.rank(state.first as isize - 1, true);
                        let rank_last = state.coverage.rank(*last as isize - 1, true);
                        if rank_first == rank_last {
                            let mut combined = state.features.clone();
                            accumulate(&mut combined, &arc.features);
                            accumulate(&mut combined, eps_features);
                            queue.push_back(State {
                                coverage: state.coverage,
                                grammar_id: state.grammar_id,
                                node: next_node,
                                first: state.first,
                                last: *last,
                                features: combined,
                            });
                        }
                    }
                }
            }
        }

        if let Some(&Some(node)) = nodes.get(&coverage_goal) {
            let edge = graph.add_edge(vec![node], Some(Rc::clone(&self.rule_goal)), FeatureVector::new(), Default::default());
            graph.goal = graph.add_node();
            graph.connect_edge(edge, graph.goal);
            graph = forge_core::sort::topological_sort_unfiltered(&graph)?;
        }

        Ok(graph)
    }

    /// Precomputes, for every position `p`, the `(reachable position,
    /// accumulated feature)` pairs reachable by zero or more `EPSILON`
    /// arcs, plus the trivial `(p, zero features)` self-pair.
    fn epsilon_closure(&self, lattice: &Lattice) -> Vec<Vec<(usize, FeatureVector)>> {
        let len = lattice.len();
        let mut epsilons: Vec<Vec<(usize, FeatureVector)>> = vec![Vec::new(); len + 1];
        for first in (0..len).rev() {
            for arc in lattice.arcs_at(first) {
                if !arc.is_epsilon() {
                    continue;
                }
                let last = first + arc.distance;
                epsilons[first].push((last, arc.features.clone()));
                let further: Vec<(usize, FeatureVector)> = epsilons[last].clone();
                for (pos, feats) in further {
                    let mut combined = arc.features.clone();
                    accumulate(&mut combined, &feats);
                    epsilons[first].push((pos, combined));
                }
            }
        }
        for (i, bucket) in epsilons.iter_mut().enumerate().take(len) {
            bucket.push((i, FeatureVector::new()));
        }
        epsilons
    }
}
