//! Lazy best-first enumeration of the bottleneck (minimum-posterior) score
//! of the top `kbest_size` derivations reaching the goal. Shares its
//! per-node candidate-heap shape with cube-growing rescoring, but admits
//! every popped candidate immediately — there is no state to merge on, so
//! a heap pop is already the next-best distinct derivation. Grounded on
//! `cicada`'s `PruneKBest`, which drives a generic k-best derivation
//! enumerator with a bottleneck (`min`) combination functor.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use forge_core::hypergraph::{EdgeId, Hypergraph, NodeId};
use forge_core::semiring::LogProb;

struct Candidate {
    in_edge: EdgeId,
    j: Vec<u32>,
    score: LogProb,
}

#[derive(Clone, Copy)]
struct HeapKey {
    idx: usize,
    score: LogProb,
    cardinality: u32,
}

impl PartialEq for HeapKey {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.cardinality == other.cardinality
    }
}
impl Eq for HeapKey {}

impl PartialOrd for HeapKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.score.cmp(&other.score) {
            Ordering::Equal => self.cardinality.cmp(&other.cardinality).reverse(),
            ord => ord,
        }
    }
}

#[derive(Default)]
struct NodeState {
    pool: Vec<Candidate>,
    cand: BinaryHeap<HeapKey>,
    d: Vec<usize>,
    uniques: HashSet<(EdgeId, Vec<u32>)>,
    fired: bool,
}

/// Returns the bottleneck score of the `kbest_size`-th best derivation
/// reaching `graph.goal`, or `None` if fewer than `kbest_size` distinct
/// derivations exist.
pub fn kbest_bottleneck_threshold(graph: &Hypergraph, posterior: &[LogProb], kbest_size: usize) -> Option<LogProb> {
    if kbest_size == 0 || !graph.has_goal() {
        return None;
    }

    let mut states: Vec<NodeState> = (0..graph.nodes.len()).map(|_| NodeState::default()).collect();
    let mut threshold = None;

    for k in 0..kbest_size {
        let before = states[graph.goal.index()].d.len();
        lazy_jth_best(graph.goal, k, graph, posterior, &mut states, kbest_size);
        if states[graph.goal.index()].d.len() == before {
            return None;
        }
        let idx = states[graph.goal.index()].d[k];
        threshold = Some(states[graph.goal.index()].pool[idx].score);
    }

    threshold
}

fn lazy_jth_best(v: NodeId, j: usize, graph: &Hypergraph, posterior: &[LogProb], states: &mut [NodeState], kbest_size: usize) {
    if !states[v.index()].fired {
        let edges: Vec<EdgeId> = graph.nodes[v.index()].edges.clone();
        for edge_id in edges {
            let arity = graph.edges[edge_id.index()].tails.len();
            fire(edge_id, vec![0; arity], v, graph, posterior, states, kbest_size);
        }
        states[v.index()].fired = true;
    }

    while states[v.index()].d.len() <= j && states[v.index()].d.len() < kbest_size && !states[v.index()].cand.is_empty() {
        let top = states[v.index()].cand.pop().expect("checked non-empty above");
        push_succ(top.idx, v, graph, posterior, states, kbest_size);
        states[v.index()].d.push(top.idx);
    }
}

fn fire(edge_id: EdgeId, j: Vec<u32>, v: NodeId, graph: &Hypergraph, posterior: &[LogProb], states: &mut [NodeState], kbest_size: usize) {
    let key = (edge_id, j.clone());
    if states[v.index()].uniques.contains(&key) {
        return;
    }

    let tails = graph.edges[edge_id.index()].tails.clone();
    for (i, &tail) in tails.iter().enumerate() {
        lazy_jth_best(tail, j[i] as usize, graph, posterior, states, kbest_size);
        if states[tail.index()].d.len() <= j[i] as usize {
            return;
        }
    }

    let mut score = posterior[edge_id.index()];
    for (i, &tail) in tails.iter().enumerate() {
        let idx = states[tail.index()].d[j[i] as usize];
        let tail_score = states[tail.index()].pool[idx].score;
        score = LogProb(score.0.min(tail_score.0));
    }

    let cardinality = j.iter().sum();
    states[v.index()].uniques.insert(key);
    let pool_idx = states[v.index()].pool.len();
    states[v.index()].pool.push(Candidate { in_edge: edge_id, j, score });
    states[v.index()].cand.push(HeapKey { idx: pool_idx, score, cardinality });
}

fn push_succ(idx: usize, v: NodeId, graph: &Hypergraph, posterior: &[LogProb], states: &mut [NodeState], kbest_size: usize) {
    let (edge_id, j) = {
        let candidate = &states[v.index()].pool[idx];
        (candidate.in_edge, candidate.j.clone())
    };
    for i in 0..j.len() {
        let mut next = j.clone();
        next[i] += 1;
        fire(edge_id, next, v, graph, posterior, states, kbest_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use forge_core::feature::FeatureVector;
    use forge_core::rule::intern_rule;
    use forge_core::symbol::Symbol;

    use crate::inside_outside::inside_outside;

    fn score_of(features: &FeatureVector) -> f64 {
        features.get(&forge_core::feature::Feature::intern("score")).copied().unwrap_or(0.0)
    }

    #[test]
    fn fewer_derivations_than_requested_returns_none() {
        let mut g = Hypergraph::new();
        let rule = intern_rule(Symbol::intern("[S]"), vec![Symbol::intern("a")]);
        g.goal = g.add_edge_to_new_node(vec![], Some(rule), FeatureVector::new(), Default::default());

        let (_inside, posterior) = inside_outside(&g, score_of);
        assert!(kbest_bottleneck_threshold(&g, &posterior, 2).is_none());
    }

    #[test]
    fn three_alternatives_k2_threshold_excludes_the_weakest() {
        let mut g = Hypergraph::new();
        let mut leaf = |token: &str, prob: f64| {
            let rule = intern_rule(Symbol::intern("[X]"), vec![Symbol::intern(token)]);
            let mut features = FeatureVector::new();
            features.insert(forge_core::feature::Feature::intern("score"), prob.ln());
            g.add_edge_to_new_node(vec![], Some(rule), features, Default::default())
        };
        let a = leaf("a", 0.5);
        let b = leaf("b", 0.3);
        let c = leaf("c", 0.2);

        let goal_rule = intern_rule(Symbol::intern("[S]"), vec![Symbol::intern("[X]")]);
        let goal = g.add_node();
        let mut edge_ids = Vec::new();
        for &tail in &[a, b, c] {
            let edge = g.add_edge(vec![tail], Some(goal_rule.clone()), FeatureVector::new(), Default::default());
            g.connect_edge(edge, goal);
            edge_ids.push(edge);
        }
        g.goal = goal;

        let (_inside, posterior) = inside_outside(&g, score_of);
        let threshold = kbest_bottleneck_threshold(&g, &posterior, 2).expect("three derivations exist");

        let survivors: Vec<EdgeId> = edge_ids.iter().copied().filter(|&e| posterior[e.index()] >= threshold).collect();
        assert_eq!(survivors.len(), 2);
        assert!(!survivors.contains(&edge_ids[2]), "weakest derivation (c, 0.2) should not survive");
    }
}
