//! Inside/outside weights and per-edge posterior probabilities over a
//! topologically-sorted hypergraph. Grounded on the inside/outside pass
//! `cicada`'s `prune_kbest.hpp` drives ahead of its k-best enumeration.

use forge_core::feature::FeatureVector;
use forge_core::hypergraph::Hypergraph;
use forge_core::semiring::{LogProb, Semiring};

/// Computes `(inside, posterior)`: `inside[v]` is the total log-probability
/// mass of every derivation rooted at `v`; `posterior[e]` is the marginal
/// probability that a random derivation of the goal uses edge `e`. Assumes
/// `graph` is topologically sorted bottom-up (true of every
/// composer/parser/rescorer output in this workspace).
pub fn inside_outside(graph: &Hypergraph, score_fn: impl Fn(&FeatureVector) -> f64) -> (Vec<LogProb>, Vec<LogProb>) {
    let n = graph.nodes.len();
    let mut inside = vec![LogProb::zero(); n];

    for (node_id, node) in graph.nodes.iter().enumerate() {
        tracing::trace!(node = node_id, "inside pass visiting node");
        let mut sum = LogProb::zero();
        for &edge_id in &node.edges {
            let edge = &graph.edges[edge_id.index()];
            let mut score = LogProb(score_fn(&edge.features));
            for &tail in &edge.tails {
                score = score.mul(inside[tail.index()]);
            }
            sum = sum.add(score);
        }
        inside[node_id] = sum;
    }

    if !graph.has_goal() {
        return (inside, vec![LogProb::zero(); graph.edges.len()]);
    }

    let mut outside = vec![LogProb::zero(); n];
    outside[graph.goal.index()] = LogProb::one();

    for node_id in (0..n).rev() {
        for &edge_id in &graph.nodes[node_id].edges {
            let edge = &graph.edges[edge_id.index()];
            let edge_score = LogProb(score_fn(&edge.features));
            for (i, &tail) in edge.tails.iter().enumerate() {
                let mut contribution = outside[node_id].mul(edge_score);
                for (j, &other) in edge.tails.iter().enumerate() {
                    if i != j {
                        contribution = contribution.mul(inside[other.index()]);
                    }
                }
                outside[tail.index()] = outside[tail.index()].add(contribution);
            }
        }
    }

    let goal_inside = inside[graph.goal.index()];
    let mut posterior = Vec::with_capacity(graph.edges.len());
    for edge in &graph.edges {
        let edge_score = LogProb(score_fn(&edge.features));
        let mut p = outside[edge.head.index()].mul(edge_score);
        for &tail in &edge.tails {
            p = p.mul(inside[tail.index()]);
        }
        posterior.push(LogProb(p.value() - goal_inside.value()));
    }

    (inside, posterior)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::feature::Feature;
    use forge_core::rule::intern_rule;
    use forge_core::symbol::Symbol;

    fn score_of(features: &FeatureVector) -> f64 {
        features.get(&Feature::intern("score")).copied().unwrap_or(0.0)
    }

    /// A single derivation (one leaf, one goal edge) puts all posterior
    /// mass on both its edges.
    #[test]
    fn single_path_edges_have_posterior_one() {
        let mut g = Hypergraph::new();
        let leaf_rule = intern_rule(Symbol::intern("[X]"), vec![Symbol::intern("a")]);
        let leaf = g.add_edge_to_new_node(vec![], Some(leaf_rule), FeatureVector::new(), Default::default());
        let goal_rule = intern_rule(Symbol::intern("[S]"), vec![Symbol::intern("[X]")]);
        g.goal = g.add_edge_to_new_node(vec![leaf], Some(goal_rule), FeatureVector::new(), Default::default());

        let (inside, posterior) = inside_outside(&g, score_of);
        assert!(inside[g.goal.index()].value().abs() < 1e-9);
        for p in posterior {
            assert!(p.value().abs() < 1e-9, "expected posterior 1.0 (log 0.0), got {}", p.value());
        }
    }

    /// Two alternative leaves feeding the same goal split posterior mass
    /// in proportion to their scores.
    #[test]
    fn alternative_derivations_split_posterior_by_score() {
        let mut g = Hypergraph::new();

        let mut leaf = |token: &str, prob: f64| {
            let rule = intern_rule(Symbol::intern("[X]"), vec![Symbol::intern(token)]);
            let mut features = FeatureVector::new();
            features.insert(Feature::intern("score"), prob.ln());
            g.add_edge_to_new_node(vec![], Some(rule), features, Default::default())
        };
        let a = leaf("a", 0.75);
        let b = leaf("b", 0.25);

        let goal_rule = intern_rule(Symbol::intern("[S]"), vec![Symbol::intern("[X]")]);
        let goal = g.add_node();
        let edge_a = g.add_edge(vec![a], Some(goal_rule.clone()), FeatureVector::new(), Default::default());
        g.connect_edge(edge_a, goal);
        let edge_b = g.add_edge(vec![b], Some(goal_rule), FeatureVector::new(), Default::default());
        g.connect_edge(edge_b, goal);
        g.goal = goal;

        let (_inside, posterior) = inside_outside(&g, score_of);
        let p_a = posterior[edge_a.index()].value().exp();
        let p_b = posterior[edge_b.index()].value().exp();
        assert!((p_a - 0.75).abs() < 1e-9, "p_a = {p_a}");
        assert!((p_b - 0.25).abs() < 1e-9, "p_b = {p_b}");
    }
}
