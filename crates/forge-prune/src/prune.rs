//! Posterior-based k-best pruning: computes each edge's marginal posterior
//! via an inside/outside pass, finds the bottleneck score of the
//! `kbest_size`-th best derivation, and drops every edge whose own
//! posterior falls below that threshold. Grounded on `cicada`'s
//! `PruneKBest`.

use forge_core::feature::FeatureVector;
use forge_core::hypergraph::Hypergraph;
use forge_core::sort::topological_sort;

use crate::config::PruneConfig;
use crate::error::PruneError;
use crate::inside_outside::inside_outside;
use crate::kbest::kbest_bottleneck_threshold;

/// `score_fn` maps an edge's accumulated feature vector to a single
/// log-domain contribution, same convention as
/// `forge_rescore::CubeGrowRescorer`.
pub struct KBestPruner<F> {
    score_fn: F,
    config: PruneConfig,
}

impl<F> KBestPruner<F>
where
    F: Fn(&FeatureVector) -> f64,
{
    pub fn new(score_fn: F, config: PruneConfig) -> Self {
        KBestPruner { score_fn, config }
    }

    /// Returns a pruned copy of `source`. Falls back to returning `source`
    /// unchanged when fewer than `kbest_size` derivations exist, or when the
    /// pruned result would be invalid — mirroring `PruneKBest::operator()`'s
    /// `target = source` fallbacks, both unconditional.
    pub fn prune(&self, source: &Hypergraph) -> Result<Hypergraph, PruneError> {
        if !source.has_goal() {
            return Ok(Hypergraph::new());
        }

        let (_inside, posterior) = inside_outside(source, &self.score_fn);

        let Some(threshold) = kbest_bottleneck_threshold(source, &posterior, self.config.kbest_size) else {
            tracing::debug!(kbest_size = self.config.kbest_size, "fewer derivations than requested, skipping prune");
            return Ok(source.clone());
        };

        let removed: Vec<bool> = posterior.iter().map(|&p| p < threshold).collect();
        let pruned = topological_sort(source, |edge| removed[edge.id.index()])?;

        if !pruned.is_valid() {
            tracing::debug!("pruned graph failed validation, falling back to source");
            return Ok(source.clone());
        }

        tracing::debug!(edges_before = source.edges.len(), edges_after = pruned.edges.len(), "pruned hypergraph");
        Ok(pruned)
    }
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

    #[test]
    fn prunes_the_weakest_of_three_alternatives() {
        let mut g = Hypergraph::new();
        let mut leaf = |token: &str, prob: f64| {
            let rule = intern_rule(Symbol::intern("[X]"), vec![Symbol::intern(token)]);
            let mut features = FeatureVector::new();
            features.insert(Feature::intern("score"), prob.ln());
            g.add_edge_to_new_node(vec![], Some(rule), features, Default::default())
        };
        let a = leaf("a", 0.5);
        let b = leaf("b", 0.3);
        let c = leaf("c", 0.2);

        let goal_rule = intern_rule(Symbol::intern("[S]"), vec![Symbol::intern("[X]")]);
        let goal = g.add_node();
        for &tail in &[a, b, c] {
            let edge = g.add_edge(vec![tail], Some(goal_rule.clone()), FeatureVector::new(), Default::default());
            g.connect_edge(edge, goal);
        }
        g.goal = goal;

        let pruner = KBestPruner::new(score_of, PruneConfig { kbest_size: 2 });
        let pruned = pruner.prune(&g).unwrap();

        assert_eq!(pruned.nodes[pruned.goal.index()].edges.len(), 2);
        assert_eq!(pruned.nodes.len(), 3); // goal + 2 surviving leaves
    }

    #[test]
    fn falls_back_to_source_when_fewer_derivations_exist_than_requested() {
        let mut g = Hypergraph::new();
        let rule = intern_rule(Symbol::intern("[S]"), vec![Symbol::intern("a")]);
        g.goal = g.add_edge_to_new_node(vec![], Some(rule), FeatureVector::new(), Default::default());

        let pruner = KBestPruner::new(score_of, PruneConfig { kbest_size: 5 });
        let pruned = pruner.prune(&g).unwrap();
        assert_eq!(pruned.edges.len(), g.edges.len());
    }

    /// When every edge's posterior already meets the threshold (here,
    /// `kbest_size` covers every alternative), pruning removes nothing.
    #[test]
    fn keeps_every_edge_when_all_posteriors_meet_the_threshold() {
        let mut g = Hypergraph::new();
        let mut leaf = |token: &str, prob: f64| {
            let rule = intern_rule(Symbol::intern("[X]"), vec![Symbol::intern(token)]);
            let mut features = FeatureVector::new();
            features.insert(Feature::intern("score"), prob.ln());
            g.add_edge_to_new_node(vec![], Some(rule), features, Default::default())
        };
        let a = leaf("a", 0.5);
        let b = leaf("b", 0.3);
        let c = leaf("c", 0.2);

        let goal_rule = intern_rule(Symbol::intern("[S]"), vec![Symbol::intern("[X]")]);
        let goal = g.add_node();
        for &tail in &[a, b, c] {
            let edge = g.add_edge(vec![tail], Some(goal_rule.clone()), FeatureVector::new(), Default::default());
            g.connect_edge(edge, goal);
        }
        g.goal = goal;

        let pruner = KBestPruner::new(score_of, PruneConfig { kbest_size: 3 });
        let pruned = pruner.prune(&g).unwrap();

        assert_eq!(pruned.edges.len(), g.edges.len());
        assert_eq!(pruned.nodes[pruned.goal.index()].edges.len(), 3);
    }

    #[test]
    fn empty_graph_prunes_to_empty() {
        let g = Hypergraph::new();
        let pruner = KBestPruner::new(score_of, PruneConfig::default());
        let pruned = pruner.prune(&g).unwrap();
        assert!(!pruned.has_goal());
    }
}
