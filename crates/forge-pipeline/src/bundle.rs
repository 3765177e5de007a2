//! The data bundle each stage consumes and produces, split into a
//! thread-local half ([`DataBundle`], which carries the non-`Send`
//! `Hypergraph`) and a cross-thread half ([`SentenceInput`]/[`SentenceOutput`],
//! both plain data with no shared-rule pointers). `run_batch` only ever
//! moves the latter across a `std::thread::scope` boundary; a `DataBundle`
//! is built and fully drained inside a single worker's call to `run_one`.

use std::time::Duration;

use forge_core::feature::FeatureVector;
use forge_core::hypergraph::Hypergraph;
use forge_core::lattice::Lattice;

use forge_codec::weights_format::Weights;

/// Per-stage timing and size snapshot, logged after every stage runs.
/// `cpu_time`/`user_time`/`thread_time` all currently report the same
/// wall-clock `Instant` elapsed duration: no per-thread rusage crate is
/// part of this workspace's dependency stack, and adding one just to
/// split these three numbers apart would be new surface with no other
/// user.
#[derive(Debug, Clone)]
pub struct StageStats {
    pub name: &'static str,
    pub cpu_time: Duration,
    pub user_time: Duration,
    pub thread_time: Duration,
    pub nodes: usize,
    pub edges: usize,
    pub valid: bool,
}

/// Per-sentence outcome: the stages that ran and, if a stage failed, the
/// message recorded at the point execution stopped.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub stages: Vec<StageStats>,
    pub error: Option<String>,
}

/// The `Send` half of a sentence: what crosses into a worker thread.
pub struct SentenceInput {
    pub id: u64,
    pub lattice: Lattice,
    pub weights: Weights,
}

/// The `Send` half of a sentence's result: what a worker thread hands back.
pub struct SentenceOutput {
    pub id: u64,
    pub text: Option<String>,
    pub statistics: Statistics,
}

/// The bundle threaded through one sentence's stages. Holds a `Hypergraph`,
/// which carries `Rc<Rule>` edges and so is not `Send` — this type is
/// constructed and consumed entirely within one worker's `run_one` call.
pub struct DataBundle {
    pub id: u64,
    pub hypergraph: Hypergraph,
    pub lattice: Lattice,
    pub weights: Weights,
    pub output: Option<String>,
    pub statistics: Statistics,
}

impl DataBundle {
    pub fn from_input(input: SentenceInput) -> Self {
        DataBundle {
            id: input.id,
            hypergraph: Hypergraph::new(),
            lattice: input.lattice,
            weights: input.weights,
            output: None,
            statistics: Statistics::default(),
        }
    }

    pub fn into_output(self) -> SentenceOutput {
        SentenceOutput {
            id: self.id,
            text: self.output,
            statistics: self.statistics,
        }
    }
}

/// Weighted dot product between a tuned weights file and an edge's (or a
/// derivation's) accumulated feature vector — the bridge every stage's
/// `score_fn` closure is built from.
pub fn dot(weights: &Weights, features: &FeatureVector) -> f64 {
    features.iter().map(|(feature, value)| value * weights.get(feature).copied().unwrap_or(0.0)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::feature::Feature;

    #[test]
    fn dot_ignores_features_with_no_weight() {
        let mut weights = Weights::new();
        weights.insert(Feature::intern("lm"), 2.0);
        let mut features = FeatureVector::new();
        features.insert(Feature::intern("lm"), 3.0);
        features.insert(Feature::intern("tm"), 5.0);
        assert_eq!(dot(&weights, &features), 6.0);
    }
}
