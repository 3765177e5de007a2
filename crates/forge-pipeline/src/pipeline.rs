//! Orchestrates a fixed sequence of [`Stage`]s over a batch of sentences,
//! optionally spread across a pool of OS threads. Each sentence is handled
//! independently: a stage's `Err` is recorded in that sentence's
//! [`Statistics`] and stops the remaining stages for that sentence only,
//! per the catch-at-the-sentence-boundary policy the rest of this crate
//! follows.

use std::time::Instant;

use crate::bundle::{DataBundle, SentenceInput, SentenceOutput, StageStats};
use crate::stage::Stage;

pub struct Pipeline<'g> {
    stages: Vec<Box<dyn Stage + 'g>>,
    weights_one: bool,
}

impl<'g> Pipeline<'g> {
    pub fn new(stages: Vec<Box<dyn Stage + 'g>>) -> Self {
        Pipeline { stages, weights_one: false }
    }

    /// Builds a pipeline whose prune and output stages see a uniform
    /// weight vector instead of the sentence's trained one, mirroring
    /// `cicada`'s `--weights-one` flag. Earlier stages (notably `apply`,
    /// which ranks candidates by the real trained weights) are unaffected.
    pub fn with_weights_one(stages: Vec<Box<dyn Stage + 'g>>, weights_one: bool) -> Self {
        Pipeline { stages, weights_one }
    }

    pub fn run_one(&self, input: SentenceInput) -> SentenceOutput {
        let mut bundle = DataBundle::from_input(input);
        let mut weights_substituted = false;

        for stage in &self.stages {
            if self.weights_one && !weights_substituted && matches!(stage.name(), "prune" | "output") {
                bundle.weights = forge_codec::weights_format::weights_one(bundle.weights.keys().cloned());
                weights_substituted = true;
            }

            let start = Instant::now();
            let result = stage.run(&mut bundle);
            let elapsed = start.elapsed();
            let nodes = bundle.hypergraph.nodes.len();
            let edges = bundle.hypergraph.edges.len();
            let valid = bundle.hypergraph.is_valid();

            tracing::debug!(stage = stage.name(), ?elapsed, nodes, edges, valid, "stage finished");
            bundle.statistics.stages.push(StageStats {
                name: stage.name(),
                cpu_time: elapsed,
                user_time: elapsed,
                thread_time: elapsed,
                nodes,
                edges,
                valid,
            });

            if let Err(err) = result {
                bundle.statistics.error = Some(err.to_string());
                break;
            }
        }

        bundle.into_output()
    }
}

/// Runs `inputs` through a freshly-built `Pipeline` per worker, round-robin
/// partitioned across `workers` OS threads (`workers <= 1` runs on the
/// calling thread). `pipeline_factory` is called once per spawned thread so
/// that a `Pipeline` — which borrows grammar data and is not itself `Send`
/// — never needs to cross a thread boundary; only the `Send` `SentenceInput`/
/// `SentenceOutput` pairs do. Output order follows each worker's chunk, not
/// the original `inputs` order — match results back up by `SentenceOutput::id`.
pub fn run_batch<'g>(pipeline_factory: impl Fn() -> Pipeline<'g> + Sync, inputs: Vec<SentenceInput>, workers: usize) -> Vec<SentenceOutput> {
    let workers = workers.max(1);

    if workers == 1 || inputs.len() <= 1 {
        let pipeline = pipeline_factory();
        return inputs.into_iter().map(|input| pipeline.run_one(input)).collect();
    }

    let mut chunks: Vec<Vec<SentenceInput>> = (0..workers).map(|_| Vec::new()).collect();
    for (i, input) in inputs.into_iter().enumerate() {
        chunks[i % workers].push(input);
    }

    std::thread::scope(|scope| {
        let factory = &pipeline_factory;
        let handles: Vec<_> = chunks
            .into_iter()
            .filter(|chunk| !chunk.is_empty())
            .map(|chunk| {
                scope.spawn(move || {
                    let pipeline = factory();
                    chunk.into_iter().map(|input| pipeline.run_one(input)).collect::<Vec<_>>()
                })
            })
            .collect();

        handles.into_iter().flat_map(|handle| handle.join().expect("pipeline worker thread panicked")).collect()
    })
}
