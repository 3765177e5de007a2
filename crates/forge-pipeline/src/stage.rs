//! Named pipeline stages: each one reads and rewrites a [`DataBundle`] in
//! place. The orchestrator in [`crate::pipeline`] drives a `Vec<Box<dyn
//! Stage>>` in order, timing and logging each one and stopping the
//! sentence at the first `Err`.

use forge_compose::{PhraseComposer, TreeComposer};
use forge_parse::CkyParser;
use forge_prune::KBestPruner;
use forge_rescore::{apply_state_less, CubeGrowRescorer, Model, RescoreConfig};

use crate::bundle::{dot, DataBundle};
use crate::config::Strategy;
use crate::error::PipelineError;

pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, bundle: &mut DataBundle) -> Result<(), PipelineError>;
}

/// Composes `bundle.lattice` into a phrase-translation forest, replacing
/// `bundle.hypergraph`.
pub struct ComposePhraseStage<'g> {
    pub composer: PhraseComposer<'g>,
}

impl Stage for ComposePhraseStage<'_> {
    fn name(&self) -> &'static str {
        "compose-phrase"
    }

    fn run(&self, bundle: &mut DataBundle) -> Result<(), PipelineError> {
        bundle.hypergraph = self.composer.compose(&bundle.lattice)?;
        Ok(())
    }
}

/// Rewrites `bundle.hypergraph` by matching tree-rule fragments against it.
pub struct ComposeTreeStage<'g> {
    pub composer: TreeComposer<'g>,
}

impl Stage for ComposeTreeStage<'_> {
    fn name(&self) -> &'static str {
        "compose-tree"
    }

    fn run(&self, bundle: &mut DataBundle) -> Result<(), PipelineError> {
        bundle.hypergraph = self.composer.compose(&bundle.hypergraph)?;
        Ok(())
    }
}

/// Parses `bundle.lattice` against one or more phrase grammars via CKY,
/// replacing `bundle.hypergraph`.
pub struct ParseCkyStage<'g> {
    pub parser: CkyParser<'g>,
}

impl Stage for ParseCkyStage<'_> {
    fn name(&self) -> &'static str {
        "parse-cky"
    }

    fn run(&self, bundle: &mut DataBundle) -> Result<(), PipelineError> {
        bundle.hypergraph = self.parser.parse(&bundle.lattice)?;
        Ok(())
    }
}

/// Applies a feature model to `bundle.hypergraph`, dispatching on
/// [`Strategy`]. The weighted dot product of `bundle.weights` against each
/// edge's accumulated features is the `score_fn` cube-growing ranks by;
/// a stateless pass has nothing to rank, so it ignores the weights.
pub struct ApplyStage<'m> {
    pub model: &'m Model,
    pub strategy: Strategy,
    pub config: RescoreConfig,
}

impl Stage for ApplyStage<'_> {
    fn name(&self) -> &'static str {
        "apply"
    }

    fn run(&self, bundle: &mut DataBundle) -> Result<(), PipelineError> {
        bundle.hypergraph = match self.strategy {
            Strategy::CubeGrow => {
                let weights = bundle.weights.clone();
                let rescorer = CubeGrowRescorer::new(self.model, move |f| dot(&weights, f), self.config.clone());
                rescorer.rescore(&bundle.hypergraph)?
            }
            Strategy::Stateless => apply_state_less(self.model, &bundle.hypergraph)?,
        };
        Ok(())
    }
}

/// Prunes `bundle.hypergraph` down to its `kbest_size`-best derivations by
/// posterior.
pub struct PruneStage {
    pub config: forge_prune::PruneConfig,
}

impl Stage for PruneStage {
    fn name(&self) -> &'static str {
        "prune"
    }

    fn run(&self, bundle: &mut DataBundle) -> Result<(), PipelineError> {
        let weights = bundle.weights.clone();
        let pruner = KBestPruner::new(move |f| dot(&weights, f), self.config.clone());
        bundle.hypergraph = pruner.prune(&bundle.hypergraph)?;
        Ok(())
    }
}

/// Serializes `bundle.hypergraph` into `bundle.output`.
pub struct OutputStage;

impl Stage for OutputStage {
    fn name(&self) -> &'static str {
        "output"
    }

    fn run(&self, bundle: &mut DataBundle) -> Result<(), PipelineError> {
        bundle.output = Some(forge_codec::hypergraph_format::serialize_hypergraph(bundle.id as usize, &bundle.hypergraph));
        Ok(())
    }
}
