//! Pipeline-level error taxonomy: every stage error folds into one type so
//! the orchestrator can catch it uniformly at the sentence boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Compose(#[from] forge_compose::ComposeError),

    #[error(transparent)]
    Parse(#[from] forge_parse::ParseError),

    #[error(transparent)]
    Rescore(#[from] forge_rescore::RescoreError),

    #[error(transparent)]
    Prune(#[from] forge_prune::PruneError),

    #[error(transparent)]
    Codec(#[from] forge_codec::CodecError),

    #[error(transparent)]
    Core(#[from] forge_core::ForgeError),
}
