use serde::{Deserialize, Serialize};

/// Tuning knobs for phrase composition (the coverage-search composer, not
/// the CKY parser, which carries its own [`forge_parse::ParseConfig`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Maximum number of source positions a phrase may skip ahead of the
    /// leftmost uncovered position before reordering is disallowed.
    pub max_distortion: usize,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        ComposeConfig { max_distortion: 0 }
    }
}

/// Selects which rescoring applicator the `apply` stage drives. Only the
/// two strategies `cicada` actually ships headers for in this workspace's
/// source pack are represented; a four-way exact/cube-grow/incremental/
/// stateless dispatch would invent behavior for the two missing headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CubeGrow,
    Stateless,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::CubeGrow
    }
}

/// Aggregate configuration for one pipeline run: one sub-config per stage,
/// plus the strategy selector and the worker count for [`crate::pipeline::run_batch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub compose: ComposeConfig,
    pub parse: forge_parse::ParseConfig,
    pub rescore: forge_rescore::RescoreConfig,
    pub prune: forge_prune::PruneConfig,
    pub strategy: Strategy,
    /// Number of OS threads `run_batch` partitions sentences across. `0`
    /// and `1` both mean "run on the calling thread only".
    pub workers: usize,
    /// When set, the prune and output stages see a uniform weight vector
    /// (every feature weighted `1.0`) in place of the sentence's trained
    /// weights, the same substitution `cicada`'s `--weights-one` flag makes.
    pub weights_one: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            compose: ComposeConfig::default(),
            parse: forge_parse::ParseConfig::default(),
            rescore: forge_rescore::RescoreConfig::default(),
            prune: forge_prune::PruneConfig::default(),
            strategy: Strategy::default(),
            workers: 1,
            weights_one: false,
        }
    }
}
