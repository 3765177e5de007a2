use serde::{Deserialize, Serialize};

/// Tuning knobs for the cube-growing rescorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RescoreConfig {
    /// Upper bound on derivations enumerated per node (`|D_v| <= cube_size_max`).
    pub cube_size_max: usize,
    /// Enables the coarse-rescoring pre-pass: a 1-best pass over the input
    /// graph whose per-edge scores would otherwise feed a re-scoring of
    /// `candidate.state` inside `push_buf`. `cicada`'s `apply_cube_grow.hpp`
    /// carries this branch commented out; off by default since it requires
    /// a populated coarse score table the active code path never builds.
    pub coarse_rescore: bool,
}

impl Default for RescoreConfig {
    fn default() -> Self {
        RescoreConfig {
            cube_size_max: 50,
            coarse_rescore: false,
        }
    }
}
