use serde::{Deserialize, Serialize};

/// Tuning knobs for posterior-based k-best pruning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneConfig {
    /// Number of distinct derivations whose bottleneck posterior sets the
    /// pruning threshold. An edge survives iff its own posterior is at
    /// least this threshold.
    pub kbest_size: usize,
}

impl Default for PruneConfig {
    fn default() -> Self {
        PruneConfig { kbest_size: 100 }
    }
}
