//! Posterior-based k-best pruning over translation hypergraphs: computes
//! each edge's marginal posterior via an inside/outside pass
//! ([`inside_outside`]), ranks derivations by their bottleneck posterior
//! ([`kbest`]), and removes every edge below the resulting threshold
//! ([`prune::KBestPruner`]).

pub mod config;
pub mod error;
pub mod inside_outside;
pub mod kbest;
pub mod prune;

pub use config::PruneConfig;
pub use error::PruneError;
pub use inside_outside::inside_outside;
pub use kbest::kbest_bottleneck_threshold;
pub use prune::KBestPruner;
