//! Stateful feature functions and cube-growing rescoring: applies a stack
//! of feature functions to a composed or parsed hypergraph, producing at
//! most `cube_size_max` derivations per node under lazy best-first search
//! ([`cube::CubeGrowRescorer`]), or a single stateless pass over every edge
//! when the model carries no state ([`stateless::apply_state_less`]).

pub mod config;
pub mod cube;
pub mod error;
pub mod feature;
pub mod model;
pub mod stateless;

pub use config::RescoreConfig;
pub use cube::CubeGrowRescorer;
pub use error::RescoreError;
pub use feature::{CompositeState, FeatureFunction, State};
pub use model::Model;
pub use stateless::apply_state_less;
