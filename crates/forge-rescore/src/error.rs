use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RescoreError {
    #[error("a stateful model is required for this applicator, but the model is stateless")]
    StatefulModelRequired,

    #[error("a stateless model is required for this applicator, but the model carries state")]
    StatelessModelRequired,

    #[error(transparent)]
    Core(#[from] forge_core::ForgeError),
}
