use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PruneError {
    #[error(transparent)]
    Core(#[from] forge_core::ForgeError),
}
