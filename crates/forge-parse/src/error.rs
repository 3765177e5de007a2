use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed lattice: an arc spans past the end")]
    MalformedLattice,

    #[error(transparent)]
    Core(#[from] forge_core::ForgeError),
}
