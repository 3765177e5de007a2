//! Composer-specific error conditions layered on top of [`forge_core::ForgeError`].

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComposeError {
    /// An arc's span reaches past the end of the lattice.
    #[error("malformed lattice: an arc spans past the end")]
    MalformedLattice,

    #[error(transparent)]
    Core(#[from] forge_core::ForgeError),
}
