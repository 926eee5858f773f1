//! Error types for fox operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("number of processes ({0}) must be a perfect square")]
    NotPerfectSquare(usize),

    #[error("matrix dimension ({n}) must be divisible by sqrt(processes) ({q})")]
    Indivisible { n: usize, q: usize },

    #[error("expected {expected} blocks of {size}x{size}, got {actual}")]
    BlockLayout {
        expected: usize,
        actual: usize,
        size: usize,
    },

    #[error("input error: {0}")]
    Input(String),

    #[error("allocation error: {0}")]
    Allocation(String),

    #[error("rank task failed: {0}")]
    Worker(String),

    #[error("communication error: {0}")]
    Communication(#[from] fox_mesh::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether every rank reaches this error on its own, without hearing it
    /// from a peer.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::NotPerfectSquare(_) | Error::Indivisible { .. } | Error::BlockLayout { .. }
        )
    }
}
