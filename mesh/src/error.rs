//! Error types for mesh operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("gRPC status error: {0}")]
    Status(#[from] tonic::Status),

    #[error("relay rejected envelope: {0}")]
    Rejected(String),

    #[error("job aborted: {0}")]
    Aborted(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("rank {rank} is outside a job of {size} ranks")]
    UnknownRank { rank: usize, size: usize },

    #[error("rank {0} is not a member of the group")]
    NotAMember(usize),

    #[error("expected a payload of {expected} values, received {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}
