//! Error types for graph operations.
//!
//! Only operations addressed by identity, and moves to non-finite
//! coordinates, can fail. Degenerate geometry is resolved inside the pose
//! solver and never surfaces here.

use crate::graph::VertexId;

/// Errors returned by graph mutations and configuration checks.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("Unknown vertex: {0}")]
    UnknownVertex(VertexId),

    #[error("Non-finite position for {0}")]
    InvalidPosition(VertexId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GraphError>;
