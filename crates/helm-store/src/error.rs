//! Error types for store primitives

use thiserror::Error;

/// Failure of a single store primitive.
///
/// The first four variants are the "typed conditions" a caller can branch on;
/// everything else is a coordination failure the caller cannot fix by
/// changing its request.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Node already exists: {0}")]
    NodeExists(String),

    #[error("Node does not exist: {0}")]
    NoNode(String),

    #[error("Node has children: {0}")]
    NotEmpty(String),

    #[error("Invalid node path: {0}")]
    InvalidPath(String),

    #[error("Connection to store lost: {0}")]
    ConnectionLoss(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_node_exists(&self) -> bool {
        matches!(self, Self::NodeExists(_))
    }

    pub fn is_no_node(&self) -> bool {
        matches!(self, Self::NoNode(_))
    }

    pub fn is_not_empty(&self) -> bool {
        matches!(self, Self::NotEmpty(_))
    }
}

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;
