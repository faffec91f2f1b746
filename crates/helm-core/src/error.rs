//! Unified error types for helm

use helm_store::StoreError;
use thiserror::Error;

use crate::types::JobId;

/// Unified error type for all coordinator operations
#[derive(Error, Debug)]
pub enum HelmError {
    // Agent errors
    #[error("Agent does not exist: {0}")]
    AgentDoesNotExist(String),

    #[error("Agent {agent} still has jobs assigned: {}", .jobs.join(", "))]
    AgentStillInUse { agent: String, jobs: Vec<String> },

    // Job errors
    #[error("Job does not exist: {0}")]
    JobDoesNotExist(JobId),

    #[error("Job {job} is still deployed on: {}", .agents.join(", "))]
    JobStillInUse { job: JobId, agents: Vec<String> },

    #[error("Invalid job descriptor: {0}")]
    InvalidJob(String),

    // Binding errors
    #[error("Job {job} is not deployed on agent {agent}")]
    AgentJobDoesNotExist { agent: String, job: JobId },

    #[error("Job {job} is already deployed on agent {agent}")]
    AgentJobAlreadyExists { agent: String, job: JobId },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any store failure not translated into one of the kinds above
    /// (session loss, local I/O, an unexpected race).
    #[error("Coordination failure: {0}")]
    Store(#[from] StoreError),
}

impl HelmError {
    /// Whether this is the general coordination-failure kind rather than an
    /// invariant violation the caller can react to.
    pub fn is_coordination_failure(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Result type alias using HelmError
pub type Result<T> = std::result::Result<T, HelmError>;
