//! Namespace layout inside the store
//!
//! ```text
//! {root}/agents/{agent}            agent registration (empty payload)
//! {root}/agents/{agent}/{job-id}   agent-job binding (encoded AgentJob)
//! {root}/jobs/{job-id}             job descriptor (encoded Job)
//! ```
//!
//! Bindings are children of their agent node, so the store itself refuses
//! to create a binding for an unregistered agent and refuses to delete an
//! agent that still has bindings.

use helm_core::{HelmError, JobId, Result};
use helm_store::path;

const AGENTS: &str = "agents";
const JOBS: &str = "jobs";

/// Node paths for every entity kind under a namespace root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: String,
}

impl Layout {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn agents(&self) -> String {
        path::join(&self.root, AGENTS)
    }

    pub fn agent(&self, agent: &str) -> String {
        path::join(&self.agents(), agent)
    }

    pub fn agent_job(&self, agent: &str, job: &JobId) -> String {
        path::join(&self.agent(agent), job.as_str())
    }

    pub fn jobs(&self) -> String {
        path::join(&self.root, JOBS)
    }

    pub fn job(&self, job: &JobId) -> String {
        path::join(&self.jobs(), job.as_str())
    }
}

/// Reject agent names that cannot be a single node name.
pub(crate) fn check_agent_name(agent: &str) -> Result<()> {
    if path::is_valid_segment(agent) {
        Ok(())
    } else {
        Err(HelmError::InvalidName(format!(
            "agent name '{}' is not a legal node name",
            agent.escape_debug()
        )))
    }
}

/// Reject job IDs that cannot be a single node name.
pub(crate) fn check_job_id(job: &JobId) -> Result<()> {
    if path::is_valid_segment(job.as_str()) {
        Ok(())
    } else {
        Err(HelmError::InvalidName(format!(
            "job id '{}' is not a legal node name",
            job.as_str().escape_debug()
        )))
    }
}
