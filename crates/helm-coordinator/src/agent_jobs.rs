//! Agent-job binding registry

use std::collections::BTreeMap;

use helm_core::{codec, AgentJob, HelmError, JobId, Result};
use helm_store::Store;
use tracing::{debug, info};

use crate::layout::{check_agent_name, check_job_id, Layout};

/// Registry of agent-job bindings, stored under each agent's node
#[derive(Debug, Clone)]
pub struct AgentJobRegistry<S> {
    store: S,
    layout: Layout,
}

impl<S: Store> AgentJobRegistry<S> {
    pub fn new(store: S, layout: Layout) -> Self {
        Self { store, layout }
    }

    /// Bind a job to an agent.
    ///
    /// Does not check that the job exists; callers go through the
    /// coordinator for that. A missing agent node shows up here as the
    /// store refusing to create a child under it.
    pub async fn add_agent_job(&self, agent: &str, binding: &AgentJob) -> Result<()> {
        check_agent_name(agent)?;
        check_job_id(&binding.job)?;

        let payload = codec::encode(binding)?;
        match self
            .store
            .create(&self.layout.agent_job(agent, &binding.job), &payload)
            .await
        {
            Ok(()) => {
                info!("Bound job {} to agent {} with goal {}", binding.job, agent, binding.goal);
                Ok(())
            }
            Err(e) if e.is_node_exists() => Err(HelmError::AgentJobAlreadyExists {
                agent: agent.to_string(),
                job: binding.job.clone(),
            }),
            Err(e) if e.is_no_node() => Err(HelmError::AgentDoesNotExist(agent.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_agent_job(&self, agent: &str, job: &JobId) -> Result<AgentJob> {
        check_agent_name(agent)?;
        check_job_id(job)?;

        match self.store.read(&self.layout.agent_job(agent, job)).await {
            Ok(payload) => codec::decode(&payload),
            Err(e) if e.is_no_node() => Err(self.missing(agent, job)),
            Err(e) => Err(e.into()),
        }
    }

    /// All bindings on one agent, keyed by job ID.
    pub async fn get_agent_jobs(&self, agent: &str) -> Result<BTreeMap<JobId, AgentJob>> {
        check_agent_name(agent)?;

        let jobs = match self.store.children(&self.layout.agent(agent)).await {
            Ok(jobs) => jobs,
            Err(e) if e.is_no_node() => return Err(HelmError::AgentDoesNotExist(agent.to_string())),
            Err(e) => return Err(e.into()),
        };

        let mut bindings = BTreeMap::new();
        for job in jobs.into_iter().map(JobId::from) {
            match self.store.read(&self.layout.agent_job(agent, &job)).await {
                Ok(payload) => {
                    bindings.insert(job, codec::decode(&payload)?);
                }
                Err(e) if e.is_no_node() => debug!("Binding {} on {} removed while listing", job, agent),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(bindings)
    }

    /// Change the goal of an existing binding in place.
    pub async fn update_agent_job(&self, agent: &str, binding: &AgentJob) -> Result<()> {
        check_agent_name(agent)?;
        check_job_id(&binding.job)?;

        let payload = codec::encode(binding)?;
        match self
            .store
            .update(&self.layout.agent_job(agent, &binding.job), &payload)
            .await
        {
            Ok(()) => {
                info!("Set goal of job {} on agent {} to {}", binding.job, agent, binding.goal);
                Ok(())
            }
            Err(e) if e.is_no_node() => Err(self.missing(agent, &binding.job)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove_agent_job(&self, agent: &str, job: &JobId) -> Result<()> {
        check_agent_name(agent)?;
        check_job_id(job)?;

        match self.store.delete(&self.layout.agent_job(agent, job)).await {
            Ok(()) => {
                info!("Unbound job {} from agent {}", job, agent);
                Ok(())
            }
            Err(e) if e.is_no_node() => Err(self.missing(agent, job)),
            Err(e) => Err(e.into()),
        }
    }

    /// Agents that currently hold a binding to `job`.
    pub async fn agents_for_job(&self, job: &JobId) -> Result<Vec<String>> {
        check_job_id(job)?;

        let agents = match self.store.children(&self.layout.agents()).await {
            Ok(agents) => agents,
            Err(e) if e.is_no_node() => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut holders = Vec::new();
        for agent in agents {
            if self.store.exists(&self.layout.agent_job(&agent, job)).await? {
                holders.push(agent);
            }
        }
        Ok(holders)
    }

    fn missing(&self, agent: &str, job: &JobId) -> HelmError {
        HelmError::AgentJobDoesNotExist {
            agent: agent.to_string(),
            job: job.clone(),
        }
    }
}
