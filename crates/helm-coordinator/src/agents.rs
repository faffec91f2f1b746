//! Agent registry

use helm_core::{HelmError, Result};
use helm_store::Store;
use tracing::{debug, info, warn};

use crate::layout::{check_agent_name, Layout};

/// Registry of worker nodes, one node per agent under `{root}/agents`
#[derive(Debug, Clone)]
pub struct AgentRegistry<S> {
    store: S,
    layout: Layout,
}

impl<S: Store> AgentRegistry<S> {
    pub fn new(store: S, layout: Layout) -> Self {
        Self { store, layout }
    }

    /// Register an agent. Registering an agent twice is a no-op.
    pub async fn add_agent(&self, agent: &str) -> Result<()> {
        check_agent_name(agent)?;

        match self.store.create(&self.layout.agent(agent), &[]).await {
            Ok(()) => {
                info!("Registered agent {}", agent);
                Ok(())
            }
            Err(e) if e.is_node_exists() => {
                debug!("Agent {} already registered", agent);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deregister an agent that has no jobs bound to it.
    pub async fn remove_agent(&self, agent: &str) -> Result<()> {
        check_agent_name(agent)?;
        let path = self.layout.agent(agent);

        let jobs = self.bound_jobs(agent, &path).await?;
        if !jobs.is_empty() {
            warn!("Refusing to remove agent {}: {} job(s) bound", agent, jobs.len());
            return Err(HelmError::AgentStillInUse {
                agent: agent.to_string(),
                jobs,
            });
        }

        match self.store.delete(&path).await {
            Ok(()) => {
                info!("Removed agent {}", agent);
                Ok(())
            }
            Err(e) if e.is_no_node() => Err(HelmError::AgentDoesNotExist(agent.to_string())),
            // A binding was added after the check above.
            Err(e) if e.is_not_empty() => {
                warn!("Agent {} gained a job while being removed", agent);
                Err(HelmError::AgentStillInUse {
                    agent: agent.to_string(),
                    jobs: self.bound_jobs(agent, &path).await?,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn bound_jobs(&self, agent: &str, path: &str) -> Result<Vec<String>> {
        match self.store.children(path).await {
            Ok(jobs) => Ok(jobs),
            Err(e) if e.is_no_node() => Err(HelmError::AgentDoesNotExist(agent.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Names of all registered agents, in the order the store lists them.
    pub async fn get_agents(&self) -> Result<Vec<String>> {
        match self.store.children(&self.layout.agents()).await {
            Ok(agents) => Ok(agents),
            Err(e) if e.is_no_node() => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn agent_exists(&self, agent: &str) -> Result<bool> {
        check_agent_name(agent)?;
        Ok(self.store.exists(&self.layout.agent(agent)).await?)
    }
}
