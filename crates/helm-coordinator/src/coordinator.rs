//! Coordinator: the public operation set over the three registries
//!
//! Every mutating operation runs its precondition reads in a fixed order and
//! then issues exactly one mutating store primitive, so the error a caller
//! sees is always the first precondition that failed and a rejected call
//! leaves no trace in the store.
//!
//! The check-then-act sequences are not atomic. A job or agent removed by
//! another client between the checks and the mutation can still race; the
//! binding layout narrows that window (the store refuses to create a binding
//! under a missing agent, or to delete an agent that has bindings) but a job
//! removed concurrently with a new binding is not fenced.

use std::collections::BTreeMap;
use std::sync::Arc;

use helm_core::{AgentJob, HelmConfig, HelmError, Job, JobId, Result, StoreConfig};
use helm_store::{FsStore, MemoryStore, Store};
use tracing::{debug, instrument};

use crate::agent_jobs::AgentJobRegistry;
use crate::agents::AgentRegistry;
use crate::jobs::JobRegistry;
use crate::layout::Layout;

/// Cluster coordinator
///
/// Holds no state of its own beyond store handles, so any number of
/// coordinators (in one process or many) can share a store.
#[derive(Debug, Clone)]
pub struct Coordinator<S> {
    layout: Layout,
    agents: AgentRegistry<S>,
    jobs: JobRegistry<S>,
    agent_jobs: AgentJobRegistry<S>,
}

impl Coordinator<Arc<dyn Store>> {
    /// Open the store backend named in `config` and connect to it.
    pub async fn from_config(config: &HelmConfig) -> Result<Self> {
        let store: Arc<dyn Store> = match &config.store {
            StoreConfig::Memory => Arc::new(MemoryStore::new()),
            StoreConfig::Fs { root } => Arc::new(FsStore::open(root).await?),
        };
        Self::connect(store, config).await
    }
}

impl<S: Store + Clone> Coordinator<S> {
    /// Create the namespace subtrees if needed and build the registries.
    pub async fn connect(store: S, config: &HelmConfig) -> Result<Self> {
        config.validate()?;
        let layout = Layout::new(config.namespace.clone());

        store.ensure_path(&layout.agents()).await?;
        store.ensure_path(&layout.jobs()).await?;
        debug!("Connected coordinator at {}", layout.root());

        Ok(Self {
            agents: AgentRegistry::new(store.clone(), layout.clone()),
            jobs: JobRegistry::new(store.clone(), layout.clone()),
            agent_jobs: AgentJobRegistry::new(store, layout.clone()),
            layout,
        })
    }
}

impl<S: Store> Coordinator<S> {
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    // ----- agents -----

    /// Register an agent (no-op if already registered).
    #[instrument(skip(self))]
    pub async fn add_agent(&self, agent: &str) -> Result<()> {
        self.agents.add_agent(agent).await
    }

    /// Deregister an agent.
    ///
    /// Fails with [`HelmError::AgentStillInUse`] while any job is bound to it.
    #[instrument(skip(self))]
    pub async fn remove_agent(&self, agent: &str) -> Result<()> {
        self.agents.remove_agent(agent).await
    }

    #[instrument(skip(self))]
    pub async fn get_agents(&self) -> Result<Vec<String>> {
        self.agents.get_agents().await
    }

    #[instrument(skip(self))]
    pub async fn agent_exists(&self, agent: &str) -> Result<bool> {
        self.agents.agent_exists(agent).await
    }

    // ----- jobs -----

    #[instrument(skip(self, job), fields(job = %job.id()))]
    pub async fn add_job(&self, job: &Job) -> Result<JobId> {
        self.jobs.add_job(job).await
    }

    #[instrument(skip(self))]
    pub async fn get_job(&self, id: &JobId) -> Result<Job> {
        self.jobs.get_job(id).await
    }

    #[instrument(skip(self))]
    pub async fn get_jobs(&self) -> Result<BTreeMap<JobId, Job>> {
        self.jobs.get_jobs().await
    }

    /// Remove a job.
    ///
    /// Fails with [`HelmError::JobStillInUse`] while any agent has it bound.
    #[instrument(skip(self))]
    pub async fn remove_job(&self, id: &JobId) -> Result<()> {
        self.jobs.remove_job(id).await
    }

    #[instrument(skip(self))]
    pub async fn job_exists(&self, id: &JobId) -> Result<bool> {
        self.jobs.job_exists(id).await
    }

    // ----- agent-jobs -----

    /// Bind a registered job to a registered agent.
    ///
    /// The job is checked before the agent: with both missing the caller
    /// gets [`HelmError::JobDoesNotExist`].
    #[instrument(skip(self))]
    pub async fn add_agent_job(&self, agent: &str, binding: &AgentJob) -> Result<()> {
        self.check_job_and_agent(agent, &binding.job).await?;
        self.agent_jobs.add_agent_job(agent, binding).await
    }

    #[instrument(skip(self))]
    pub async fn get_agent_job(&self, agent: &str, job: &JobId) -> Result<AgentJob> {
        self.agent_jobs.get_agent_job(agent, job).await
    }

    /// Every binding on `agent`, keyed by job ID.
    #[instrument(skip(self))]
    pub async fn get_agent_jobs(&self, agent: &str) -> Result<BTreeMap<JobId, AgentJob>> {
        self.agent_jobs.get_agent_jobs(agent).await
    }

    /// Change the goal of an existing binding.
    ///
    /// This is an update, not an upsert: with the job and agent both
    /// registered but not bound, it fails with
    /// [`HelmError::AgentJobDoesNotExist`].
    #[instrument(skip(self))]
    pub async fn update_agent_job(&self, agent: &str, binding: &AgentJob) -> Result<()> {
        self.check_job_and_agent(agent, &binding.job).await?;
        self.agent_jobs.update_agent_job(agent, binding).await
    }

    #[instrument(skip(self))]
    pub async fn remove_agent_job(&self, agent: &str, job: &JobId) -> Result<()> {
        self.agent_jobs.remove_agent_job(agent, job).await
    }

    /// Agents that currently have `job` bound.
    #[instrument(skip(self))]
    pub async fn agents_for_job(&self, job: &JobId) -> Result<Vec<String>> {
        self.agent_jobs.agents_for_job(job).await
    }

    async fn check_job_and_agent(&self, agent: &str, job: &JobId) -> Result<()> {
        if !self.jobs.job_exists(job).await? {
            return Err(HelmError::JobDoesNotExist(job.clone()));
        }
        if !self.agents.agent_exists(agent).await? {
            return Err(HelmError::AgentDoesNotExist(agent.to_string()));
        }
        Ok(())
    }
}
