//! Job registry

use std::collections::BTreeMap;

use helm_core::{codec, HelmError, Job, JobId, Result};
use helm_store::Store;
use tracing::{debug, info, warn};

use crate::agent_jobs::AgentJobRegistry;
use crate::layout::{check_job_id, Layout};

/// Registry of job descriptors, one node per job ID under `{root}/jobs`
#[derive(Debug, Clone)]
pub struct JobRegistry<S> {
    store: S,
    layout: Layout,
    agent_jobs: AgentJobRegistry<S>,
}

impl<S: Store + Clone> JobRegistry<S> {
    pub fn new(store: S, layout: Layout) -> Self {
        let agent_jobs = AgentJobRegistry::new(store.clone(), layout.clone());
        Self {
            store,
            layout,
            agent_jobs,
        }
    }
}

impl<S: Store> JobRegistry<S> {
    /// Register a job and return its ID.
    ///
    /// Adding a job whose ID is already registered rewrites the same
    /// descriptor and succeeds.
    pub async fn add_job(&self, job: &Job) -> Result<JobId> {
        job.validate()?;

        let path = self.layout.job(job.id());
        let payload = codec::encode(job)?;
        match self.store.create(&path, &payload).await {
            Ok(()) => info!("Added job {}", job.id()),
            Err(e) if e.is_node_exists() => {
                debug!("Job {} already registered, rewriting descriptor", job.id());
                self.rewrite(&path, &payload, job).await?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(job.id().clone())
    }

    async fn rewrite(&self, path: &str, payload: &[u8], job: &Job) -> Result<()> {
        match self.store.update(path, payload).await {
            Ok(()) => Ok(()),
            // Removed between the create and the update.
            Err(e) if e.is_no_node() => match self.store.create(path, payload).await {
                Ok(()) => {
                    info!("Added job {}", job.id());
                    Ok(())
                }
                Err(e) if e.is_node_exists() => Ok(()),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_job(&self, id: &JobId) -> Result<Job> {
        check_job_id(id)?;

        match self.store.read(&self.layout.job(id)).await {
            Ok(payload) => codec::decode(&payload),
            Err(e) if e.is_no_node() => Err(HelmError::JobDoesNotExist(id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    /// Every registered job, keyed by the ID it is registered under.
    pub async fn get_jobs(&self) -> Result<BTreeMap<JobId, Job>> {
        let ids = match self.store.children(&self.layout.jobs()).await {
            Ok(ids) => ids,
            Err(e) if e.is_no_node() => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        let mut jobs = BTreeMap::new();
        for id in ids.into_iter().map(JobId::from) {
            let payload = match self.store.read(&self.layout.job(&id)).await {
                Ok(payload) => payload,
                Err(e) if e.is_no_node() => {
                    debug!("Job {} removed while listing", id);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let job: Job = codec::decode(&payload)?;
            if job.id() != &id {
                warn!("Job node {} holds a descriptor with id {}", id, job.id());
            }
            jobs.insert(id, job);
        }
        Ok(jobs)
    }

    /// Remove a job that no agent has bound.
    pub async fn remove_job(&self, id: &JobId) -> Result<()> {
        check_job_id(id)?;
        let path = self.layout.job(id);

        if !self.store.exists(&path).await? {
            return Err(HelmError::JobDoesNotExist(id.clone()));
        }

        let agents = self.agent_jobs.agents_for_job(id).await?;
        if !agents.is_empty() {
            warn!("Refusing to remove job {}: bound on {}", id, agents.join(", "));
            return Err(HelmError::JobStillInUse {
                job: id.clone(),
                agents,
            });
        }

        match self.store.delete(&path).await {
            Ok(()) => {
                info!("Removed job {}", id);
                Ok(())
            }
            Err(e) if e.is_no_node() => Err(HelmError::JobDoesNotExist(id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn job_exists(&self, id: &JobId) -> Result<bool> {
        check_job_id(id)?;
        Ok(self.store.exists(&self.layout.job(id)).await?)
    }
}
