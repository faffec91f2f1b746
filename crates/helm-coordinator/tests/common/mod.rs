//! Scenarios shared by the per-backend integration tests
//!
//! Each scenario takes a freshly connected coordinator so the same
//! behaviour is checked against every `Store` implementation.

#![allow(dead_code)]

use std::collections::BTreeSet;

use anyhow::Result;
use helm_core::{AgentJob, HelmError, Job, JobGoal};
use helm_coordinator::Coordinator;
use helm_store::Store;

pub const IMAGE: &str = "IMAGE";
pub const COMMAND: &str = "COMMAND";
pub const JOB_NAME: &str = "JOB_NAME";
pub const AGENT: &str = "AGENT";

pub fn job() -> Job {
    Job::new(JOB_NAME, "VERSION", IMAGE, [COMMAND])
}

/// Install a test subscriber so `RUST_LOG=debug` shows coordinator logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn agent_add_remove_list<S: Store>(coordinator: &Coordinator<S>) -> Result<()> {
    let second = "SECOND";

    assert!(coordinator.get_agents().await?.is_empty());

    coordinator.add_agent(AGENT).await?;
    assert_eq!(coordinator.get_agents().await?, vec![AGENT]);

    coordinator.add_agent(second).await?;
    assert_eq!(coordinator.get_agents().await?, vec![AGENT, second]);

    coordinator.remove_agent(AGENT).await?;
    assert_eq!(coordinator.get_agents().await?, vec![second]);
    Ok(())
}

pub async fn double_add_agent<S: Store>(coordinator: &Coordinator<S>) -> Result<()> {
    coordinator.add_agent(AGENT).await?;
    coordinator.add_agent(AGENT).await?;

    assert_eq!(coordinator.get_agents().await?, vec![AGENT]);
    Ok(())
}

pub async fn agent_remove<S: Store>(coordinator: &Coordinator<S>) -> Result<()> {
    coordinator.add_agent(AGENT).await?;
    assert!(coordinator.get_agents().await?.contains(&AGENT.to_string()));

    coordinator.remove_agent(AGENT).await?;
    let agents = coordinator.get_agents().await?;
    assert_eq!(agents.len(), 0);
    assert!(!coordinator.agent_exists(AGENT).await?);

    assert!(matches!(
        coordinator.remove_agent(AGENT).await,
        Err(HelmError::AgentDoesNotExist(_))
    ));
    Ok(())
}

pub async fn job_add_get<S: Store>(coordinator: &Coordinator<S>) -> Result<()> {
    let job = job();
    assert!(coordinator.get_jobs().await?.is_empty());

    let id = coordinator.add_job(&job).await?;
    assert_eq!(&id, job.id());
    assert_eq!(coordinator.get_jobs().await?.get(&id), Some(&job));
    assert_eq!(coordinator.get_job(&id).await?, job);

    let second = Job::new(JOB_NAME, "SECOND", IMAGE, [COMMAND]);
    assert_ne!(second.id(), job.id());

    coordinator.add_job(&second).await?;
    assert_eq!(coordinator.get_job(second.id()).await?, second);
    assert_eq!(coordinator.get_job(job.id()).await?, job);
    assert_eq!(coordinator.get_jobs().await?.len(), 2);
    Ok(())
}

pub async fn job_remove<S: Store>(coordinator: &Coordinator<S>) -> Result<()> {
    let job = job();
    let id = coordinator.add_job(&job).await?;
    coordinator.add_agent(AGENT).await?;
    coordinator.add_agent_job(AGENT, &AgentJob::start(id.clone())).await?;

    match coordinator.remove_job(&id).await {
        Err(HelmError::JobStillInUse { job, agents }) => {
            assert_eq!(job, id);
            assert_eq!(agents, vec![AGENT]);
        }
        other => panic!("expected JobStillInUse, got {:?}", other),
    }

    coordinator.remove_agent_job(AGENT, &id).await?;
    assert!(coordinator.get_jobs().await?.get(&id).is_some());

    coordinator.remove_job(&id).await?;
    assert!(coordinator.get_jobs().await?.get(&id).is_none());
    assert!(matches!(
        coordinator.get_job(&id).await,
        Err(HelmError::JobDoesNotExist(_))
    ));
    Ok(())
}

pub async fn add_agent_job<S: Store>(coordinator: &Coordinator<S>) -> Result<()> {
    let job = job();
    let binding = AgentJob::start(job.id().clone());

    // Neither exists: the job check runs first.
    assert!(matches!(
        coordinator.add_agent_job(AGENT, &binding).await,
        Err(HelmError::JobDoesNotExist(_))
    ));

    coordinator.add_job(&job).await?;
    assert!(matches!(
        coordinator.add_agent_job(AGENT, &binding).await,
        Err(HelmError::AgentDoesNotExist(_))
    ));

    coordinator.add_agent(AGENT).await?;
    coordinator.add_agent_job(AGENT, &binding).await?;

    coordinator.remove_agent_job(AGENT, job.id()).await?;
    coordinator.remove_job(job.id()).await?;

    // Agent exists, job is gone again.
    assert!(matches!(
        coordinator.add_agent_job(AGENT, &binding).await,
        Err(HelmError::JobDoesNotExist(_))
    ));
    Ok(())
}

pub async fn duplicate_binding<S: Store>(coordinator: &Coordinator<S>) -> Result<()> {
    let job = job();
    coordinator.add_job(&job).await?;
    coordinator.add_agent(AGENT).await?;
    coordinator.add_agent_job(AGENT, &AgentJob::start(job.id().clone())).await?;

    assert!(matches!(
        coordinator.add_agent_job(AGENT, &AgentJob::stop(job.id().clone())).await,
        Err(HelmError::AgentJobAlreadyExists { .. })
    ));
    assert_eq!(
        coordinator.get_agent_job(AGENT, job.id()).await?.goal,
        JobGoal::Start
    );
    Ok(())
}

async fn stop_job<S: Store>(coordinator: &Coordinator<S>, job: &Job) -> Result<(), HelmError> {
    coordinator
        .update_agent_job(AGENT, &AgentJob::new(job.id().clone(), JobGoal::Stop))
        .await
}

pub async fn update_deploy<S: Store>(coordinator: &Coordinator<S>) -> Result<()> {
    let job = job();

    assert!(matches!(
        stop_job(coordinator, &job).await,
        Err(HelmError::JobDoesNotExist(_))
    ));

    coordinator.add_job(&job).await?;
    assert!(matches!(
        stop_job(coordinator, &job).await,
        Err(HelmError::AgentDoesNotExist(_))
    ));

    coordinator.add_agent(AGENT).await?;
    assert!(coordinator.get_agents().await?.contains(&AGENT.to_string()));
    assert!(matches!(
        stop_job(coordinator, &job).await,
        Err(HelmError::AgentJobDoesNotExist { .. })
    ));

    coordinator
        .add_agent_job(AGENT, &AgentJob::new(job.id().clone(), JobGoal::Start))
        .await?;
    let jobs = coordinator.get_jobs().await?;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs.get(job.id()), Some(&job));

    stop_job(coordinator, &job).await?;
    let binding = coordinator.get_agent_job(AGENT, job.id()).await?;
    assert_eq!(binding.goal, JobGoal::Stop);
    assert_eq!(&binding.job, job.id());
    Ok(())
}

pub async fn remove_agent_with_bindings<S: Store>(coordinator: &Coordinator<S>) -> Result<()> {
    let job = job();
    coordinator.add_job(&job).await?;
    coordinator.add_agent(AGENT).await?;
    coordinator.add_agent_job(AGENT, &AgentJob::start(job.id().clone())).await?;

    match coordinator.remove_agent(AGENT).await {
        Err(HelmError::AgentStillInUse { agent, jobs }) => {
            assert_eq!(agent, AGENT);
            assert_eq!(jobs, vec![job.id().to_string()]);
        }
        other => panic!("expected AgentStillInUse, got {:?}", other),
    }
    assert!(coordinator.agent_exists(AGENT).await?);
    assert_eq!(coordinator.get_agent_jobs(AGENT).await?.len(), 1);

    coordinator.remove_agent_job(AGENT, job.id()).await?;
    coordinator.remove_agent(AGENT).await?;
    assert!(coordinator.get_agents().await?.is_empty());
    Ok(())
}

pub async fn bindings_across_agents<S: Store>(coordinator: &Coordinator<S>) -> Result<()> {
    let web = job();
    let db = Job::new("db", "14", "postgres", ["postgres", "-D", "/data"]);
    coordinator.add_job(&web).await?;
    coordinator.add_job(&db).await?;
    for agent in ["h1", "h2", "h3"] {
        coordinator.add_agent(agent).await?;
    }

    coordinator.add_agent_job("h1", &AgentJob::start(web.id().clone())).await?;
    coordinator.add_agent_job("h3", &AgentJob::start(web.id().clone())).await?;
    coordinator.add_agent_job("h3", &AgentJob::stop(db.id().clone())).await?;

    assert_eq!(coordinator.agents_for_job(web.id()).await?, vec!["h1", "h3"]);
    assert_eq!(coordinator.agents_for_job(db.id()).await?, vec!["h3"]);

    let on_h3 = coordinator.get_agent_jobs("h3").await?;
    assert_eq!(on_h3.len(), 2);
    assert_eq!(on_h3[db.id()].goal, JobGoal::Stop);
    assert!(coordinator.get_agent_jobs("h2").await?.is_empty());

    // Removing the binding on h1 is not enough while h3 still has it.
    coordinator.remove_agent_job("h1", web.id()).await?;
    assert!(matches!(
        coordinator.remove_job(web.id()).await,
        Err(HelmError::JobStillInUse { agents, .. }) if agents == vec!["h3".to_string()]
    ));
    Ok(())
}

/// Replay a fixed mix of adds and removes against a model set.
pub async fn agent_sequence_matches_model<S: Store>(coordinator: &Coordinator<S>) -> Result<()> {
    let mut model = BTreeSet::new();
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;

    for _ in 0..200 {
        // xorshift64
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let agent = format!("agent-{}", (state >> 16) % 12);

        if state % 3 == 0 {
            let result = coordinator.remove_agent(&agent).await;
            if model.remove(&agent) {
                result?;
            } else {
                assert!(matches!(result, Err(HelmError::AgentDoesNotExist(_))));
            }
        } else {
            coordinator.add_agent(&agent).await?;
            model.insert(agent);
        }

        let listed = coordinator.get_agents().await?;
        let unique: BTreeSet<String> = listed.iter().cloned().collect();
        assert_eq!(unique.len(), listed.len(), "duplicate agents in {:?}", listed);
        assert_eq!(unique, model);
    }
    Ok(())
}

pub async fn invalid_names_rejected<S: Store>(coordinator: &Coordinator<S>) -> Result<()> {
    assert!(matches!(
        coordinator.add_agent("a/b").await,
        Err(HelmError::InvalidName(_))
    ));
    assert!(matches!(
        coordinator.get_job(&"../jobs".into()).await,
        Err(HelmError::InvalidName(_))
    ));
    assert!(matches!(
        coordinator.add_job(&Job::new("web:x", "1", IMAGE, [COMMAND])).await,
        Err(HelmError::InvalidJob(_))
    ));
    assert!(coordinator.get_agents().await?.is_empty());
    assert!(coordinator.get_jobs().await?.is_empty());
    Ok(())
}
