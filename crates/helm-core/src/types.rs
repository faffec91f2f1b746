//! Core type definitions for helm coordination

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::{HelmError, Result};

/// Content-derived job identifier
///
/// Format: `{name}:{version}:{sha256-hex}` (e.g. `web:1.2:9f86d0...`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Desired run state of a job on an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobGoal {
    Start,
    Stop,
}

impl std::fmt::Display for JobGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "START"),
            Self::Stop => write!(f, "STOP"),
        }
    }
}

impl std::str::FromStr for JobGoal {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "START" => Ok(Self::Start),
            "STOP" => Ok(Self::Stop),
            _ => Err(format!("Invalid job goal: {}", s)),
        }
    }
}

/// Deployable work descriptor
///
/// Immutable: the ID is derived from the other four fields when the job is
/// built (or decoded), so a job with different content is a different job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "JobFields", into = "JobFields")]
pub struct Job {
    id: JobId,
    name: String,
    version: String,
    image: String,
    command: Vec<String>,
}

/// Wire shape of a job. The ID is never stored, only recomputed.
#[derive(Serialize, Deserialize)]
struct JobFields {
    name: String,
    version: String,
    image: String,
    #[serde(default)]
    command: Vec<String>,
}

impl From<JobFields> for Job {
    fn from(fields: JobFields) -> Self {
        Job::new(fields.name, fields.version, fields.image, fields.command)
    }
}

impl From<Job> for JobFields {
    fn from(job: Job) -> Self {
        Self {
            name: job.name,
            version: job.version,
            image: job.image,
            command: job.command,
        }
    }
}

impl Job {
    pub fn new<I, S>(
        name: impl Into<String>,
        version: impl Into<String>,
        image: impl Into<String>,
        command: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let version = version.into();
        let image = image.into();
        let command: Vec<String> = command.into_iter().map(Into::into).collect();
        let id = codec::derive_job_id(&name, &version, &image, &command);

        Self {
            id,
            name,
            version,
            image,
            command,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Container image reference
    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Check that the job can be registered.
    ///
    /// Name and version end up inside the ID, which is used as a node name,
    /// so both must be legal path segments without the `:` separator.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("name", &self.name), ("version", &self.version)] {
            if !helm_store::path::is_valid_segment(value) || value.contains(':') {
                return Err(HelmError::InvalidJob(format!(
                    "job {} '{}' must be non-empty, must not start with '.', \
                     and must not contain '/', ':' or control characters",
                    field,
                    value.escape_debug()
                )));
            }
        }
        if self.image.trim().is_empty() {
            return Err(HelmError::InvalidJob(format!(
                "job {} has no image",
                self.name
            )));
        }
        Ok(())
    }
}

/// A job bound to an agent, with the goal the agent should converge to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentJob {
    pub job: JobId,
    pub goal: JobGoal,
}

impl AgentJob {
    pub fn new(job: impl Into<JobId>, goal: JobGoal) -> Self {
        Self {
            job: job.into(),
            goal,
        }
    }

    pub fn start(job: impl Into<JobId>) -> Self {
        Self::new(job, JobGoal::Start)
    }

    pub fn stop(job: impl Into<JobId>) -> Self {
        Self::new(job, JobGoal::Stop)
    }

    pub fn with_goal(mut self, goal: JobGoal) -> Self {
        self.goal = goal;
        self
    }
}
