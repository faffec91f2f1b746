//! # helm-coordinator
//!
//! Coordination layer for helm.
//!
//! This crate provides:
//! - The namespace layout agents, jobs and bindings occupy in the store
//! - One registry per entity kind (agents, jobs, agent-jobs)
//! - The `Coordinator`, which enforces the cross-entity invariants:
//!   a binding needs an existing job and agent, a job cannot be removed
//!   while bound, an agent cannot be removed while it has bindings

mod agent_jobs;
mod agents;
mod coordinator;
mod jobs;
mod layout;

pub use agent_jobs::AgentJobRegistry;
pub use agents::AgentRegistry;
pub use coordinator::Coordinator;
pub use jobs::JobRegistry;
pub use layout::Layout;
