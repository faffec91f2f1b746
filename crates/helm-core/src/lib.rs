//! # helm-core
//!
//! Core types for the helm cluster coordinator.
//!
//! helm keeps a cluster-wide registry of agents (worker nodes), jobs
//! (immutable, content-identified work descriptors) and agent-jobs (a job
//! bound to an agent with a START/STOP goal) in a hierarchical consistent
//! store.
//!
//! This crate provides:
//! - The data model: `Job`, `JobId`, `JobGoal`, `AgentJob`
//! - The descriptor codec and job ID derivation
//! - The unified `HelmError`
//! - `HelmConfig`

pub mod codec;
pub mod config;
mod error;
mod types;

pub use config::{HelmConfig, StoreConfig};
pub use error::{HelmError, Result};
pub use types::*;
