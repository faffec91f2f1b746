//! # helm-store
//!
//! Store adapter layer for the helm coordinator.
//!
//! This crate provides:
//! - The `Store` trait: create/read/update/delete/list over a hierarchical
//!   namespace, with typed "exists" / "missing" / "has children" failures
//! - Path validation helpers
//! - `MemoryStore`, an in-memory implementation for tests
//! - `FsStore`, a directory-tree implementation for single-host deployments

mod error;
mod fs;
mod memory;
pub mod path;
mod store;

pub use error::{Result, StoreError};
pub use fs::FsStore;
pub use memory::MemoryStore;
pub use store::Store;
