//! Hierarchical store abstraction

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::path;

/// Primitive node operations against a hierarchical, consistent store
/// (allows swapping the real ensemble for an in-memory fake in tests).
///
/// Each primitive is atomic on its own node. Nothing here spans nodes.
#[async_trait]
pub trait Store: Send + Sync {
    /// Create a node holding `data`. The parent must already exist.
    async fn create(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read the payload of a node.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Replace the payload of an existing node in place.
    async fn update(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Delete a node that has no children.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Names (not full paths) of a node's children.
    async fn children(&self, path: &str) -> Result<Vec<String>>;

    /// Whether a node exists.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Create `path` and any missing ancestors with empty payloads.
    ///
    /// Nodes that already exist are left untouched, so racing callers can
    /// all run this safely.
    async fn ensure_path(&self, path: &str) -> Result<()> {
        path::validate_path(path)?;
        for node in path::ancestors(path) {
            match self.create(node, &[]).await {
                Ok(()) => debug!("Created {}", node),
                Err(e) if e.is_node_exists() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn create(&self, path: &str, data: &[u8]) -> Result<()> {
        (**self).create(path, data).await
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        (**self).read(path).await
    }

    async fn update(&self, path: &str, data: &[u8]) -> Result<()> {
        (**self).update(path, data).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        (**self).delete(path).await
    }

    async fn children(&self, path: &str) -> Result<Vec<String>> {
        (**self).children(path).await
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        (**self).exists(path).await
    }

    async fn ensure_path(&self, path: &str) -> Result<()> {
        (**self).ensure_path(path).await
    }
}
