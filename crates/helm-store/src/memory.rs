//! In-memory store for tests and single-process use

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::path::{self, ROOT};
use crate::store::Store;

#[derive(Debug)]
struct Node {
    data: Vec<u8>,
    /// Creation sequence number, used to list children in creation order.
    seq: u64,
}

#[derive(Debug, Default)]
struct Tree {
    nodes: HashMap<String, Node>,
    next_seq: u64,
}

impl Tree {
    fn contains(&self, path: &str) -> bool {
        path == ROOT || self.nodes.contains_key(path)
    }

    fn has_children(&self, path: &str) -> bool {
        self.nodes.keys().any(|p| path::parent(p) == Some(path))
    }
}

/// Store that keeps the whole tree in process memory.
///
/// Clones share the same tree, the way several clients share one ensemble.
/// Children are listed in creation order.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tree: Arc<RwLock<Tree>>,
    connected: Arc<AtomicBool>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tree: Arc::new(RwLock::new(Tree::default())),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate losing (or regaining) the store session.
    ///
    /// While disconnected every primitive fails with
    /// [`StoreError::ConnectionLoss`] and the tree is left untouched.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Number of nodes in the tree, not counting the root.
    pub async fn node_count(&self) -> usize {
        self.tree.read().await.nodes.len()
    }

    fn check_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::ConnectionLoss("memory store disconnected".to_string()))
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create(&self, path: &str, data: &[u8]) -> Result<()> {
        self.check_connected()?;
        path::validate_path(path)?;

        let mut tree = self.tree.write().await;
        if tree.contains(path) {
            return Err(StoreError::NodeExists(path.to_string()));
        }
        let parent = path::parent(path).unwrap_or(ROOT);
        if !tree.contains(parent) {
            return Err(StoreError::NoNode(parent.to_string()));
        }

        let seq = tree.next_seq;
        tree.next_seq += 1;
        tree.nodes.insert(
            path.to_string(),
            Node {
                data: data.to_vec(),
                seq,
            },
        );
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.check_connected()?;
        path::validate_path(path)?;

        if path == ROOT {
            return Ok(Vec::new());
        }
        let tree = self.tree.read().await;
        tree.nodes
            .get(path)
            .map(|node| node.data.clone())
            .ok_or_else(|| StoreError::NoNode(path.to_string()))
    }

    async fn update(&self, path: &str, data: &[u8]) -> Result<()> {
        self.check_connected()?;
        path::validate_path(path)?;

        if path == ROOT {
            return Err(StoreError::InvalidPath("the root node has no payload".to_string()));
        }
        let mut tree = self.tree.write().await;
        let node = tree
            .nodes
            .get_mut(path)
            .ok_or_else(|| StoreError::NoNode(path.to_string()))?;
        node.data = data.to_vec();
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.check_connected()?;
        path::validate_path(path)?;

        if path == ROOT {
            return Err(StoreError::InvalidPath("the root node cannot be deleted".to_string()));
        }
        let mut tree = self.tree.write().await;
        if !tree.nodes.contains_key(path) {
            return Err(StoreError::NoNode(path.to_string()));
        }
        if tree.has_children(path) {
            return Err(StoreError::NotEmpty(path.to_string()));
        }
        tree.nodes.remove(path);
        Ok(())
    }

    async fn children(&self, path: &str) -> Result<Vec<String>> {
        self.check_connected()?;
        path::validate_path(path)?;

        let tree = self.tree.read().await;
        if !tree.contains(path) {
            return Err(StoreError::NoNode(path.to_string()));
        }

        let mut children: Vec<(u64, &str)> = tree
            .nodes
            .iter()
            .filter(|(p, _)| path::parent(p) == Some(path))
            .map(|(p, node)| (node.seq, path::name(p)))
            .collect();
        children.sort_by_key(|(seq, _)| *seq);

        Ok(children
            .into_iter()
            .map(|(_, name)| name.to_string())
            .collect())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        self.check_connected()?;
        path::validate_path(path)?;

        Ok(self.tree.read().await.contains(path))
    }
}
