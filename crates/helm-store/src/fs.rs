//! Directory-tree store
//!
//! Each node is a directory below the store root and its payload lives in a
//! `.data` file inside that directory. Children are the node's
//! subdirectories. Since path segments may never start with `.`, payload,
//! temp, staging and tombstone entries can never collide with a child node.
//!
//! A node only ever appears or disappears through a single `rename`:
//! `create` builds the directory and its payload under a hidden staging name
//! and renames it into place, and `delete` renames the node to a hidden
//! tombstone before clearing it. Readers therefore see either the whole node
//! or no node at all.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::path::{self, ROOT};
use crate::store::Store;

const PAYLOAD_FILE: &str = ".data";

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Hidden, process-unique entry name such as `.stage-4242-7`.
fn scratch_name(kind: &str) -> String {
    let seq = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(".{}-{}-{}", kind, std::process::id(), seq)
}

fn is_not_found(e: &std::io::Error) -> bool {
    e.kind() == ErrorKind::NotFound
}

/// Store backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        debug!("Opened fs store at {}", root.display());
        Ok(Self { root })
    }

    /// Directory holding the tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir_for(&self, path: &str) -> PathBuf {
        if path == ROOT {
            self.root.clone()
        } else {
            self.root.join(path.trim_start_matches('/'))
        }
    }

    async fn is_node(dir: &Path) -> Result<bool> {
        match fs::metadata(dir).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn require_node(&self, path: &str) -> Result<PathBuf> {
        let dir = self.dir_for(path);
        if Self::is_node(&dir).await? {
            Ok(dir)
        } else {
            Err(StoreError::NoNode(path.to_string()))
        }
    }

    /// Write the payload next to the node and rename it into place.
    async fn write_payload(dir: &Path, data: &[u8]) -> std::io::Result<()> {
        let tmp = dir.join(scratch_name("tmp"));
        fs::write(&tmp, data).await?;
        if let Err(e) = fs::rename(&tmp, dir.join(PAYLOAD_FILE)).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }

    /// Names of the child nodes of `dir`, sorted. Hidden entries are skipped.
    async fn child_names(dir: &Path) -> std::io::Result<Vec<String>> {
        let mut entries = fs::read_dir(dir).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            match entry.file_type().await {
                Ok(kind) if kind.is_dir() => {}
                Ok(_) => continue,
                // Removed while listing.
                Err(e) if is_not_found(&e) => continue,
                Err(e) => return Err(e),
            }
            if path::is_valid_segment(&name) {
                names.push(name);
            } else {
                warn!("Ignoring foreign directory {}", entry.path().display());
            }
        }

        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl Store for FsStore {
    async fn create(&self, path: &str, data: &[u8]) -> Result<()> {
        path::validate_path(path)?;
        if path == ROOT {
            return Err(StoreError::NodeExists(path.to_string()));
        }

        let parent = path::parent(path).unwrap_or(ROOT);
        let parent_dir = self.require_node(parent).await?;
        let dir = self.dir_for(path);
        if Self::is_node(&dir).await? {
            return Err(StoreError::NodeExists(path.to_string()));
        }

        let staging = parent_dir.join(scratch_name("stage"));
        match fs::create_dir(&staging).await {
            Ok(()) => {}
            Err(e) if is_not_found(&e) => return Err(StoreError::NoNode(parent.to_string())),
            Err(e) => return Err(e.into()),
        }

        // A node directory always holds `.data`, so the rename cannot
        // replace an existing node: it fails with EEXIST or ENOTEMPTY.
        let published = match fs::write(staging.join(PAYLOAD_FILE), data).await {
            Ok(()) => fs::rename(&staging, &dir).await,
            Err(e) => Err(e),
        };
        let Err(e) = published else {
            return Ok(());
        };

        let _ = fs::remove_dir_all(&staging).await;
        if Self::is_node(&dir).await? {
            Err(StoreError::NodeExists(path.to_string()))
        } else if is_not_found(&e) {
            // Parent deleted while the node was being staged.
            Err(StoreError::NoNode(parent.to_string()))
        } else {
            Err(e.into())
        }
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        path::validate_path(path)?;
        if path == ROOT {
            self.require_node(path).await?;
            return Ok(Vec::new());
        }

        match fs::read(self.dir_for(path).join(PAYLOAD_FILE)).await {
            Ok(data) => Ok(data),
            Err(e) if is_not_found(&e) => Err(StoreError::NoNode(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, path: &str, data: &[u8]) -> Result<()> {
        path::validate_path(path)?;
        if path == ROOT {
            return Err(StoreError::InvalidPath("the root node has no payload".to_string()));
        }

        let dir = self.require_node(path).await?;
        match Self::write_payload(&dir, data).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => Err(StoreError::NoNode(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        path::validate_path(path)?;
        if path == ROOT {
            return Err(StoreError::InvalidPath("the root node cannot be deleted".to_string()));
        }

        let dir = self.require_node(path).await?;
        match Self::child_names(&dir).await {
            Ok(names) if names.is_empty() => {}
            Ok(_) => return Err(StoreError::NotEmpty(path.to_string())),
            Err(e) if is_not_found(&e) => return Err(StoreError::NoNode(path.to_string())),
            Err(e) => return Err(e.into()),
        }

        let parent = path::parent(path).unwrap_or(ROOT);
        let tombstone = self.dir_for(parent).join(scratch_name("tomb"));
        match fs::rename(&dir, &tombstone).await {
            Ok(()) => {}
            Err(e) if is_not_found(&e) => return Err(StoreError::NoNode(path.to_string())),
            Err(e) => return Err(e.into()),
        }

        // Once renamed away no new child can reach the node, so this listing
        // is final. A child created before the rename puts the node back.
        if !Self::child_names(&tombstone).await?.is_empty() {
            warn!("Node {} gained a child while being deleted, restoring it", path);
            fs::rename(&tombstone, &dir).await?;
            return Err(StoreError::NotEmpty(path.to_string()));
        }

        fs::remove_dir_all(&tombstone).await?;
        Ok(())
    }

    async fn children(&self, path: &str) -> Result<Vec<String>> {
        path::validate_path(path)?;
        let dir = self.require_node(path).await?;
        match Self::child_names(&dir).await {
            Ok(names) => Ok(names),
            Err(e) if is_not_found(&e) => Err(StoreError::NoNode(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        path::validate_path(path)?;
        Self::is_node(&self.dir_for(path)).await
    }
}
