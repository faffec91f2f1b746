//! Configuration management for helm
//!
//! This module provides the coordinator's configuration: the namespace root
//! it owns inside the store and which store backend to open.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{HelmError, Result};

/// Coordinator configuration
///
/// Loaded from `.helm/config.toml`, or from an explicit file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelmConfig {
    /// Root node under which agents and jobs are kept
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Store backend
    #[serde(default)]
    pub store: StoreConfig,
}

/// Store backend selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process-local tree, lost on exit
    #[default]
    Memory,
    /// Directory tree on the local filesystem
    Fs {
        /// Directory holding the tree
        root: PathBuf,
    },
}

fn default_namespace() -> String {
    "/helm".to_string()
}

impl HelmConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| HelmError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from `.helm/config.toml` or use defaults
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(".helm/config.toml");

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write default configuration to `.helm/config.toml`
    pub fn write_default(dir: &Path) -> Result<()> {
        let config_dir = dir.join(".helm");
        std::fs::create_dir_all(&config_dir)?;

        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| HelmError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(config_dir.join("config.toml"), content)?;
        Ok(())
    }

    /// Check that the namespace is a legal, non-root absolute path
    pub fn validate(&self) -> Result<()> {
        if self.namespace == helm_store::path::ROOT {
            return Err(HelmError::Config(
                "namespace must not be the store root".to_string(),
            ));
        }
        helm_store::path::validate_path(&self.namespace)
            .map_err(|e| HelmError::Config(format!("Invalid namespace: {}", e)))?;
        Ok(())
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }
}

impl Default for HelmConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            store: StoreConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = HelmConfig::default();
        assert_eq!(config.namespace, "/helm");
        assert_eq!(config.store, StoreConfig::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_fs_backend() {
        let config = HelmConfig::from_toml_str(
            r#"
            namespace = "/prod/helm"

            [store]
            backend = "fs"
            root = "/var/lib/helm"
            "#,
        )
        .unwrap();

        assert_eq!(config.namespace, "/prod/helm");
        assert_eq!(
            config.store,
            StoreConfig::Fs {
                root: PathBuf::from("/var/lib/helm")
            }
        );
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        assert_eq!(HelmConfig::from_toml_str("").unwrap(), HelmConfig::default());
    }

    #[test]
    fn test_bad_namespace_rejected() {
        for namespace in ["helm", "/", "/helm/", "/a//b"] {
            let toml = format!("namespace = \"{}\"", namespace);
            assert!(
                matches!(HelmConfig::from_toml_str(&toml), Err(HelmError::Config(_))),
                "{} should be rejected",
                namespace
            );
        }
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = HelmConfig::from_toml_str("[store]\nbackend = \"etcd\"\n");
        assert!(matches!(result, Err(HelmError::Config(_))));
    }

    #[test]
    fn test_write_then_load_default() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            HelmConfig::load_or_default(dir.path()).unwrap(),
            HelmConfig::default()
        );

        HelmConfig::write_default(dir.path()).unwrap();
        assert!(dir.path().join(".helm/config.toml").exists());
        assert_eq!(
            HelmConfig::load_or_default(dir.path()).unwrap(),
            HelmConfig::default()
        );
    }
}
