//! Configuration for lexikv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{LexiError, Result};

/// Separator placed between the namespace and the encoded key at the physical layer
pub const NAMESPACE_SEPARATOR: char = '!';

/// Main configuration for a lexikv store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Store identifier. Every physical key is written as
    /// `{namespace}!{encoded key}` so several stores can share one backend.
    pub namespace: String,

    // -------------------------------------------------------------------------
    // Snapshot Backend Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the snapshot backend
    /// Internal structure:
    ///   {data_dir}/
    ///     └── records.snap     (record table snapshot)
    pub data_dir: PathBuf,

    /// Sync strategy: how often the snapshot backend rewrites its file
    pub sync_strategy: SyncStrategy,
}

/// Snapshot sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Rewrite the snapshot after every put/remove (safest, slowest)
    EveryWrite,

    /// Rewrite the snapshot after N unpersisted writes
    EveryNWrites { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: "lexikv".to_string(),
            data_dir: PathBuf::from("./lexikv_data"),
            sync_strategy: SyncStrategy::EveryNWrites { count: 64 },
        }
    }
}

impl Config {
    /// Snapshot file name inside `data_dir`
    pub const SNAPSHOT_FILENAME: &'static str = "records.snap";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Full path of the snapshot file
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(Self::SNAPSHOT_FILENAME)
    }

    /// Physical key prefix for this store (`{namespace}!`)
    pub fn key_prefix(&self) -> String {
        format!("{}{}", self.namespace, NAMESPACE_SEPARATOR)
    }

    /// Check the configuration before a store is built from it
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(LexiError::Config("namespace cannot be empty".to_string()));
        }
        if self.namespace.contains(NAMESPACE_SEPARATOR) {
            return Err(LexiError::Config(format!(
                "namespace {:?} cannot contain '{}'",
                self.namespace, NAMESPACE_SEPARATOR
            )));
        }
        if let SyncStrategy::EveryNWrites { count: 0 } = self.sync_strategy {
            return Err(LexiError::Config(
                "EveryNWrites count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the store namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Set the data directory (root for the snapshot backend)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the snapshot sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
