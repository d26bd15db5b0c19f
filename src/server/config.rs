use serde::{Deserialize, Serialize};
use tracing::{event, Level};

use crate::error::{Error, Result};

/// Env variable that overrides [`Quorum::replicas`]
pub const REDUNDANCY_ENV: &str = "REDUNDANCY";
/// Env variable that overrides [`Quorum::reads`]
pub const READ_QUORUM_ENV: &str = "READ_QUORUM";
/// Env variable that overrides [`Quorum::writes`]
pub const WRITE_QUORUM_ENV: &str = "WRITE_QUORUM";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    #[serde(flatten)]
    pub cluster_type: ClusterType,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterType {
    /// Holds data in a local storage engine. Serves Ping/Get/Set
    StorageNode(StorageNodeConfig),
    /// Owns the ring and replicates operations to storage nodes
    Router(RouterConfig),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageNodeConfig {
    pub port: u16,
    pub storage_engine: StorageEngine,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageEngine {
    InMemory,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RouterConfig {
    pub port: u16,
    pub backend: BackendKind,
    #[serde(default)]
    pub quorum: Quorum,
}

/// How a router reaches the nodes added to its ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Endpoints are `host:port` addresses of ringkv storage nodes
    Remote,
    /// Endpoints are just names. Every node lives inside the router process
    InMemory,
}

/// Replication settings.
///
/// Only `replicas` drives behavior. `reads` and `writes` are accepted and reported but operations
/// always involve every replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Quorum {
    #[serde(rename = "n")]
    pub replicas: usize,
    #[serde(rename = "r")]
    pub reads: usize,
    #[serde(rename = "w")]
    pub writes: usize,
}

impl Default for Quorum {
    fn default() -> Self {
        Self {
            replicas: 3,
            reads: 2,
            writes: 2,
        }
    }
}

impl Quorum {
    /// Applies [`REDUNDANCY_ENV`], [`READ_QUORUM_ENV`] and [`WRITE_QUORUM_ENV`] on top of `self`
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Same as [`Quorum::with_env_overrides`] but reading variables through `lookup`.
    /// Values that aren't valid numbers are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str, current: usize| -> usize {
            match lookup(name) {
                None => current,
                Some(raw) => match raw.trim().parse::<usize>() {
                    Ok(value) => value,
                    Err(err) => {
                        event!(
                            Level::WARN,
                            "Ignoring invalid value {:?} for {}: {}",
                            raw,
                            name,
                            err
                        );
                        current
                    }
                },
            }
        };

        self.replicas = read(REDUNDANCY_ENV, self.replicas);
        self.reads = read(READ_QUORUM_ENV, self.reads);
        self.writes = read(WRITE_QUORUM_ENV, self.writes);
        self
    }

    /// # Errors
    /// [`Error::InvalidServerConfig`] if `replicas` is 0
    pub fn validate(&self) -> Result<()> {
        if self.replicas == 0 {
            return Err(Error::InvalidServerConfig {
                reason: "quorum.n (replicas) must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
