//! This trait represents the interface for the storage engine owned by a storage node.
//! Keys and values are opaque bytes and are not interpreted in any way by StorageEngine implementations
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};

pub mod in_memory;

#[async_trait]
pub trait StorageEngine: Debug {
    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>>;
    async fn put(&self, key: Bytes, value: Bytes) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Error {
    Logic { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Storage engine handle shared by every connection of a storage node
pub type SharedStorageEngine = Arc<dyn StorageEngine + Send + Sync + 'static>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}
