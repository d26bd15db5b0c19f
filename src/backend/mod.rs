//! The storage-backend capability consumed by the [`crate::controller::Controller`].
//!
//! A [`Connector`] turns a node endpoint into a [`Backend`] handle. Handles are shared
//! between concurrent requests, so every method takes `&self`.
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};

pub mod in_memory;
pub mod mock;
pub mod remote;

#[async_trait]
pub trait Backend: Debug + Send + Sync {
    /// Stores `value` under `key`, overriding any previous value
    async fn set(&self, key: Bytes, value: Bytes) -> Result<()>;
    /// Returns the value stored under `key` or [`Error::NotFound`]
    async fn get(&self, key: &[u8]) -> Result<Bytes>;
    /// Releases whatever resources the handle holds. The handle must not be used afterwards.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

pub type SharedBackend = Arc<dyn Backend>;

/// Factory that establishes [`Backend`] handles
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<SharedBackend>;
}

pub type SharedConnector = Arc<dyn Connector>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Error {
    /// Unable to establish a handle for the given endpoint
    Unreachable { endpoint: String, reason: String },
    /// The key doesn't exist in the backend
    NotFound { key: String },
    Io { reason: String },
    Storage { reason: String },
    /// Keys and values must be valid utf8 to be sent to a remote node
    InvalidEncoding { reason: String },
    /// The remote node answered with an error
    Remote { reason: String },
    /// Error produced by [`mock::MockConnector`] faults
    Injected { reason: String },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

impl From<crate::storage_engine::Error> for Error {
    fn from(err: crate::storage_engine::Error) -> Self {
        Self::Storage {
            reason: err.to_string(),
        }
    }
}

impl From<crate::client::error::Error> for Error {
    fn from(err: crate::client::error::Error) -> Self {
        use crate::client::error::Error as ClientError;
        match err {
            ClientError::Server(crate::error::Error::NotFound { key }) => Self::NotFound { key },
            ClientError::Io { reason } => Self::Io { reason },
            _ => Self::Remote {
                reason: err.to_string(),
            },
        }
    }
}
