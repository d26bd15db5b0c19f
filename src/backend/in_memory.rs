//! In-process [`Backend`] built on top of [`InMemory`].
//!
//! [`InMemoryConnector`] keeps one store per endpoint. Connecting twice to the same endpoint
//! returns handles over the same store, the same way two connections to a real storage node
//! would see the same data.
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tracing::{event, Level};

use crate::storage_engine::{in_memory::InMemory, StorageEngine};

use super::{Backend, Connector, Error, Result, SharedBackend};

#[derive(Clone, Debug, Default)]
pub struct InMemoryBackend {
    store: InMemory,
}

impl InMemoryBackend {
    pub fn new(store: InMemory) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn set(&self, key: Bytes, value: Bytes) -> Result<()> {
        Ok(self.store.put(key, value).await?)
    }

    async fn get(&self, key: &[u8]) -> Result<Bytes> {
        self.store.get(key).await?.ok_or(Error::NotFound {
            key: String::from_utf8_lossy(key).to_string(),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryConnector {
    stores: Arc<Mutex<HashMap<String, InMemory>>>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the store behind `endpoint` if anything ever connected to it
    pub fn store(&self, endpoint: &str) -> Option<InMemory> {
        self.stores
            .lock()
            .ok()
            .and_then(|guard| guard.get(endpoint).cloned())
    }

    pub(crate) fn backend(&self, endpoint: &str) -> Result<InMemoryBackend> {
        let mut guard = self.stores.lock().map_err(|_| Error::Storage {
            reason: "Unable to acquire lock for InMemoryConnector - poisoned...".to_string(),
        })?;

        let store = guard.entry(endpoint.to_string()).or_default().clone();
        Ok(InMemoryBackend::new(store))
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn connect(&self, endpoint: &str) -> Result<SharedBackend> {
        event!(Level::DEBUG, "connecting to in-memory backend {}", endpoint);
        Ok(Arc::new(self.backend(endpoint)?))
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryConnector;
    use crate::{
        backend::{Connector, Error},
        storage_engine::StorageEngine,
    };
    use bytes::Bytes;

    #[tokio::test]
    async fn test_set_get() {
        let connector = InMemoryConnector::new();
        let backend = connector.connect("node-1").await.unwrap();

        backend
            .set(Bytes::from("foo"), Bytes::from("bar"))
            .await
            .unwrap();
        assert_eq!(backend.get(b"foo").await.unwrap(), Bytes::from("bar"));
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let connector = InMemoryConnector::new();
        let backend = connector.connect("node-1").await.unwrap();

        let err = backend.get(b"foo").await.err().unwrap();
        assert_eq!(
            err,
            Error::NotFound {
                key: "foo".to_string()
            }
        );
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_stores_are_per_endpoint() {
        let connector = InMemoryConnector::new();
        let node_1 = connector.connect("node-1").await.unwrap();
        let node_1_again = connector.connect("node-1").await.unwrap();
        let node_2 = connector.connect("node-2").await.unwrap();

        node_1
            .set(Bytes::from("foo"), Bytes::from("bar"))
            .await
            .unwrap();

        assert_eq!(node_1_again.get(b"foo").await.unwrap(), Bytes::from("bar"));
        assert!(node_2.get(b"foo").await.err().unwrap().is_not_found());

        let store = connector.store("node-1").unwrap();
        assert_eq!(store.get(b"foo").await.unwrap().unwrap(), Bytes::from("bar"));
        assert!(connector.store("node-3").is_none());
    }
}
