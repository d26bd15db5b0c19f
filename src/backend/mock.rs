//! Mock [`Connector`] with fault injection, used to exercise the failure paths of the controller.
//!
//! Data is kept in an [`InMemoryConnector`] so tests can both inject faults per endpoint and
//! inspect (or tamper with) what every node stores.
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use super::{
    in_memory::{InMemoryBackend, InMemoryConnector},
    Backend, Connector, Error, Result, SharedBackend,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum When {
    Always,
    #[default]
    Never,
}

/// A fault is an error that is returned based on the [`When`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Fault {
    pub when: When,
}

impl Fault {
    fn check(&self, operation: &str, endpoint: &str) -> Result<()> {
        match self.when {
            When::Always => Err(Error::Injected {
                reason: format!("Mocked error on {} for {}", operation, endpoint),
            }),
            When::Never => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockBackendFaults {
    pub connect: Fault,
    pub set: Fault,
    pub get: Fault,
}

#[derive(Debug, Default)]
pub struct MockStats {
    pub connect: AtomicUsize,
    pub close: AtomicUsize,
}

impl MockStats {
    pub fn n_connects(&self) -> usize {
        self.connect.load(Ordering::SeqCst)
    }

    pub fn n_closes(&self) -> usize {
        self.close.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct MockBackend {
    endpoint: String,
    inner: InMemoryBackend,
    faults: MockBackendFaults,
    stats: Arc<MockStats>,
}

#[async_trait]
impl Backend for MockBackend {
    async fn set(&self, key: Bytes, value: Bytes) -> Result<()> {
        self.faults.set.check("set", &self.endpoint)?;
        self.inner.set(key, value).await
    }

    async fn get(&self, key: &[u8]) -> Result<Bytes> {
        self.faults.get.check("get", &self.endpoint)?;
        self.inner.get(key).await
    }

    async fn close(&self) -> Result<()> {
        self.stats.close.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MockConnector {
    faults: HashMap<String, MockBackendFaults>,
    stores: InMemoryConnector,
    stats: Arc<MockStats>,
}

impl MockConnector {
    /// Direct access to the data held by every endpoint
    pub fn stores(&self) -> &InMemoryConnector {
        &self.stores
    }

    pub fn stats(&self) -> &MockStats {
        &self.stats
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, endpoint: &str) -> Result<SharedBackend> {
        self.stats.connect.fetch_add(1, Ordering::SeqCst);
        let faults = self.faults.get(endpoint).copied().unwrap_or_default();
        faults
            .connect
            .check("connect", endpoint)
            .map_err(|e| Error::Unreachable {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Arc::new(MockBackend {
            endpoint: endpoint.to_string(),
            inner: self.stores.backend(endpoint)?,
            faults,
            stats: self.stats.clone(),
        }))
    }
}

#[derive(Debug, Default)]
pub struct MockConnectorBuilder {
    faults: HashMap<String, MockBackendFaults>,
    stores: InMemoryConnector,
}

impl MockConnectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn faults_mut(&mut self, endpoint: &str) -> &mut MockBackendFaults {
        self.faults.entry(endpoint.to_string()).or_default()
    }

    pub fn with_connection_fault(mut self, endpoint: &str, when: When) -> Self {
        self.faults_mut(endpoint).connect = Fault { when };
        self
    }

    pub fn with_set_fault(mut self, endpoint: &str, when: When) -> Self {
        self.faults_mut(endpoint).set = Fault { when };
        self
    }

    pub fn with_get_fault(mut self, endpoint: &str, when: When) -> Self {
        self.faults_mut(endpoint).get = Fault { when };
        self
    }

    /// Makes the built connector reuse existing stores
    pub fn with_stores(mut self, stores: InMemoryConnector) -> Self {
        self.stores = stores;
        self
    }

    pub fn without_faults(mut self) -> Self {
        self.faults = Default::default();
        self
    }

    pub fn build(self) -> MockConnector {
        MockConnector {
            faults: self.faults,
            stores: self.stores,
            stats: Default::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MockConnectorBuilder, When};
    use crate::backend::{Connector, Error};
    use bytes::Bytes;

    #[tokio::test]
    async fn test_connection_fault() {
        let connector = MockConnectorBuilder::new()
            .with_connection_fault("bad", When::Always)
            .build();

        let err = connector.connect("bad").await.err().unwrap();
        assert!(matches!(err, Error::Unreachable { endpoint, .. } if endpoint == "bad"));
        assert!(connector.connect("good").await.is_ok());
        assert_eq!(connector.stats().n_connects(), 2);
    }

    #[tokio::test]
    async fn test_set_and_get_faults() {
        let connector = MockConnectorBuilder::new()
            .with_set_fault("no-writes", When::Always)
            .with_get_fault("no-reads", When::Always)
            .build();

        let no_writes = connector.connect("no-writes").await.unwrap();
        let err = no_writes
            .set(Bytes::from("k"), Bytes::from("v"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Injected { .. }));

        let no_reads = connector.connect("no-reads").await.unwrap();
        no_reads.set(Bytes::from("k"), Bytes::from("v")).await.unwrap();
        assert!(matches!(
            no_reads.get(b"k").await.err().unwrap(),
            Error::Injected { .. }
        ));
    }

    #[tokio::test]
    async fn test_close_is_counted() {
        let connector = MockConnectorBuilder::new().without_faults().build();
        let backend = connector.connect("node").await.unwrap();
        backend.close().await.unwrap();
        assert_eq!(connector.stats().n_closes(), 1);
    }
}
