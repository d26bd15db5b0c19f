//! [`Backend`] that talks to a ringkv storage node over TCP using a [`DbClient`].
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};
use tracing::{event, instrument, Level};

use crate::client::{db_client::DbClient, error::Error as ClientError, Client};

use super::{Backend, Connector, Error, Result, SharedBackend};

/// Handle to a storage node.
///
/// Every request checks a [`DbClient`] out of `idle` (or connects a new one) and only checks it
/// back in after the whole response was read. A request that fails midway or whose future is
/// dropped takes its connection with it, so a response can never be read by the wrong request.
#[derive(Debug)]
pub struct RemoteBackend {
    endpoint: String,
    idle: Mutex<Option<DbClient>>,
    closed: AtomicBool,
}

impl RemoteBackend {
    fn new(endpoint: String, client: Option<DbClient>) -> Self {
        Self {
            endpoint,
            idle: Mutex::new(client),
            closed: AtomicBool::new(false),
        }
    }

    fn closed_error(&self) -> Error {
        Error::Io {
            reason: format!("connection to {} was closed", self.endpoint),
        }
    }

    fn idle_lock(&self) -> Result<MutexGuard<'_, Option<DbClient>>> {
        self.idle.lock().map_err(|e| Error::Io {
            reason: format!("poisoned connection slot for {}: {}", self.endpoint, e),
        })
    }

    async fn checkout(&self) -> Result<DbClient> {
        if self.closed.load(Ordering::Acquire) {
            return Err(self.closed_error());
        }

        let idle = self.idle_lock()?.take();
        if let Some(client) = idle {
            return Ok(client);
        }

        event!(Level::DEBUG, "Opening a new connection to {}", self.endpoint);
        let mut client = DbClient::new(self.endpoint.clone());
        client.connect().await.map_err(|e| Error::Unreachable {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        Ok(client)
    }

    /// Puts `client` back in the idle slot if the request left the stream in a known state
    fn checkin<T>(&self, client: DbClient, outcome: &std::result::Result<T, ClientError>) {
        let reusable = match outcome {
            Ok(_) | Err(ClientError::Server(_)) => true,
            Err(_) => false,
        };
        if !reusable || self.closed.load(Ordering::Acquire) {
            return;
        }

        if let Ok(mut guard) = self.idle_lock() {
            if guard.is_none() {
                *guard = Some(client);
            }
        }
    }
}

fn to_utf8(what: &str, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        event!(Level::ERROR, "Unable to parse {} as utf8 {}", what, e);
        Error::InvalidEncoding {
            reason: format!("{} is not valid utf8: {}", what, e),
        }
    })
}

#[async_trait]
impl Backend for RemoteBackend {
    async fn set(&self, key: Bytes, value: Bytes) -> Result<()> {
        let key = to_utf8("key", &key)?;
        let value = to_utf8("value", &value)?;

        let mut client = self.checkout().await?;
        let outcome = client.set(key, value).await;
        self.checkin(client, &outcome);
        outcome?;

        Ok(())
    }

    async fn get(&self, key: &[u8]) -> Result<Bytes> {
        let key = to_utf8("key", key)?;

        let mut client = self.checkout().await?;
        let outcome = client.get(key).await;
        self.checkin(client, &outcome);

        Ok(Bytes::from(outcome?.value))
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            event!(Level::DEBUG, "{} was already closed", self.endpoint);
        }
        // dropping the client closes the tcp stream
        self.idle_lock()?.take();
        Ok(())
    }
}

/// Opens one [`RemoteBackend`] per endpoint. A node is only considered reachable
/// if it answers a ping right after the connection is established.
#[derive(Debug, Default)]
pub struct RemoteConnector;

#[async_trait]
impl Connector for RemoteConnector {
    #[instrument(name = "backend::remote::connect", level = "info", skip(self))]
    async fn connect(&self, endpoint: &str) -> Result<SharedBackend> {
        let as_unreachable = |reason: String| Error::Unreachable {
            endpoint: endpoint.to_string(),
            reason,
        };

        let mut client = DbClient::new(endpoint.to_string());
        client
            .connect()
            .await
            .map_err(|e| as_unreachable(e.to_string()))?;
        client.ping().await.map_err(|e| as_unreachable(e.to_string()))?;

        Ok(Arc::new(RemoteBackend::new(
            endpoint.to_string(),
            Some(client),
        )))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::backend::{Backend, Error};

    use super::RemoteBackend;

    // nothing listens on this endpoint: validation has to fail before any connection attempt
    fn disconnected() -> RemoteBackend {
        RemoteBackend::new("127.0.0.1:1".to_string(), None)
    }

    #[tokio::test]
    async fn test_non_utf8_key_or_value_is_rejected() {
        let backend = disconnected();

        let err = backend
            .set(Bytes::from("k"), Bytes::from_static(&[0xff, 0x00]))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidEncoding { .. }));

        let err = backend
            .set(Bytes::from_static(&[0xc3, 0x28]), Bytes::from("v"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidEncoding { .. }));

        let err = backend.get(&[0xff]).await.err().unwrap();
        assert!(matches!(err, Error::InvalidEncoding { .. }));
    }

    #[tokio::test]
    async fn test_closed_handle_does_not_reconnect() {
        let backend = disconnected();
        backend.close().await.unwrap();

        let err = backend.get(b"k").await.err().unwrap();
        assert!(matches!(err, Error::Io { .. }));
    }
}
