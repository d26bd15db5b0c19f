//! This file contains the TCP listener implementation
//!  - It accepts tcp connections
//!  - tries to parse a [`Message`] out of the connection
//!  - tries to construct a command out of the parsed Message
//!  - executes the command
//!  - writes the response back to the client
//!
//! A server runs in one of two modes (see [`config::ClusterType`]): storage node or router.
use crate::backend::{
    in_memory::InMemoryConnector, remote::RemoteConnector, SharedConnector,
};
use crate::cmd::{error_response, RouterCommand, StorageNodeCommand};
use crate::controller::Controller;
use crate::error::Error;
use crate::storage_engine::{in_memory::InMemory, SharedStorageEngine};
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
};
use tracing::{event, instrument, Level};

use self::config::{BackendKind, ClusterType, Config, RouterConfig, StorageNodeConfig};
use self::message::Message;

pub mod config;
pub mod message;

tokio::task_local! {
    /// Id of the request being handled by the current task
    pub static REQUEST_ID: String;
}

pub struct Server {
    client_listener: TcpListener,
    handler: Handler,
}

/// What requests are executed against
#[derive(Clone, Debug)]
enum Handler {
    StorageNode(SharedStorageEngine),
    Router(Arc<Controller>),
}

impl Handler {
    async fn handle(&self, request: Message) -> Message {
        let cmd_id = request.cmd_id;
        match self {
            Handler::StorageNode(storage_engine) => {
                match StorageNodeCommand::try_from_message(request) {
                    Ok(cmd) => cmd.execute(storage_engine.clone()).await,
                    Err(err) => error_response(cmd_id, err),
                }
            }
            Handler::Router(controller) => match RouterCommand::try_from_message(request) {
                Ok(cmd) => cmd.execute(controller.clone()).await,
                Err(err) => error_response(cmd_id, err),
            },
        }
    }
}

impl Server {
    pub async fn from_config(path: PathBuf) -> anyhow::Result<Self> {
        let c = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&c)?;

        Self::new(config).await
    }

    pub async fn new(config: Config) -> anyhow::Result<Self> {
        match config.cluster_type {
            ClusterType::StorageNode(StorageNodeConfig {
                port,
                storage_engine,
            }) => {
                let client_listener = TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

                let storage_engine: SharedStorageEngine = match storage_engine {
                    config::StorageEngine::InMemory => Arc::new(InMemory::default()),
                };

                Ok(Self {
                    client_listener,
                    handler: Handler::StorageNode(storage_engine),
                })
            }

            ClusterType::Router(RouterConfig {
                port,
                backend,
                quorum,
            }) => {
                let client_listener = TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

                let quorum = quorum.with_env_overrides();
                event!(
                    Level::INFO,
                    "Router quorum config: n={} r={} w={} (only n is used)",
                    quorum.replicas,
                    quorum.reads,
                    quorum.writes
                );

                let connector: SharedConnector = match backend {
                    BackendKind::Remote => Arc::new(RemoteConnector),
                    BackendKind::InMemory => Arc::new(InMemoryConnector::new()),
                };

                Ok(Self {
                    client_listener,
                    handler: Handler::Router(Arc::new(Controller::new(connector, quorum)?)),
                })
            }
        }
    }

    /// Address the server is listening on. Useful when the config asks for port 0
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.client_listener.local_addr()?)
    }

    /// Accepts connections until `shutdown` resolves
    pub async fn run<F: Future>(&mut self, shutdown: F) -> anyhow::Result<()> {
        event!(Level::INFO, "Listener started on {:?}", self.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.client_listener.accept() => {
                    match accepted {
                        Ok((tcp_stream, _)) => {
                            let handler = self.handler.clone();
                            tokio::spawn(async move {
                                if let Err(err) = handle_connection(tcp_stream, handler).await {
                                    event!(Level::WARN, "Connection terminated with error: {}", err);
                                }
                            });
                        }
                        Err(err) => {
                            event!(Level::ERROR, "Unable to accept connection: {}", err);
                        }
                    }
                }
                _ = &mut shutdown => {
                    event!(Level::INFO, "Shutting down listener");
                    return Ok(());
                }
            }
        }
    }
}

/// Serves requests from a single connection, one at a time, until the peer disconnects.
///
/// Frames that can't be parsed terminate the connection since the stream can't be trusted
/// after that point.
#[instrument(level = "debug", skip(handler))]
async fn handle_connection(mut tcp_stream: TcpStream, handler: Handler) -> anyhow::Result<()> {
    loop {
        let request = match Message::try_from_async_read(&mut tcp_stream).await {
            Ok(request) => request,
            Err(Error::Io { reason }) => {
                event!(Level::DEBUG, "Connection closed: {}", reason);
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let request_id = request.request_id.clone();
        let response = REQUEST_ID
            .scope(request_id, handler.handle(request))
            .await
            .serialize();

        tcp_stream.write_all(&response).await?;
    }
}
