//! A concrete [`Client`] implementation for ringkv
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::cmd;
use crate::cmd::cluster::{
    add_node::AddNodeResponse, delete_node::DeleteNodeResponse, list_nodes::ListNodesResponse,
    node_count::NodeCountResponse, resolve_replicas::ResolveReplicasResponse,
};
use crate::cmd::{
    get::GetResponse, get_value::GetValueResponse, ping::PingResponse, set::SetResponse,
    store_value::StoreValueResponse,
};
use crate::server::message::{IntoMessage, Message};

use super::error::{Error, Result};
use super::Client;

/// DbClient handle
#[derive(Debug)]
pub struct DbClient {
    /// state stores the [`DbClientState`] of this implementation
    state: DbClientState,
}

/// A [`DbClient`] can either be Connected or Disconnected
#[derive(Debug)]
enum DbClientState {
    Disconnected { addr: String },
    Connected { connection: TcpStream },
}

impl DbClient {
    pub fn new(addr: String) -> Self {
        Self {
            state: DbClientState::Disconnected { addr },
        }
    }

    fn get_conn_mut(&mut self) -> Result<&mut TcpStream> {
        match &mut self.state {
            DbClientState::Connected { connection } => Ok(connection),
            DbClientState::Disconnected { .. } => Err(Error::Logic {
                reason: "You must call `connect` before any other method for DbClient".to_string(),
            }),
        }
    }

    /// Sends `cmd` and waits for its response.
    ///
    /// Responses carry a json encoded `Result`. Errors returned by the server are
    /// surfaced as [`Error::Server`].
    async fn request<C, T>(&mut self, cmd: C) -> Result<T>
    where
        C: IntoMessage,
        T: DeserializeOwned,
    {
        let req = Message::from(cmd).serialize();

        let conn = self.get_conn_mut()?;
        conn.write_all(&req).await?;

        let response = Message::try_from_async_read(conn).await?;
        let payload = response.payload.ok_or(Error::InvalidServerResponse {
            reason: format!("response to {} has no payload", response.cmd_id),
        })?;

        let result: std::result::Result<T, crate::error::Error> =
            serde_json::from_slice(&payload)?;
        result.map_err(Error::Server)
    }
}

#[async_trait]
impl Client for DbClient {
    async fn connect(&mut self) -> Result<()> {
        match &self.state {
            DbClientState::Disconnected { addr } => {
                let connection =
                    TcpStream::connect(addr)
                        .await
                        .map_err(|e| Error::UnableToConnect {
                            reason: format!("{}: {}", addr, e),
                        })?;
                self.state = DbClientState::Connected { connection };
            }
            DbClientState::Connected { .. } => {
                return Err(Error::Logic {
                    reason: "called `connect` twice on a DbClient".to_string(),
                });
            }
        }

        Ok(())
    }

    async fn ping(&mut self) -> Result<PingResponse> {
        self.request(cmd::ping::Ping).await
    }

    async fn get(&mut self, key: String) -> Result<GetResponse> {
        self.request(cmd::get::Get::new(key)).await
    }

    async fn set(&mut self, key: String, value: String) -> Result<SetResponse> {
        self.request(cmd::set::Set::new(key, value)).await
    }

    async fn add_node(&mut self, endpoint: String) -> Result<AddNodeResponse> {
        self.request(cmd::cluster::add_node::AddNode::new(endpoint))
            .await
    }

    async fn delete_node(&mut self, node_id: String) -> Result<DeleteNodeResponse> {
        self.request(cmd::cluster::delete_node::DeleteNode::new(node_id))
            .await
    }

    async fn node_count(&mut self) -> Result<NodeCountResponse> {
        self.request(cmd::cluster::node_count::NodeCount::new())
            .await
    }

    async fn resolve_replicas(&mut self, key: String) -> Result<ResolveReplicasResponse> {
        self.request(cmd::cluster::resolve_replicas::ResolveReplicas::new(key))
            .await
    }

    async fn store_value(&mut self, key: String, value: String) -> Result<StoreValueResponse> {
        self.request(cmd::store_value::StoreValue::new(key, value))
            .await
    }

    async fn get_value(&mut self, key: String) -> Result<GetValueResponse> {
        self.request(cmd::get_value::GetValue::new(key)).await
    }

    async fn list_nodes(&mut self) -> Result<ListNodesResponse> {
        self.request(cmd::cluster::list_nodes::ListNodes::new())
            .await
    }
}
