//! Module that contains the Client API for all public commands implemented by ringkv.
//!
//! Storage node commands ([`Client::get`], [`Client::set`]) are what a router uses to reach its
//! backends. Router commands are what users issue against a router.
use async_trait::async_trait;

use crate::cmd::{
    cluster::{
        add_node::AddNodeResponse, delete_node::DeleteNodeResponse,
        list_nodes::ListNodesResponse, node_count::NodeCountResponse,
        resolve_replicas::ResolveReplicasResponse,
    },
    get::GetResponse,
    get_value::GetValueResponse,
    ping::PingResponse,
    set::SetResponse,
    store_value::StoreValueResponse,
};

pub mod db_client;
pub mod error;

use error::Result;

/// Trait that defines which functions a ringkv client needs to implement
#[async_trait]
pub trait Client {
    /// Starts a TCP connection with a ringkv server
    async fn connect(&mut self) -> Result<()>;
    /// Ping command interface (served by every server)
    async fn ping(&mut self) -> Result<PingResponse>;
    /// Get command interface (storage nodes)
    async fn get(&mut self, key: String) -> Result<GetResponse>;
    /// Set command interface (storage nodes)
    async fn set(&mut self, key: String, value: String) -> Result<SetResponse>;
    /// AddNode command interface (routers)
    async fn add_node(&mut self, endpoint: String) -> Result<AddNodeResponse>;
    /// DeleteNode command interface (routers)
    async fn delete_node(&mut self, node_id: String) -> Result<DeleteNodeResponse>;
    /// NodeCount command interface (routers)
    async fn node_count(&mut self) -> Result<NodeCountResponse>;
    /// ResolveReplicas command interface (routers)
    async fn resolve_replicas(&mut self, key: String) -> Result<ResolveReplicasResponse>;
    /// StoreValue command interface (routers)
    async fn store_value(&mut self, key: String, value: String) -> Result<StoreValueResponse>;
    /// GetValue command interface (routers)
    async fn get_value(&mut self, key: String) -> Result<GetValueResponse>;
    /// ListNodes command interface (routers)
    async fn list_nodes(&mut self) -> Result<ListNodesResponse>;
}
