//! [`NodeCount`] [`crate::cmd::RouterCommand`]
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{
    cmd::{json_payload, CommandId},
    controller::Controller,
    error::Result,
    server::message::IntoMessage,
};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NodeCount;

impl NodeCount {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(self, controller: Arc<Controller>) -> Result<NodeCountResponse> {
        let count = controller.node_count()?;
        Ok(NodeCountResponse {
            node_count: count.nodes,
            virtual_node_count: count.virtual_nodes,
        })
    }

    pub fn cmd_id() -> CommandId {
        CommandId::NodeCount
    }
}

impl IntoMessage for NodeCount {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }
}

/// Deserialized [`NodeCount`] response payload.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeCountResponse {
    /// Number of nodes in the membership table
    pub node_count: usize,
    /// Number of virtual nodes in the ring. Always `node_count` times the virtual nodes per node
    pub virtual_node_count: usize,
}

impl IntoMessage for Result<NodeCountResponse> {
    fn cmd_id(&self) -> CommandId {
        NodeCount::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}
