//! [`DeleteNode`] [`crate::cmd::RouterCommand`]
//!
//! Removes a node from the ring. Returns the endpoint the node was registered with.
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    cluster::hashing::NodeId,
    cmd::{json_payload, CommandId},
    controller::Controller,
    error::Result,
    server::message::IntoMessage,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteNode {
    node_id: NodeId,
}

impl DeleteNode {
    pub fn new(node_id: NodeId) -> Self {
        Self { node_id }
    }

    #[instrument(name = "cmd::cluster::delete_node", level = "info", skip(controller))]
    pub async fn execute(self, controller: Arc<Controller>) -> Result<DeleteNodeResponse> {
        let endpoint = controller.delete_node(&self.node_id).await?;
        Ok(DeleteNodeResponse { endpoint })
    }

    pub fn cmd_id() -> CommandId {
        CommandId::DeleteNode
    }
}

impl IntoMessage for DeleteNode {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteNodeResponse {
    pub endpoint: String,
}

impl IntoMessage for Result<DeleteNodeResponse> {
    fn cmd_id(&self) -> CommandId {
        DeleteNode::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}
