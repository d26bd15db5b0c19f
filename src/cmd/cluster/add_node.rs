//! [`AddNode`] [`crate::cmd::RouterCommand`]
//!
//! Connects the router to a new storage node and adds it to the ring
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
pub struct AddNode {
    endpoint: String,
}

impl AddNode {
    pub fn new(endpoint: String) -> Self {
        Self { endpoint }
    }

    /// Executes an [`AddNode`] command.
    ///
    /// # Errors
    /// See [`Controller::add_node`]
    #[instrument(name = "cmd::cluster::add_node", level = "info", skip(controller))]
    pub async fn execute(self, controller: Arc<Controller>) -> Result<AddNodeResponse> {
        let node_id = controller.add_node(self.endpoint).await?;
        Ok(AddNodeResponse { node_id })
    }

    pub fn cmd_id() -> CommandId {
        CommandId::AddNode
    }
}

impl IntoMessage for AddNode {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}

/// Deserialized [`AddNode`] response payload.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddNodeResponse {
    pub node_id: NodeId,
}

impl IntoMessage for Result<AddNodeResponse> {
    fn cmd_id(&self) -> CommandId {
        AddNode::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}
