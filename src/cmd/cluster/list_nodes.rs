//! [`ListNodes`] [`crate::cmd::RouterCommand`]
//!
//! Returns every node currently in the membership table
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{
    cluster::membership::NodeInfo,
    cmd::{json_payload, CommandId},
    controller::Controller,
    error::Result,
    server::message::IntoMessage,
};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ListNodes;

impl ListNodes {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(self, controller: Arc<Controller>) -> Result<ListNodesResponse> {
        Ok(ListNodesResponse {
            nodes: controller.list_nodes()?,
        })
    }

    pub fn cmd_id() -> CommandId {
        CommandId::ListNodes
    }
}

impl IntoMessage for ListNodes {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }
}

/// Deserialized [`ListNodes`] response payload. Nodes are sorted by id.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListNodesResponse {
    pub nodes: Vec<NodeInfo>,
}

impl IntoMessage for Result<ListNodesResponse> {
    fn cmd_id(&self) -> CommandId {
        ListNodes::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}
