//! [`ResolveReplicas`] [`crate::cmd::RouterCommand`]
//!
//! Returns the ids of the nodes holding a key, in replica order. No backend is contacted.
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{
    cluster::hashing::NodeId,
    cmd::{json_payload, CommandId},
    controller::Controller,
    error::Result,
    server::message::IntoMessage,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveReplicas {
    key: String,
}

impl ResolveReplicas {
    pub fn new(key: String) -> Self {
        Self { key }
    }

    pub async fn execute(self, controller: Arc<Controller>) -> Result<ResolveReplicasResponse> {
        Ok(ResolveReplicasResponse {
            node_ids: controller.resolve_replicas(self.key.as_bytes())?,
        })
    }

    pub fn cmd_id() -> CommandId {
        CommandId::ResolveReplicas
    }
}

impl IntoMessage for ResolveReplicas {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolveReplicasResponse {
    pub node_ids: Vec<NodeId>,
}

impl IntoMessage for Result<ResolveReplicasResponse> {
    fn cmd_id(&self) -> CommandId {
        ResolveReplicas::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}
