//! Ping [`crate::cmd::RouterCommand`] / [`crate::cmd::StorageNodeCommand`]
//!
//! Used by clients and by routers (while adding a node) to check that a server is alive.
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{cmd::CommandId, error::Result, server::message::IntoMessage};

use super::json_payload;

#[derive(Debug, Serialize, Deserialize)]
pub struct Ping;

impl Ping {
    pub async fn execute(self) -> Result<PingResponse> {
        Ok(PingResponse {
            message: "PONG".to_string(),
        })
    }

    pub fn cmd_id() -> CommandId {
        CommandId::Ping
    }
}

impl IntoMessage for Ping {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PingResponse {
    pub message: String,
}

impl IntoMessage for Result<PingResponse> {
    fn cmd_id(&self) -> CommandId {
        Ping::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}
