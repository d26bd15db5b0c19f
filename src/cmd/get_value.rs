//! GetValue [`crate::cmd::RouterCommand`]
//!
//! Reads a key from all of its replicas. See [`crate::controller::Controller::get_value`].
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    cmd::CommandId, controller::Controller, error::Result, server::message::IntoMessage,
};

use super::json_payload;

#[derive(Debug, Serialize, Deserialize)]
pub struct GetValue {
    key: String,
}

impl GetValue {
    pub fn new(key: String) -> Self {
        Self { key }
    }

    #[instrument(name = "cmd::get_value", level = "info", skip(controller))]
    pub async fn execute(self, controller: Arc<Controller>) -> Result<GetValueResponse> {
        let value = controller.get_value(self.key.into()).await?;

        Ok(GetValueResponse {
            value: String::from_utf8_lossy(&value).to_string(),
        })
    }

    pub fn cmd_id() -> CommandId {
        CommandId::GetValue
    }
}

impl IntoMessage for GetValue {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetValueResponse {
    pub value: String,
}

impl IntoMessage for Result<GetValueResponse> {
    fn cmd_id(&self) -> CommandId {
        GetValue::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}
