//! StoreValue [`crate::cmd::RouterCommand`]
//!
//! Stores a value in every replica of its key. See [`crate::controller::Controller::store_value`].
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    cmd::CommandId, controller::Controller, error::Result, server::message::IntoMessage,
};

use super::json_payload;

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreValue {
    key: String,
    value: String,
}

impl StoreValue {
    pub fn new(key: String, value: String) -> Self {
        Self { key, value }
    }

    #[instrument(name = "cmd::store_value", level = "info", skip(self, controller), fields(key = %self.key))]
    pub async fn execute(self, controller: Arc<Controller>) -> Result<StoreValueResponse> {
        controller
            .store_value(self.key.into(), self.value.into())
            .await?;

        Ok(StoreValueResponse {
            message: "Ok".to_string(),
        })
    }

    pub fn cmd_id() -> CommandId {
        CommandId::StoreValue
    }
}

impl IntoMessage for StoreValue {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreValueResponse {
    pub message: String,
}

impl IntoMessage for Result<StoreValueResponse> {
    fn cmd_id(&self) -> CommandId {
        StoreValue::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}
