//! Set [`crate::cmd::StorageNodeCommand`]
//!
//! Stores a key in the local storage engine of a storage node, overriding any previous value.
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    cmd::CommandId, error::Result, server::message::IntoMessage,
    storage_engine::SharedStorageEngine,
};

use super::json_payload;

#[derive(Debug, Serialize, Deserialize)]
pub struct Set {
    key: String,
    value: String,
}

impl Set {
    pub fn new(key: String, value: String) -> Self {
        Self { key, value }
    }

    #[instrument(name = "cmd::set", level = "info", skip(self, storage_engine), fields(key = %self.key))]
    pub async fn execute(self, storage_engine: SharedStorageEngine) -> Result<SetResponse> {
        storage_engine
            .put(self.key.into(), self.value.into())
            .await?;

        Ok(SetResponse {
            message: "Ok".to_string(),
        })
    }

    pub fn cmd_id() -> CommandId {
        CommandId::Set
    }
}

impl IntoMessage for Set {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetResponse {
    pub message: String,
}

impl IntoMessage for Result<SetResponse> {
    fn cmd_id(&self) -> CommandId {
        Set::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}
