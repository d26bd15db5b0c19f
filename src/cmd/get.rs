//! Get [`crate::cmd::StorageNodeCommand`]
//!
//! Reads a key from the local storage engine of a storage node.
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    cmd::CommandId,
    error::{Error, Internal, Result},
    server::message::IntoMessage,
    storage_engine::SharedStorageEngine,
};

use super::json_payload;

#[derive(Debug, Serialize, Deserialize)]
pub struct Get {
    key: String,
}

impl Get {
    pub fn new(key: String) -> Self {
        Self { key }
    }

    /// Executes a [`Get`] command.
    ///
    /// # Errors
    /// [`Error::NotFound`] if the key doesn't exist in this node
    #[instrument(name = "cmd::get", level = "info", skip(storage_engine))]
    pub async fn execute(self, storage_engine: SharedStorageEngine) -> Result<GetResponse> {
        let value = storage_engine
            .get(self.key.as_bytes())
            .await?
            .ok_or(Error::NotFound { key: self.key })?;

        let value = String::from_utf8(value.into()).map_err(|e| {
            Error::Internal(Internal::Logic {
                reason: format!("stored value is not utf8 encoded: {}", e),
            })
        })?;

        Ok(GetResponse { value })
    }

    pub fn cmd_id() -> CommandId {
        CommandId::Get
    }
}

impl IntoMessage for Get {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetResponse {
    pub value: String,
}

impl IntoMessage for Result<GetResponse> {
    fn cmd_id(&self) -> CommandId {
        Get::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}
