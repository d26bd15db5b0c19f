//! Module that contains all commands implemented by ringkv.
//!
//! # Design principals
//! Commands have 2 responsibilities:
//!  1. Parse request params (basically serde_json calls)
//!  2. Construct responses that are sent back to callers
//!
//! Everything else should be delegated to the [`crate::controller`] or [`crate::storage_engine`] layers.
//!
//! Commands are split by the kind of server that serves them: [`StorageNodeCommand`]s are issued
//! against storage nodes (usually by a router fanning out a replicated operation) and
//! [`RouterCommand`]s are issued by users against a router.
pub mod cluster;
pub mod get;
pub mod get_value;
pub mod ping;
pub mod set;
pub mod store_value;

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use strum_macros::{Display, FromRepr};
use tracing::{event, instrument, Level};

use cluster::add_node::AddNode as AddNodeCommand;
use cluster::delete_node::DeleteNode as DeleteNodeCommand;
use cluster::list_nodes::ListNodes as ListNodesCommand;
use cluster::node_count::NodeCount as NodeCountCommand;
use cluster::resolve_replicas::ResolveReplicas as ResolveReplicasCommand;
use get::Get as GetCommand;
use get_value::GetValue as GetValueCommand;
use ping::Ping as PingCommand;
use set::Set as SetCommand;
use store_value::StoreValue as StoreValueCommand;

use crate::{
    controller::Controller,
    error::{Error, InvalidRequest, Result},
    server::message::{IntoMessage, Message},
    storage_engine::SharedStorageEngine,
};

/// Command ids used to figure out the layout of the payload to be parsed from a [`Message`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Display)]
#[repr(u8)]
pub enum CommandId {
    Ping = 1,
    Get = 2,
    Set = 3,

    AddNode = 10,
    DeleteNode = 11,
    NodeCount = 12,
    ResolveReplicas = 13,
    StoreValue = 14,
    GetValue = 15,
    ListNodes = 16,
}

impl TryFrom<u8> for CommandId {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        CommandId::from_repr(id)
            .ok_or(Error::InvalidRequest(InvalidRequest::UnrecognizedCommand { id }))
    }
}

/// Serializes a command (or a command response) as the json payload of a [`Message`]
pub(crate) fn json_payload<T: Serialize>(v: &T) -> Option<Bytes> {
    match serde_json::to_vec(v) {
        Ok(payload) => Some(Bytes::from(payload)),
        Err(err) => {
            event!(Level::ERROR, "Unable to serialize payload: {}", err);
            None
        }
    }
}

/// Message sent back when a request can't even be turned into a command
struct ErrorResponse {
    cmd_id: CommandId,
    err: Error,
}

impl IntoMessage for ErrorResponse {
    fn cmd_id(&self) -> CommandId {
        self.cmd_id
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(&Result::<()>::Err(self.err.clone()))
    }
}

/// Builds the response [`Message`] for a request that failed before reaching any command
pub fn error_response(cmd_id: CommandId, err: Error) -> Message {
    ErrorResponse { cmd_id, err }.into()
}

/// macro that tries to construct a specific command from a [`Message`]
macro_rules! try_from_message_with_payload {
    ($message:expr, $t:ident) => {{
        (|| {
            if $message.cmd_id != $t::cmd_id() {
                return Err(Error::InvalidRequest(
                    InvalidRequest::UnableToConstructCommandFromMessage {
                        expected_id: $t::cmd_id() as u8,
                        got: $message.cmd_id as u8,
                    },
                ));
            }

            if let Some(payload) = $message.payload {
                let s: $t = serde_json::from_slice(&payload).map_err(|e| {
                    Error::InvalidRequest(InvalidRequest::InvalidJsonPayload(e.to_string()))
                })?;
                Ok(s)
            } else {
                return Err(Error::InvalidRequest(InvalidRequest::EmptyMessagePayload));
            }
        })()
    }};
}

/// Commands served by storage nodes
#[derive(Debug)]
pub enum StorageNodeCommand {
    Ping(PingCommand),
    Get(GetCommand),
    Set(SetCommand),
}

impl StorageNodeCommand {
    /// Executes a given command against the node's [`crate::storage_engine::StorageEngine`]
    #[instrument(name = "cmd::storage_node::execute", level = "info", skip(storage_engine))]
    pub async fn execute(self, storage_engine: SharedStorageEngine) -> Message {
        match self {
            StorageNodeCommand::Ping(cmd) => cmd.execute().await.into(),
            StorageNodeCommand::Get(cmd) => cmd.execute(storage_engine).await.into(),
            StorageNodeCommand::Set(cmd) => cmd.execute(storage_engine).await.into(),
        }
    }

    /// Tries to construct a [`StorageNodeCommand`] from the provided [`Message`]
    ///
    /// # Errors
    ///  1. [`InvalidRequest::CommandNotSupported`] if the command is only served by routers
    ///  2. Any error returned while parsing the payload
    #[instrument(level = "info")]
    pub fn try_from_message(message: Message) -> Result<Self> {
        match message.cmd_id {
            CommandId::Ping => Ok(StorageNodeCommand::Ping(PingCommand)),
            CommandId::Get => Ok(StorageNodeCommand::Get(try_from_message_with_payload!(
                message, GetCommand
            )?)),
            CommandId::Set => Ok(StorageNodeCommand::Set(try_from_message_with_payload!(
                message, SetCommand
            )?)),
            other => {
                event!(Level::WARN, "Command not supported by storage nodes: {}", other);
                Err(Error::InvalidRequest(InvalidRequest::CommandNotSupported {
                    id: other as u8,
                }))
            }
        }
    }
}

/// Commands served by routers
#[derive(Debug)]
pub enum RouterCommand {
    Ping(PingCommand),
    AddNode(AddNodeCommand),
    DeleteNode(DeleteNodeCommand),
    NodeCount(NodeCountCommand),
    ResolveReplicas(ResolveReplicasCommand),
    StoreValue(StoreValueCommand),
    GetValue(GetValueCommand),
    ListNodes(ListNodesCommand),
}

impl RouterCommand {
    /// Executes a given command by forwarding the [`Controller`] instance provided
    #[instrument(name = "cmd::router::execute", level = "info", skip(controller))]
    pub async fn execute(self, controller: Arc<Controller>) -> Message {
        match self {
            RouterCommand::Ping(cmd) => cmd.execute().await.into(),
            RouterCommand::AddNode(cmd) => cmd.execute(controller).await.into(),
            RouterCommand::DeleteNode(cmd) => cmd.execute(controller).await.into(),
            RouterCommand::NodeCount(cmd) => cmd.execute(controller).await.into(),
            RouterCommand::ResolveReplicas(cmd) => cmd.execute(controller).await.into(),
            RouterCommand::StoreValue(cmd) => cmd.execute(controller).await.into(),
            RouterCommand::GetValue(cmd) => cmd.execute(controller).await.into(),
            RouterCommand::ListNodes(cmd) => cmd.execute(controller).await.into(),
        }
    }

    /// Tries to construct a [`RouterCommand`] from the provided [`Message`]
    ///
    /// # Errors
    ///  1. [`InvalidRequest::CommandNotSupported`] if the command is only served by storage nodes
    ///  2. Any error returned while parsing the payload
    #[instrument(level = "info")]
    pub fn try_from_message(message: Message) -> Result<Self> {
        match message.cmd_id {
            CommandId::Ping => Ok(RouterCommand::Ping(PingCommand)),
            CommandId::AddNode => Ok(RouterCommand::AddNode(try_from_message_with_payload!(
                message,
                AddNodeCommand
            )?)),
            CommandId::DeleteNode => Ok(RouterCommand::DeleteNode(
                try_from_message_with_payload!(message, DeleteNodeCommand)?,
            )),
            CommandId::NodeCount => Ok(RouterCommand::NodeCount(NodeCountCommand)),
            CommandId::ResolveReplicas => Ok(RouterCommand::ResolveReplicas(
                try_from_message_with_payload!(message, ResolveReplicasCommand)?,
            )),
            CommandId::StoreValue => Ok(RouterCommand::StoreValue(
                try_from_message_with_payload!(message, StoreValueCommand)?,
            )),
            CommandId::GetValue => Ok(RouterCommand::GetValue(try_from_message_with_payload!(
                message,
                GetValueCommand
            )?)),
            CommandId::ListNodes => Ok(RouterCommand::ListNodes(ListNodesCommand)),
            other => {
                event!(Level::WARN, "Command not supported by routers: {}", other);
                Err(Error::InvalidRequest(InvalidRequest::CommandNotSupported {
                    id: other as u8,
                }))
            }
        }
    }
}
