use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::cluster::hashing::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Error {
    /// The id derived from the endpoint is already part of the ring
    NodeAlreadyExists { node_id: NodeId },
    /// The requested node id is not part of the ring
    NodeDoesNotExist { node_id: NodeId },
    /// A key lookup was attempted against an empty ring
    NoNodesAvailable,
    Logic { reason: String },
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
