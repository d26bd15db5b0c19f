//! This module defines client/user visible errors that can be returned by ringkv.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{backend, cluster};

pub type Result<T> = std::result::Result<T, Error>;

/// Error enum with all possible variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Error {
    /// A storage node doesn't have the requested key
    NotFound {
        key: String,
    },
    InvalidRequest(InvalidRequest),
    InvalidServerConfig {
        reason: String,
    },
    Internal(Internal),
    Io {
        reason: String,
    },
    /// AddNode was called with an endpoint whose id is already registered
    NodeAlreadyExists {
        node_id: String,
    },
    /// DeleteNode was called with an unknown id
    NodeDoesNotExist {
        node_id: String,
    },
    /// Unable to connect to the backend of a node being added
    BackendUnreachable {
        endpoint: String,
        reason: String,
    },
    /// A key operation was issued against an empty ring
    NoNodesAvailable,
    /// A replica failed to store a value. Replicas written before the failure are not rolled back
    ReplicaWriteFailed {
        node_id: String,
        cause: backend::Error,
    },
    /// A replica failed to return a value (a missing key counts as a failure)
    ReplicaReadFailed {
        node_id: String,
        cause: backend::Error,
    },
    /// Replicas returned different values for the same key
    ReplicaMismatch {
        expected: String,
        node_id: String,
        got: String,
    },
}

impl Error {
    /// Returns true if this is an instance of a [`Error::NotFound`] variant
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl From<crate::storage_engine::Error> for Error {
    fn from(err: crate::storage_engine::Error) -> Self {
        Self::Internal(Internal::StorageEngine(err))
    }
}

impl From<cluster::error::Error> for Error {
    fn from(err: cluster::error::Error) -> Self {
        use cluster::error::Error as ClusterError;
        match err {
            ClusterError::NodeAlreadyExists { node_id } => Self::NodeAlreadyExists { node_id },
            ClusterError::NodeDoesNotExist { node_id } => Self::NodeDoesNotExist { node_id },
            ClusterError::NoNodesAvailable => Self::NoNodesAvailable,
            ClusterError::Logic { reason } => Self::Internal(Internal::Logic { reason }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Internal {
    Logic { reason: String },
    StorageEngine(crate::storage_engine::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidRequest {
    MaxMessageSizeExceeded { max: u32, got: u32 },
    MessageReceivedWithoutRequestId,
    MessageRequestIdMustBeUtf8Encoded,
    UnableToConstructCommandFromMessage { expected_id: u8, got: u8 },
    InvalidJsonPayload(String),
    EmptyMessagePayload,
    UnrecognizedCommand { id: u8 },
    /// The command exists but isn't served by this kind of server
    CommandNotSupported { id: u8 },
}

#[cfg(test)]
mod tests {
    use super::Error;
    use crate::{backend, cluster};

    #[test]
    fn test_cluster_errors_keep_their_kind() {
        let err: Error = cluster::error::Error::NodeDoesNotExist {
            node_id: "abc".to_string(),
        }
        .into();
        assert_eq!(
            err,
            Error::NodeDoesNotExist {
                node_id: "abc".to_string()
            }
        );

        let err: Error = cluster::error::Error::NoNodesAvailable.into();
        assert_eq!(err, Error::NoNodesAvailable);
    }

    #[test]
    fn test_serde_roundtrip_keeps_cause() {
        let err = Error::ReplicaReadFailed {
            node_id: "abc".to_string(),
            cause: backend::Error::NotFound {
                key: "foo".to_string(),
            },
        };

        let serialized = serde_json::to_string(&err).unwrap();
        let deserialized: Error = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, err);
    }
}
