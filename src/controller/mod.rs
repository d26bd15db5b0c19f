//! Module that contains the [`Controller`]: the replicated operation layer sitting on top of the
//! cluster [`State`].
//!
//! Node management (`add_node`/`delete_node`) mutates the ring and the membership table as one unit.
//! Key operations resolve the replica set for the key and then fan out to the backend of every
//! replica concurrently.
//!
//! # Store
//! Every replica must accept the write. The first failure observed aborts the operation with
//! [`Error::ReplicaWriteFailed`]. Writes that already succeeded are NOT rolled back.
//!
//! # Retrieve
//! Every replica must return the same value (all-agree read). A failure on any replica, including a
//! missing key, aborts the read with [`Error::ReplicaReadFailed`]. Divergent values are reported as
//! [`Error::ReplicaMismatch`]. No read repair is attempted.
//!
//! The read/write quorum thresholds from the configuration are not consulted by any of this.
use bytes::Bytes;
use futures::{stream::FuturesUnordered, StreamExt};
use tracing::{event, instrument, Level};

use crate::{
    backend::{SharedBackend, SharedConnector},
    cluster::{
        hashing::{node_id, NodeId},
        membership::NodeInfo,
        partitioning::consistent_hashing::ConsistentHashing,
        state::{NodeCount, Replica, State as ClusterState},
    },
    error::{Error, Internal, Result},
    server::config::Quorum,
};

pub struct Controller {
    /// Cluster topology: ring + membership table
    cluster_state: ClusterState,
    /// Used to establish backend handles for new nodes
    connector: SharedConnector,
    quorum_config: Quorum,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("cluster_state", &self.cluster_state)
            .field("quorum_config", &self.quorum_config)
            .finish()
    }
}

impl Controller {
    /// Returns a new [`Controller`] with an empty [`ConsistentHashing`] ring.
    ///
    /// # Errors
    /// [`Error::InvalidServerConfig`] if the replication factor is 0
    pub fn new(connector: SharedConnector, quorum_config: Quorum) -> Result<Self> {
        Self::new_with_cluster_state(
            connector,
            quorum_config,
            ClusterState::new(Box::<ConsistentHashing>::default()),
        )
    }

    pub fn new_with_cluster_state(
        connector: SharedConnector,
        quorum_config: Quorum,
        cluster_state: ClusterState,
    ) -> Result<Self> {
        quorum_config.validate()?;
        Ok(Self {
            cluster_state,
            connector,
            quorum_config,
        })
    }

    /// Connects to the backend at `endpoint` and registers it in the ring.
    ///
    /// # Errors
    ///  1. [`Error::BackendUnreachable`] if the connection fails
    ///  2. [`Error::NodeAlreadyExists`] if the id derived from `endpoint` is already registered.
    ///    The freshly created backend handle is closed in that case.
    #[instrument(name = "controller::add_node", level = "info", skip(self))]
    pub async fn add_node(&self, endpoint: String) -> Result<NodeId> {
        let backend = self
            .connector
            .connect(&endpoint)
            .await
            .map_err(|e| Error::BackendUnreachable {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let node_id = node_id(endpoint.as_bytes());
        event!(Level::INFO, "Derived node id {} for {}", node_id, endpoint);

        if let Err(err) =
            self.cluster_state
                .add_node(node_id.clone(), endpoint.clone(), backend.clone())
        {
            release(&node_id, &backend).await;
            return Err(err.into());
        }

        Ok(node_id)
    }

    /// Removes `node_id` from the ring, releases its backend and returns the endpoint it was registered with.
    ///
    /// # Errors
    /// [`Error::NodeDoesNotExist`] if `node_id` isn't registered
    #[instrument(name = "controller::delete_node", level = "info", skip(self))]
    pub async fn delete_node(&self, node_id: &str) -> Result<String> {
        let member = self.cluster_state.remove_node(node_id)?;
        release(node_id, &member.backend).await;

        Ok(member.endpoint)
    }

    pub fn node_count(&self) -> Result<NodeCount> {
        Ok(self.cluster_state.node_count()?)
    }

    pub fn list_nodes(&self) -> Result<Vec<NodeInfo>> {
        Ok(self.cluster_state.nodes()?)
    }

    /// Returns the ids of the nodes that hold `key`, in replica order.
    ///
    /// # Errors
    /// [`Error::NoNodesAvailable`] if the ring is empty
    pub fn resolve_replicas(&self, key: &[u8]) -> Result<Vec<NodeId>> {
        Ok(self
            .cluster_state
            .preference_list(key, self.quorum_config.replicas)?)
    }

    fn replicas(&self, key: &[u8]) -> Result<Vec<Replica>> {
        Ok(self
            .cluster_state
            .replicas(key, self.quorum_config.replicas)?)
    }

    /// Stores `value` in every replica of `key`.
    #[instrument(name = "controller::store_value", level = "info", skip(self, value))]
    pub async fn store_value(&self, key: Bytes, value: Bytes) -> Result<()> {
        let replicas = self.replicas(&key)?;
        event!(
            Level::DEBUG,
            "store_value replicas: {:?}",
            replicas.iter().map(|r| &r.node_id).collect::<Vec<_>>()
        );

        let mut futures: FuturesUnordered<_> = replicas
            .into_iter()
            .map(|replica| {
                let key = key.clone();
                let value = value.clone();
                async move {
                    let res = replica.backend.set(key, value).await;
                    (replica.node_id, res)
                }
            })
            .collect();

        // returning drops every call still in flight
        while let Some((node_id, res)) = futures.next().await {
            if let Err(cause) = res {
                event!(
                    Level::WARN,
                    "Failed to store key {:?} on node {}: {}",
                    key,
                    node_id,
                    cause
                );
                return Err(Error::ReplicaWriteFailed { node_id, cause });
            }
        }

        Ok(())
    }

    /// Reads `key` from every replica and returns the value they all agree on.
    #[instrument(name = "controller::get_value", level = "info", skip(self))]
    pub async fn get_value(&self, key: Bytes) -> Result<Bytes> {
        let replicas = self.replicas(&key)?;
        let node_ids: Vec<NodeId> = replicas.iter().map(|r| r.node_id.clone()).collect();
        event!(Level::DEBUG, "get_value replicas: {:?}", node_ids);

        let mut futures: FuturesUnordered<_> = replicas
            .into_iter()
            .enumerate()
            .map(|(index, replica)| {
                let key = key.clone();
                async move { (index, replica.backend.get(&key).await) }
            })
            .collect();

        let mut values: Vec<Option<Bytes>> = vec![None; node_ids.len()];
        while let Some((index, res)) = futures.next().await {
            match res {
                Ok(value) => values[index] = Some(value),
                Err(cause) => {
                    event!(
                        Level::WARN,
                        "Failed to read key {:?} from node {}: {}",
                        key,
                        node_ids[index],
                        cause
                    );
                    return Err(Error::ReplicaReadFailed {
                        node_id: node_ids[index].clone(),
                        cause,
                    });
                }
            }
        }

        let values = values
            .into_iter()
            .collect::<Option<Vec<Bytes>>>()
            .ok_or_else(|| {
                Error::Internal(Internal::Logic {
                    reason: "a replica read finished without a value".to_string(),
                })
            })?;

        agreed_value(&node_ids, values)
    }
}

/// Compares every value against the first replica's value, in replica order
fn agreed_value(node_ids: &[NodeId], values: Vec<Bytes>) -> Result<Bytes> {
    let mut values = values.into_iter();
    let expected = values.next().ok_or_else(|| {
        Error::Internal(Internal::Logic {
            reason: "empty replica set".to_string(),
        })
    })?;

    for (node_id, got) in node_ids.iter().skip(1).zip(values) {
        if got != expected {
            event!(
                Level::WARN,
                "Replica {} diverges from {}",
                node_id,
                node_ids[0]
            );
            return Err(Error::ReplicaMismatch {
                expected: String::from_utf8_lossy(&expected).to_string(),
                node_id: node_id.clone(),
                got: String::from_utf8_lossy(&got).to_string(),
            });
        }
    }

    Ok(expected)
}

/// Closes a backend handle that is no longer referenced by the ring
async fn release(node_id: &str, backend: &SharedBackend) {
    if let Err(err) = backend.close().await {
        event!(
            Level::WARN,
            "Unable to close backend for node {}: {}",
            node_id,
            err
        );
    }
}
