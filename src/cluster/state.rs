//! This file contains the [`State`] data structure.
//! This structure holds the cluster topology at any given time: the [`Membership`] table and
//! the [`PartitioningScheme`] provided during construction.
//!
//! Both live behind a single [`RwLock`]. Adding or removing a node takes the write lock for the
//! entire mutation so readers never see virtual nodes whose owner is missing from the membership
//! table (or a node with only part of its virtual nodes). Lookups share the read lock.
//!
//! Backend handles are cloned out of the lock. No I/O ever happens while holding it.
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::backend::SharedBackend;

use super::{
    error::{Error, Result},
    hashing::NodeId,
    membership::{Member, Membership, NodeInfo},
    partitioning::PartitioningScheme,
};

/// Sizes of the cluster at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCount {
    pub nodes: usize,
    pub virtual_nodes: usize,
}

/// A node picked to hold a replica of a key
#[derive(Debug, Clone)]
pub struct Replica {
    pub node_id: NodeId,
    pub backend: SharedBackend,
}

#[derive(Clone)]
pub struct State {
    inner: Arc<RwLock<StateInner>>,
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_read() {
            Ok(inner) => {
                write!(f, "State: {:?}", inner)
            }
            Err(_) => {
                write!(f, "Unable to acquire lock for logging at this time...")
            }
        }
    }
}

struct StateInner {
    // Which nodes are part of the ring
    membership: Membership,
    // Partitioning scheme
    partitioning_scheme: Box<dyn PartitioningScheme + Send + Sync>,
}

impl std::fmt::Debug for StateInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} nodes, {} virtual nodes",
            self.membership.len(),
            self.partitioning_scheme.n_virtual_nodes()
        )?;
        for node in self.membership.nodes() {
            write!(f, "\n{:?}", node)?;
        }

        Ok(())
    }
}

impl State {
    pub fn new(partitioning_scheme: Box<dyn PartitioningScheme + Send + Sync>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StateInner {
                membership: Membership::default(),
                partitioning_scheme,
            })),
        }
    }

    fn acquire_read_lock(&self) -> Result<RwLockReadGuard<StateInner>> {
        self.inner.read().map_err(|_| Error::Logic {
            reason: "Unable to acquire read lock for cluster state - poisoned...".to_string(),
        })
    }

    fn acquire_write_lock(&self) -> Result<RwLockWriteGuard<StateInner>> {
        self.inner.write().map_err(|_| Error::Logic {
            reason: "Unable to acquire write lock for cluster state - poisoned...".to_string(),
        })
    }

    /// Registers a node in both the membership table and the partitioning scheme.
    ///
    /// # Errors
    /// [`Error::NodeAlreadyExists`] if `node_id` is already registered. Nothing is mutated in that case.
    pub fn add_node(&self, node_id: NodeId, endpoint: String, backend: SharedBackend) -> Result<()> {
        let mut guard = self.acquire_write_lock()?;
        if guard.membership.contains(&node_id) {
            return Err(Error::NodeAlreadyExists { node_id });
        }

        guard
            .partitioning_scheme
            .add_node(&node_id, &endpoint)?;
        if let Err(err) = guard
            .membership
            .insert(node_id.clone(), Member { endpoint, backend })
        {
            // keep both structures in lockstep
            guard.partitioning_scheme.remove_node(&node_id)?;
            return Err(err);
        }

        Ok(())
    }

    /// Removes a node from both the membership table and the partitioning scheme,
    /// returning the removed [`Member`] so the caller can release its backend.
    ///
    /// # Errors
    /// [`Error::NodeDoesNotExist`] if `node_id` isn't registered
    pub fn remove_node(&self, node_id: &str) -> Result<Member> {
        let mut guard = self.acquire_write_lock()?;
        let member = guard.membership.remove(node_id)?;
        guard.partitioning_scheme.remove_node(node_id)?;

        Ok(member)
    }

    pub fn node_count(&self) -> Result<NodeCount> {
        let guard = self.acquire_read_lock()?;
        Ok(NodeCount {
            nodes: guard.membership.len(),
            virtual_nodes: guard.partitioning_scheme.n_virtual_nodes(),
        })
    }

    pub fn nodes(&self) -> Result<Vec<NodeInfo>> {
        let guard = self.acquire_read_lock()?;
        Ok(guard.membership.nodes())
    }

    /// Returns the ids of the nodes that should hold `key`, in preference order
    pub fn preference_list(&self, key: &[u8], replicas: usize) -> Result<Vec<NodeId>> {
        let guard = self.acquire_read_lock()?;
        guard.partitioning_scheme.preference_list(key, replicas)
    }

    /// Same as [`State::preference_list`] but also returns the backend of every node.
    /// Ids and backends are resolved under the same read lock.
    pub fn replicas(&self, key: &[u8], replicas: usize) -> Result<Vec<Replica>> {
        let guard = self.acquire_read_lock()?;
        guard
            .partitioning_scheme
            .preference_list(key, replicas)?
            .into_iter()
            .map(|node_id| -> Result<Replica> {
                let member = guard.membership.get(&node_id).ok_or(Error::Logic {
                    reason: format!(
                        "node {} found in the ring but not in the membership table. This should never happen.",
                        node_id
                    ),
                })?;

                Ok(Replica {
                    backend: member.backend.clone(),
                    node_id,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::State;
    use crate::{
        backend::in_memory::InMemoryBackend,
        cluster::{
            error::Error,
            hashing::node_id,
            partitioning::consistent_hashing::{ConsistentHashing, VIRTUAL_NODES_PER_NODE},
        },
    };
    use std::{collections::HashSet, sync::Arc};

    fn state() -> State {
        State::new(Box::<ConsistentHashing>::default())
    }

    fn add(state: &State, endpoint: &str) -> String {
        let id = node_id(endpoint.as_bytes());
        state
            .add_node(
                id.clone(),
                endpoint.to_string(),
                Arc::new(InMemoryBackend::default()),
            )
            .unwrap();
        id
    }

    #[test]
    fn test_add_remove_keeps_counts_in_lockstep() {
        let state = state();
        let a = add(&state, "127.0.0.1:6001");
        add(&state, "127.0.0.1:6002");

        let count = state.node_count().unwrap();
        assert_eq!(count.nodes, 2);
        assert_eq!(count.virtual_nodes, 2 * VIRTUAL_NODES_PER_NODE);

        let removed = state.remove_node(&a).unwrap();
        assert_eq!(removed.endpoint, "127.0.0.1:6001");
        assert!(state.nodes().unwrap().iter().all(|node| node.node_id != a));

        let count = state.node_count().unwrap();
        assert_eq!(count.nodes, 1);
        assert_eq!(count.virtual_nodes, VIRTUAL_NODES_PER_NODE);
    }

    #[test]
    fn test_add_duplicate_is_rejected() {
        let state = state();
        let id = add(&state, "127.0.0.1:6001");
        let err = state
            .add_node(
                id.clone(),
                "127.0.0.1:6001".to_string(),
                Arc::new(InMemoryBackend::default()),
            )
            .err()
            .unwrap();

        assert_eq!(err, Error::NodeAlreadyExists { node_id: id });
        assert_eq!(state.node_count().unwrap().virtual_nodes, VIRTUAL_NODES_PER_NODE);
    }

    #[test]
    fn test_replicas_resolve_backends() {
        let state = state();
        let ids: HashSet<String> = (0..5)
            .map(|i| add(&state, &format!("127.0.0.1:600{}", i)))
            .collect();

        let replicas = state.replicas(b"some key", 3).unwrap();
        assert_eq!(replicas.len(), 3);
        for replica in replicas.iter() {
            assert!(ids.contains(&replica.node_id));
        }

        let preference_list: Vec<String> = replicas.into_iter().map(|r| r.node_id).collect();
        assert_eq!(preference_list, state.preference_list(b"some key", 3).unwrap());
    }

    #[test]
    fn test_empty_state() {
        let state = state();
        assert_eq!(
            state.replicas(b"any-key", 3).err().unwrap(),
            Error::NoNodesAvailable
        );
        assert_eq!(
            state.remove_node("unknown").err().unwrap(),
            Error::NodeDoesNotExist {
                node_id: "unknown".to_string()
            }
        );
    }
}
