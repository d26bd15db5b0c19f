//! Module that contains the partitioning scheme used to place nodes and keys on the ring
use crate::cluster::{error::Result, hashing::NodeId};

pub mod consistent_hashing;
pub mod ring;

/// This trait defines a PartitioningScheme (ie: how should keys be split amongst cluster nodes)
///
/// Membership changes (`add_node` and `remove_node`) change key ownership. Data is NOT moved
/// between nodes when that happens, so keys written before a topology change may not be
/// readable after it.
pub trait PartitioningScheme {
    /// adds a new node to the partition state
    fn add_node(&mut self, node_id: &str, endpoint: &str) -> Result<()>;

    /// removes a node from the partition state. Removing an unknown node is a no-op
    fn remove_node(&mut self, node_id: &str) -> Result<()>;

    /// returns the owner of a given key
    fn key_owner(&self, key: &[u8]) -> Result<NodeId>;

    /// returns up to `list_size` distinct nodes that should hold replicas of the given key.
    /// The first element is always the key owner.
    fn preference_list(&self, key: &[u8], list_size: usize) -> Result<Vec<NodeId>>;

    /// how many ring positions are currently assigned
    fn n_virtual_nodes(&self) -> usize;
}
