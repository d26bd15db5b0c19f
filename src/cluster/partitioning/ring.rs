//! The hash ring: a flat vector of [`VirtualNode`]s kept sorted by position.
//!
//! Looking up a position is a binary search. The vector is viewed as a circular buffer, so a
//! position past the last virtual node is owned by the first one. Example with a hash space of [0, 10]:
//!
//! VNodes:     ['A0', 'B0', 'A1']
//! Positions:  [  2 ,   5 ,   8 ]
//!
//! position 4 -> B0
//! position 8 -> A1
//! position 9 -> A0 (wraps around)
//!
//! Two virtual nodes may land on the same position. They are never merged: ties are ordered
//! by insertion sequence, the virtual node inserted first comes first.
use crate::cluster::{
    error::{Error, Result},
    hashing::{NodeId, RingPosition},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNode {
    pub position: RingPosition,
    /// insertion sequence, only used to order virtual nodes sharing the same position
    pub seq: u64,
    /// id of the physical node that owns this virtual node
    pub owner: NodeId,
}

#[derive(Debug, Clone, Default)]
pub struct Ring {
    vnodes: Vec<VirtualNode>,
    next_seq: u64,
}

impl Ring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vnodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vnodes.is_empty()
    }

    pub fn contains_owner(&self, owner: &str) -> bool {
        self.vnodes.iter().any(|vnode| vnode.owner == owner)
    }

    /// Inserts a new virtual node keeping the ring sorted by (position, seq)
    pub fn insert(&mut self, position: RingPosition, owner: NodeId) {
        let seq = self.next_seq;
        self.next_seq += 1;

        // seq only grows, so every virtual node already sitting on `position` goes first
        let index = self.vnodes.partition_point(|vnode| vnode.position <= position);
        self.vnodes.insert(
            index,
            VirtualNode {
                position,
                seq,
                owner,
            },
        );
    }

    /// Removes every virtual node owned by `owner` and returns how many were removed
    pub fn remove_all(&mut self, owner: &str) -> usize {
        let before = self.vnodes.len();
        self.vnodes.retain(|vnode| vnode.owner != owner);
        before - self.vnodes.len()
    }

    /// Returns the virtual node with the smallest position >= `position`, wrapping
    /// to the start of the ring if there's none.
    pub fn first_at_or_after(&self, position: RingPosition) -> Result<&VirtualNode> {
        let index = self.first_index_at_or_after(position)?;
        Ok(&self.vnodes[index])
    }

    /// Iterates over every virtual node exactly once, starting at [`Ring::first_at_or_after`]
    /// and wrapping around at the end of the ring.
    pub fn walk_from(
        &self,
        position: RingPosition,
    ) -> Result<impl Iterator<Item = &VirtualNode> + '_> {
        let index = self.first_index_at_or_after(position)?;
        Ok(self.vnodes[index..].iter().chain(self.vnodes[..index].iter()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &VirtualNode> + '_ {
        self.vnodes.iter()
    }

    fn first_index_at_or_after(&self, position: RingPosition) -> Result<usize> {
        if self.vnodes.is_empty() {
            return Err(Error::NoNodesAvailable);
        }

        Ok(self.vnodes.partition_point(|vnode| vnode.position < position) % self.vnodes.len())
    }
}
