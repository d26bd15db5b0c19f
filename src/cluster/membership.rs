//! The membership table: which physical nodes are part of the cluster and how to reach them.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::backend::SharedBackend;

use super::{
    error::{Error, Result},
    hashing::NodeId,
};

/// A physical node registered in the table
#[derive(Debug, Clone)]
pub struct Member {
    // the endpoint the node id was derived from
    pub endpoint: String,
    pub backend: SharedBackend,
}

/// Serializable view of a [`Member`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub node_id: NodeId,
    pub endpoint: String,
}

#[derive(Debug, Default)]
pub struct Membership {
    nodes: HashMap<NodeId, Member>,
}

impl Membership {
    pub fn insert(&mut self, node_id: NodeId, member: Member) -> Result<()> {
        if self.nodes.contains_key(&node_id) {
            return Err(Error::NodeAlreadyExists { node_id });
        }

        self.nodes.insert(node_id, member);
        Ok(())
    }

    pub fn remove(&mut self, node_id: &str) -> Result<Member> {
        self.nodes.remove(node_id).ok_or(Error::NodeDoesNotExist {
            node_id: node_id.to_string(),
        })
    }

    pub fn get(&self, node_id: &str) -> Option<&Member> {
        self.nodes.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns every member sorted by node id
    pub fn nodes(&self) -> Vec<NodeInfo> {
        let mut nodes: Vec<NodeInfo> = self
            .nodes
            .iter()
            .map(|(node_id, member)| NodeInfo {
                node_id: node_id.clone(),
                endpoint: member.endpoint.clone(),
            })
            .collect();
        nodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::{Member, Membership};
    use crate::{
        backend::in_memory::InMemoryBackend,
        cluster::error::Error,
    };
    use std::sync::Arc;

    fn member(endpoint: &str) -> Member {
        Member {
            endpoint: endpoint.to_string(),
            backend: Arc::new(InMemoryBackend::default()),
        }
    }

    #[test]
    fn test_insert_remove() {
        let mut membership = Membership::default();
        membership.insert("b".to_string(), member("node-b")).unwrap();
        membership.insert("a".to_string(), member("node-a")).unwrap();

        assert_eq!(membership.len(), 2);
        assert!(membership.contains("a"));
        assert_eq!(membership.get("b").unwrap().endpoint, "node-b");

        let nodes = membership.nodes();
        assert_eq!(nodes[0].node_id, "a");
        assert_eq!(nodes[1].endpoint, "node-b");

        let removed = membership.remove("a").unwrap();
        assert_eq!(removed.endpoint, "node-a");
        assert!(!membership.contains("a"));
        assert_eq!(membership.len(), 1);
    }

    #[test]
    fn test_insert_duplicate_keeps_original() {
        let mut membership = Membership::default();
        membership.insert("a".to_string(), member("first")).unwrap();

        let err = membership
            .insert("a".to_string(), member("second"))
            .err()
            .unwrap();
        assert_eq!(
            err,
            Error::NodeAlreadyExists {
                node_id: "a".to_string()
            }
        );
        assert_eq!(membership.get("a").unwrap().endpoint, "first");
    }

    #[test]
    fn test_remove_unknown() {
        let mut membership = Membership::default();
        let err = membership.remove("nope").err().unwrap();
        assert_eq!(
            err,
            Error::NodeDoesNotExist {
                node_id: "nope".to_string()
            }
        );
        assert!(membership.is_empty());
    }
}
