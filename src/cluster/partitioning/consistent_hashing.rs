//! Consistent-hashing is the default [`PartitioningScheme`] for ringkv
use crate::cluster::{
    error::{Error, Result},
    hashing::{ring_position, NodeId, RingPosition},
};

use super::{ring::Ring, PartitioningScheme};

/// How many virtual nodes are created for every physical node
pub const VIRTUAL_NODES_PER_NODE: usize = 10;

/// ConsistentHashing decides which storage nodes should hold a specific key.
/// Both nodes and keys are hashed into the same fixed space - [0, 2^64) - and a key
/// is owned by the first node whose position is greater or equal than the key position.
/// The space wraps around (see [`Ring`]).
///
/// Every physical node is placed on the ring [`VIRTUAL_NODES_PER_NODE`] times, at the positions
/// of `"<endpoint>_<i>"` for i in [0, VIRTUAL_NODES_PER_NODE). Spreading a node across the ring
/// smooths how many keys each node ends up owning.
///
/// Replicas are found by walking forward from the key owner and skipping virtual nodes whose
/// physical node was already picked.
#[derive(Clone, Debug)]
pub struct ConsistentHashing {
    ring: Ring,
    virtual_nodes_per_node: usize,
    hash_fn: fn(&[u8]) -> RingPosition,
}

impl Default for ConsistentHashing {
    fn default() -> Self {
        Self {
            ring: Ring::new(),
            virtual_nodes_per_node: VIRTUAL_NODES_PER_NODE,
            hash_fn: ring_position,
        }
    }
}

impl ConsistentHashing {
    pub fn new_with_hash_fn(hash_fn: fn(&[u8]) -> RingPosition) -> Self {
        Self {
            hash_fn,
            ..Default::default()
        }
    }

    pub fn with_virtual_nodes_per_node(mut self, virtual_nodes_per_node: usize) -> Self {
        self.virtual_nodes_per_node = virtual_nodes_per_node;
        self
    }

    pub fn ring(&self) -> &Ring {
        &self.ring
    }
}

impl PartitioningScheme for ConsistentHashing {
    fn add_node(&mut self, node_id: &str, endpoint: &str) -> Result<()> {
        if self.ring.contains_owner(node_id) {
            return Err(Error::Logic {
                reason: format!("node {} already owns positions in the ring", node_id),
            });
        }

        for i in 0..self.virtual_nodes_per_node {
            let position = (self.hash_fn)(format!("{}_{}", endpoint, i).as_bytes());
            self.ring.insert(position, node_id.to_string());
        }

        Ok(())
    }

    fn remove_node(&mut self, node_id: &str) -> Result<()> {
        self.ring.remove_all(node_id);
        Ok(())
    }

    fn key_owner(&self, key: &[u8]) -> Result<NodeId> {
        let key_position = (self.hash_fn)(key);
        Ok(self.ring.first_at_or_after(key_position)?.owner.clone())
    }

    fn preference_list(&self, key: &[u8], list_size: usize) -> Result<Vec<NodeId>> {
        let key_position = (self.hash_fn)(key);
        let mut res: Vec<NodeId> = Vec::with_capacity(list_size);

        for vnode in self.ring.walk_from(key_position)? {
            if res.len() == list_size {
                break;
            }

            if !res.contains(&vnode.owner) {
                res.push(vnode.owner.clone());
            }
        }

        Ok(res)
    }

    fn n_virtual_nodes(&self) -> usize {
        self.ring.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConsistentHashing, VIRTUAL_NODES_PER_NODE};
    use crate::cluster::{
        error::Error,
        hashing::{node_id, ring_position},
        partitioning::PartitioningScheme,
    };
    use quickcheck::Arbitrary;
    use rand::{distributions::Alphanumeric, Rng};
    use std::{
        collections::{HashMap, HashSet},
        ops::Range,
    };

    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
    struct TestNode {
        endpoint: String,
    }

    fn generate_random_ascii_string(range_size: Range<usize>) -> String {
        let string_size = rand::thread_rng().gen_range(range_size);
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(string_size)
            .map(char::from)
            .collect()
    }

    fn generate_random_nodes(range: Range<usize>) -> Vec<TestNode> {
        let n_nodes = rand::thread_rng().gen_range(range);
        let mut nodes = Vec::with_capacity(n_nodes);
        for _ in 0..n_nodes {
            nodes.push(TestNode {
                endpoint: generate_random_ascii_string(10..20),
            })
        }
        nodes.sort();
        nodes.dedup();
        nodes
    }

    fn generate_random_keys(range: Range<usize>) -> Vec<String> {
        let n_keys = rand::thread_rng().gen_range(range);
        let mut keys = Vec::with_capacity(n_keys);
        for _ in 0..n_keys {
            keys.push(generate_random_ascii_string(1..20));
        }

        keys
    }

    fn add_all(ring: &mut ConsistentHashing, nodes: &[TestNode]) {
        for node in nodes {
            ring.add_node(&node_id(node.endpoint.as_bytes()), &node.endpoint)
                .unwrap();
        }
    }

    #[derive(Debug, Clone)]
    struct RingTestInput {
        nodes: Vec<TestNode>,
        keys: Vec<String>,
        replicas: usize,
    }

    impl Arbitrary for RingTestInput {
        fn arbitrary(_: &mut quickcheck::Gen) -> Self {
            Self {
                nodes: generate_random_nodes(1..20),
                keys: generate_random_keys(20..50),
                replicas: rand::thread_rng().gen_range(1..6),
            }
        }
    }

    /// This test asserts on the following invariants
    /// 1. every node added owns exactly [`VIRTUAL_NODES_PER_NODE`] positions
    /// 2. the ring is sorted by position
    /// 3. every position is the hash of "<endpoint>_<i>"
    #[quickcheck]
    fn test_add_nodes_randomized(test_input: RingTestInput) {
        let mut ring = ConsistentHashing::default();
        add_all(&mut ring, &test_input.nodes);

        assert_eq!(
            ring.n_virtual_nodes(),
            test_input.nodes.len() * VIRTUAL_NODES_PER_NODE
        );

        let mut expected_positions: HashMap<String, Vec<u64>> = HashMap::new();
        for node in test_input.nodes.iter() {
            let positions = (0..VIRTUAL_NODES_PER_NODE)
                .map(|i| ring_position(format!("{}_{}", node.endpoint, i).as_bytes()))
                .collect();
            expected_positions.insert(node_id(node.endpoint.as_bytes()), positions);
        }

        let vnodes: Vec<_> = ring.ring().iter().collect();
        for pair in vnodes.windows(2) {
            assert!(pair[0].position <= pair[1].position);
        }

        for vnode in vnodes {
            assert!(expected_positions[&vnode.owner].contains(&vnode.position));
        }
    }

    /// Preference lists must contain distinct nodes, min(replicas, nodes) of them,
    /// and always start with the key owner
    #[quickcheck]
    fn test_preference_list_randomized(test_input: RingTestInput) {
        let mut ring = ConsistentHashing::default();
        add_all(&mut ring, &test_input.nodes);

        for key in test_input.keys.iter() {
            let preference_list = ring
                .preference_list(key.as_bytes(), test_input.replicas)
                .unwrap();
            let distinct: HashSet<_> = preference_list.iter().collect();

            assert_eq!(
                preference_list.len(),
                test_input.replicas.min(test_input.nodes.len())
            );
            assert_eq!(distinct.len(), preference_list.len());
            assert_eq!(preference_list[0], ring.key_owner(key.as_bytes()).unwrap());
            assert_eq!(
                preference_list,
                ring.preference_list(key.as_bytes(), test_input.replicas)
                    .unwrap()
            );
        }
    }

    #[quickcheck]
    fn test_remove_nodes_randomized(test_input: RingTestInput) {
        let mut ring = ConsistentHashing::default();
        add_all(&mut ring, &test_input.nodes);

        let (removed, kept) = test_input.nodes.split_at(test_input.nodes.len() / 2);
        for node in removed {
            ring.remove_node(&node_id(node.endpoint.as_bytes())).unwrap();
        }

        assert_eq!(ring.n_virtual_nodes(), kept.len() * VIRTUAL_NODES_PER_NODE);
        for node in removed {
            assert!(!ring.ring().contains_owner(&node_id(node.endpoint.as_bytes())));
        }
    }

    fn test_hash_fn(key: &[u8]) -> u64 {
        // this table precisely maps known keys to known hashes.
        // we will build test cases to cover all cases based on these known keys.
        let table: HashMap<&[u8], u64> = vec![
            (b"Node A_0".as_slice(), 10u64),
            (b"Node A_1".as_slice(), 50u64),
            (b"Node B_0".as_slice(), 20u64),
            (b"Node B_1".as_slice(), 60u64),
            (b"Node C_0".as_slice(), 30u64),
            (b"Node C_1".as_slice(), 35u64),
            (b"Node D_0".as_slice(), 40u64),
            (b"Node D_1".as_slice(), 70u64),
            (b"key 1".as_slice(), 1u64),
            (b"key 2".as_slice(), 10u64),
            (b"key 3".as_slice(), 11u64),
            (b"key 4".as_slice(), 31u64),
            (b"key 5".as_slice(), 45u64),
            (b"key 6".as_slice(), 65u64),
            (b"key 7".as_slice(), 71u64),
        ]
        .into_iter()
        .collect();

        table[key]
    }

    /// ring built from [`test_hash_fn`]:
    /// 10:A 20:B 30:C 35:C 40:D 50:A 60:B 70:D
    fn test_ring(endpoints: &[&str]) -> ConsistentHashing {
        let mut ring =
            ConsistentHashing::new_with_hash_fn(test_hash_fn).with_virtual_nodes_per_node(2);
        for endpoint in endpoints {
            ring.add_node(endpoint, endpoint).unwrap();
        }
        ring
    }

    struct TableTest {
        key: &'static str,
        replicas: usize,
        expected: Vec<&'static str>,
    }

    #[test]
    fn test_preference_list_table() {
        let ring = test_ring(&["Node A", "Node B", "Node C", "Node D"]);

        let test_cases = vec![
            TableTest {
                key: "key 1",
                replicas: 2,
                expected: vec!["Node A", "Node B"],
            },
            TableTest {
                // exact hit on a virtual node position
                key: "key 2",
                replicas: 2,
                expected: vec!["Node A", "Node B"],
            },
            TableTest {
                key: "key 3",
                replicas: 3,
                expected: vec!["Node B", "Node C", "Node D"],
            },
            TableTest {
                // second virtual node of C is skipped
                key: "key 4",
                replicas: 2,
                expected: vec!["Node C", "Node D"],
            },
            TableTest {
                key: "key 5",
                replicas: 4,
                expected: vec!["Node A", "Node B", "Node D", "Node C"],
            },
            TableTest {
                key: "key 6",
                replicas: 3,
                expected: vec!["Node D", "Node A", "Node B"],
            },
            TableTest {
                //this is where we go around the circular buffer back to node A
                key: "key 7",
                replicas: 2,
                expected: vec!["Node A", "Node B"],
            },
            TableTest {
                // asking for more replicas than nodes returns every node once
                key: "key 7",
                replicas: 10,
                expected: vec!["Node A", "Node B", "Node C", "Node D"],
            },
        ];

        for test_case in test_cases {
            assert_eq!(
                ring.preference_list(test_case.key.as_bytes(), test_case.replicas)
                    .unwrap(),
                test_case.expected,
                "key: {}",
                test_case.key
            );
            assert_eq!(
                ring.key_owner(test_case.key.as_bytes()).unwrap(),
                test_case.expected[0]
            );
        }
    }

    #[test]
    fn test_single_node() {
        let ring = test_ring(&["Node A"]);
        for key in ["key 1", "key 2", "key 3", "key 4", "key 5", "key 6", "key 7"] {
            assert_eq!(
                ring.preference_list(key.as_bytes(), 3).unwrap(),
                vec!["Node A"]
            );
        }
    }

    #[test]
    fn test_remove_node() {
        let mut ring = test_ring(&["Node A", "Node B"]);
        assert_eq!(ring.key_owner(b"key 4").unwrap(), "Node A");
        assert_eq!(ring.n_virtual_nodes(), 4);

        ring.remove_node("Node A").unwrap();
        assert_eq!(ring.n_virtual_nodes(), 2);
        for key in ["key 1", "key 4", "key 7"] {
            assert_eq!(ring.key_owner(key.as_bytes()).unwrap(), "Node B");
        }

        // removing twice is a no-op
        ring.remove_node("Node A").unwrap();
        assert_eq!(ring.n_virtual_nodes(), 2);
    }

    #[test]
    fn test_add_same_node_twice() {
        let mut ring = test_ring(&["Node A"]);
        let err = ring.add_node("Node A", "Node A").err().unwrap();
        assert!(matches!(err, Error::Logic { .. }));
        assert_eq!(ring.n_virtual_nodes(), 2);
    }

    #[test]
    fn test_key_owner_without_nodes() {
        let ring = ConsistentHashing::default();
        assert_eq!(ring.key_owner(b"foo").err().unwrap(), Error::NoNodesAvailable);
        assert_eq!(
            ring.preference_list(b"any-key", 3).err().unwrap(),
            Error::NoNodesAvailable
        );
    }
}
