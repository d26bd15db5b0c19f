//! Hash functions used to place nodes and keys on the ring.
//!
//! Both functions take the first 8 bytes of a SHA-256 digest. [`ring_position`] reads them as a
//! big-endian u64 while [`node_id`] hex encodes them into a short identifier that is easy
//! to read in logs and responses.
use sha2::{Digest, Sha256};

/// Position in the [0, 2^64) hash space
pub type RingPosition = u64;

/// 16 lowercase hex chars derived from a node endpoint
pub type NodeId = String;

const PREFIX_LEN: usize = std::mem::size_of::<RingPosition>();

fn digest_prefix(input: &[u8]) -> [u8; PREFIX_LEN] {
    let digest = Sha256::digest(input);
    let mut prefix = [0u8; PREFIX_LEN];
    prefix.copy_from_slice(&digest[..PREFIX_LEN]);
    prefix
}

/// Maps an arbitrary input into the ring hash space
pub fn ring_position(input: &[u8]) -> RingPosition {
    RingPosition::from_be_bytes(digest_prefix(input))
}

/// Derives the [`NodeId`] of a node from its endpoint.
///
/// Two endpoints colliding on the same id is not handled. The ring would treat them as
/// the same physical node and reject the second one with NodeAlreadyExists.
pub fn node_id(input: &[u8]) -> NodeId {
    hex::encode(digest_prefix(input))
}

#[cfg(test)]
mod tests {
    use super::{node_id, ring_position};

    #[test]
    fn test_known_node_ids() {
        assert_eq!(node_id(b"http://test:1234"), "b8db6c8ad1cd7f36");
        assert_eq!(node_id(b"127.0.0.1:6379"), "6cdc2779ab132682");
        assert_eq!(node_id(b""), "e3b0c44298fc1c14");
    }

    #[test]
    fn test_known_ring_positions() {
        assert_eq!(ring_position(b"foo"), 0x2c26b46b68ffc68f);
        assert_eq!(ring_position(b""), 0xe3b0c44298fc1c14);
    }

    #[test]
    fn test_node_id_is_hex_encoded_ring_position() {
        for input in ["a", "node_1", "127.0.0.1:3001_9"] {
            assert_eq!(
                node_id(input.as_bytes()),
                format!("{:016x}", ring_position(input.as_bytes()))
            );
        }
    }

    #[quickcheck]
    fn test_hashing_is_deterministic(input: String) -> bool {
        ring_position(input.as_bytes()) == ring_position(input.as_bytes())
            && node_id(input.as_bytes()) == node_id(input.as_bytes())
    }

    #[quickcheck]
    fn test_node_id_is_short_lowercase_hex(input: String) -> bool {
        let id = node_id(input.as_bytes());
        id.len() == 16 && id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
    }
}
