//! Hashes keys and virtual node names onto the ring

use md5::{Digest, Md5};

/// The separator between a node name and its replica index
pub const VNODE_SEPARATOR: &str = "_VN_";

/// Hash an input onto a position on the ring
///
/// This digests the input with MD5 and keeps the first 4 bytes as a
/// big endian u32. MD5 is not load bearing for correctness here, just
/// for spreading positions evenly around the ring.
///
/// # Arguments
///
/// * `input` - The input to hash onto the ring
pub fn position(input: &str) -> u32 {
    // build a new md5 hasher
    let mut hasher = Md5::new();
    // add our input
    hasher.update(input.as_bytes());
    // get the full 128 bit digest
    let digest = hasher.finalize();
    // keep the first 4 bytes as a big endian u32
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Build the name for one of a nodes virtual nodes
///
/// # Arguments
///
/// * `node` - The node this virtual node belongs too
/// * `replica` - The index of this virtual node
pub fn vnode_name(node: &str, replica: usize) -> String {
    format!("{node}{VNODE_SEPARATOR}{replica}")
}

/// Get the ring position for one of a nodes virtual nodes
///
/// # Arguments
///
/// * `node` - The node this virtual node belongs too
/// * `replica` - The index of this virtual node
pub fn vnode_position(node: &str, replica: usize) -> u32 {
    position(&vnode_name(node, replica))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_deterministic() {
        // hashing the same input twice must land on the same position
        assert_eq!(position("Key1"), position("Key1"));
        assert_eq!(vnode_position("Server1", 0), vnode_position("Server1", 0));
    }

    #[test]
    fn positions_match_md5_vectors() {
        // fixed vectors computed from the md5 digests of these inputs
        assert_eq!(position("Server1_VN_0"), 808_831_815);
        assert_eq!(position("Server2_VN_0"), 3_621_026_918);
        assert_eq!(position("Key1"), 4_132_392_821);
        assert_eq!(position("Key5"), 2_231_465_492);
        assert_eq!(position(""), 3_558_706_393);
    }

    #[test]
    fn close_inputs_spread_apart() {
        // neighboring replica indexes should not cluster on the ring
        let spots = [
            vnode_position("Server1", 0),
            vnode_position("Server1", 1),
            vnode_position("Server1", 2),
        ];
        assert_ne!(spots[0], spots[1]);
        assert_ne!(spots[1], spots[2]);
        assert_ne!(spots[0], spots[2]);
    }

    #[test]
    fn vnode_names_use_the_separator() {
        assert_eq!(vnode_name("Server1", 2), "Server1_VN_2");
    }
}
