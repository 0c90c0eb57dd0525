//! Binary persistence image
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! u16  total length of the image in bytes, this field included
//! u8   current directory index
//! u8   node count (table high-water mark)
//! ...  node count x 13-byte node records
//! u16  name pool length
//! ...  name pool bytes
//! ```
//!
//! Node record: kind u8, name_start u16, name_len u8, parent u8,
//! first_child u8, next_sibling u8, content_id u16, size u32.

use crate::error::ImageError;
use crate::node::{FileNode, NamePool, NodeKind, MAX_NAME_LEN, MAX_NODES, NAME_POOL_SIZE, ROOT};
use crate::tree::VirtualFileTree;

/// Bytes per persisted node record
pub const NODE_RECORD_SIZE: usize = 13;

const HEADER_SIZE: usize = 4;

/// Size of the largest possible image
pub const IMAGE_SIZE: usize = HEADER_SIZE + MAX_NODES * NODE_RECORD_SIZE + 2 + NAME_POOL_SIZE;

fn encode_node(node: &FileNode, out: &mut [u8]) {
    out[0] = node.kind.to_byte();
    out[1..3].copy_from_slice(&node.name_start.to_le_bytes());
    out[3] = node.name_len;
    out[4] = node.parent;
    out[5] = node.first_child;
    out[6] = node.next_sibling;
    out[7..9].copy_from_slice(&node.content_id.to_le_bytes());
    out[9..13].copy_from_slice(&node.size.to_le_bytes());
}

fn decode_node(index: usize, raw: &[u8]) -> Result<FileNode, ImageError> {
    let kind = NodeKind::from_byte(raw[0]).ok_or(ImageError::BadKind {
        index,
        kind: raw[0],
    })?;
    Ok(FileNode {
        kind,
        name_start: u16::from_le_bytes([raw[1], raw[2]]),
        name_len: raw[3],
        parent: raw[4],
        first_child: raw[5],
        next_sibling: raw[6],
        content_id: u16::from_le_bytes([raw[7], raw[8]]),
        size: u32::from_le_bytes([raw[9], raw[10], raw[11], raw[12]]),
    })
}

fn need(bytes: &[u8], needed: usize) -> Result<(), ImageError> {
    if bytes.len() < needed {
        return Err(ImageError::Truncated {
            needed,
            available: bytes.len(),
        });
    }
    Ok(())
}

/// Every entry of `dir`'s child list must be live and point back at `dir`
fn check_child_list(nodes: &[FileNode], dir: usize) -> Result<(), ImageError> {
    let mut cursor = nodes[dir].first_child as usize;
    let mut steps = 0;
    while cursor != ROOT as usize {
        steps += 1;
        let child = &nodes[cursor];
        if steps > nodes.len() || child.is_free() || child.parent as usize != dir {
            return Err(ImageError::CorruptNode(cursor));
        }
        cursor = child.next_sibling as usize;
    }
    Ok(())
}

impl VirtualFileTree {
    /// Length of the image [`VirtualFileTree::serialize`] would produce
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.node_count * NODE_RECORD_SIZE + 2 + self.names.len()
    }

    /// Writes the image into `buf` and returns its length
    pub fn serialize_into(&self, buf: &mut [u8; IMAGE_SIZE]) -> usize {
        let total = self.encoded_len();
        buf[0..2].copy_from_slice(&(total as u16).to_le_bytes());
        buf[2] = self.current_dir;
        buf[3] = self.node_count as u8;

        let mut offset = HEADER_SIZE;
        for node in &self.nodes[..self.node_count] {
            encode_node(node, &mut buf[offset..offset + NODE_RECORD_SIZE]);
            offset += NODE_RECORD_SIZE;
        }

        let pool = self.names.as_bytes();
        buf[offset..offset + 2].copy_from_slice(&(pool.len() as u16).to_le_bytes());
        offset += 2;
        buf[offset..offset + pool.len()].copy_from_slice(pool);
        offset += pool.len();

        buf[offset..].fill(0);
        total
    }

    /// Encodes the tree into a fixed-size buffer
    ///
    /// Only the first `u16` length-prefix bytes are meaningful.
    pub fn serialize(&self) -> [u8; IMAGE_SIZE] {
        let mut buf = [0u8; IMAGE_SIZE];
        self.serialize_into(&mut buf);
        buf
    }

    /// Rebuilds a tree from an image
    ///
    /// Every link, name range and the current directory are validated. Child
    /// lists must only reach live nodes whose `parent` is the listing
    /// directory. Nodes orphaned by a non-cascading delete are accepted.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, ImageError> {
        need(bytes, HEADER_SIZE)?;
        let total = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
        need(bytes, total)?;
        let bytes = &bytes[..total];
        need(bytes, HEADER_SIZE)?;

        let current_dir = bytes[2];
        let node_count = bytes[3] as usize;
        if node_count == 0 || node_count > MAX_NODES {
            return Err(ImageError::BadNodeCount(node_count));
        }

        let pool_offset = HEADER_SIZE + node_count * NODE_RECORD_SIZE;
        need(bytes, pool_offset + 2)?;
        let pool_len = u16::from_le_bytes([bytes[pool_offset], bytes[pool_offset + 1]]) as usize;
        if pool_len > NAME_POOL_SIZE {
            return Err(ImageError::NamePoolOverflow(pool_len));
        }
        need(bytes, pool_offset + 2 + pool_len)?;
        let pool_bytes = &bytes[pool_offset + 2..pool_offset + 2 + pool_len];
        let names = NamePool::from_bytes(pool_bytes).ok_or(ImageError::NamePoolOverflow(pool_len))?;

        let mut nodes = [FileNode::EMPTY; MAX_NODES];
        for (index, node) in nodes[..node_count].iter_mut().enumerate() {
            let start = HEADER_SIZE + index * NODE_RECORD_SIZE;
            *node = decode_node(index, &bytes[start..start + NODE_RECORD_SIZE])?;
        }

        for (index, node) in nodes[..node_count].iter().enumerate() {
            if node.is_free() {
                continue;
            }
            let links_ok = [node.parent, node.first_child, node.next_sibling]
                .iter()
                .all(|&link| (link as usize) < node_count);
            let name_end = node.name_start as usize + node.name_len as usize;
            let name_ok = node.name_len as usize <= MAX_NAME_LEN
                && name_end <= pool_len
                && std::str::from_utf8(&pool_bytes[node.name_start as usize..name_end]).is_ok();
            let root_ok = index != ROOT as usize || node.name_len == 0;
            let leaf_ok = node.is_dir() || !node.has_children();
            if !links_ok || !name_ok || !root_ok || !leaf_ok {
                return Err(ImageError::CorruptNode(index));
            }
        }

        for (index, node) in nodes[..node_count].iter().enumerate() {
            if node.is_dir() {
                check_child_list(&nodes[..node_count], index)?;
            }
        }

        if !nodes[ROOT as usize].is_dir() {
            return Err(ImageError::BadRoot);
        }
        if (current_dir as usize) >= node_count || !nodes[current_dir as usize].is_dir() {
            return Err(ImageError::BadCurrentDir(current_dir));
        }

        Ok(Self {
            nodes,
            node_count,
            names,
            current_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tree_image() {
        let tree = VirtualFileTree::new();
        let image = tree.serialize();
        let total = u16::from_le_bytes([image[0], image[1]]) as usize;
        assert_eq!(total, HEADER_SIZE + NODE_RECORD_SIZE + 2);
        assert_eq!(image[2], ROOT);
        assert_eq!(image[3], 1);

        let back = VirtualFileTree::deserialize(&image).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_image_fits_fixed_buffer() {
        assert_eq!(IMAGE_SIZE, 2 + 1 + 1 + 64 * 13 + 2 + 2048);
        assert!(IMAGE_SIZE <= u16::MAX as usize);
    }

    #[test]
    fn test_truncated_image() {
        let result = VirtualFileTree::deserialize(&[1, 0]);
        assert_eq!(
            result,
            Err(ImageError::Truncated {
                needed: HEADER_SIZE,
                available: 2
            })
        );

        let tree = VirtualFileTree::new();
        let image = tree.serialize();
        let total = tree.encoded_len();
        assert!(matches!(
            VirtualFileTree::deserialize(&image[..total - 1]),
            Err(ImageError::Truncated { .. })
        ));
    }

    #[test]
    fn test_length_prefix_shorter_than_header() {
        for prefix in 0u8..HEADER_SIZE as u8 {
            let image = [prefix, 0, 0, 1, 0, 0, 0, 0];
            assert_eq!(
                VirtualFileTree::deserialize(&image),
                Err(ImageError::Truncated {
                    needed: HEADER_SIZE,
                    available: prefix as usize
                })
            );
        }
    }

    #[test]
    fn test_child_with_wrong_parent_is_corrupt() {
        let mut tree = VirtualFileTree::new();
        tree.create_at(NodeKind::Dir, "d").unwrap();
        let file = tree.create_at(NodeKind::File, "d/f").unwrap();
        let mut image = tree.serialize();
        // f sits in d's list but claims the root as parent.
        image[HEADER_SIZE + file as usize * NODE_RECORD_SIZE + 4] = ROOT;
        assert_eq!(
            VirtualFileTree::deserialize(&image),
            Err(ImageError::CorruptNode(file as usize))
        );
    }

    #[test]
    fn test_child_list_reaching_free_slot_is_corrupt() {
        let mut tree = VirtualFileTree::new();
        let a = tree.create_at(NodeKind::File, "a").unwrap();
        let b = tree.create_at(NodeKind::File, "b").unwrap();
        tree.remove_at("a").unwrap();
        let mut image = tree.serialize();
        // b's next_sibling now points at a's freed slot.
        image[HEADER_SIZE + b as usize * NODE_RECORD_SIZE + 6] = a;
        assert_eq!(
            VirtualFileTree::deserialize(&image),
            Err(ImageError::CorruptNode(a as usize))
        );
    }

    #[test]
    fn test_sibling_cycle_is_corrupt() {
        let mut tree = VirtualFileTree::new();
        let a = tree.create_at(NodeKind::File, "a").unwrap();
        let b = tree.create_at(NodeKind::File, "b").unwrap();
        let mut image = tree.serialize();
        // a is the tail of the root's list; point it back at b.
        image[HEADER_SIZE + a as usize * NODE_RECORD_SIZE + 6] = b;
        assert!(matches!(
            VirtualFileTree::deserialize(&image),
            Err(ImageError::CorruptNode(_))
        ));
    }

    #[test]
    fn test_orphan_after_delete_round_trips() {
        let mut tree = VirtualFileTree::new();
        let dir = tree.create_at(NodeKind::Dir, "d").unwrap();
        tree.create_at(NodeKind::File, "d/f").unwrap();
        tree.unlink_child(ROOT, dir).unwrap();
        tree.delete_node(dir).unwrap();
        let back = VirtualFileTree::deserialize(&tree.serialize()).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_bad_node_count() {
        let mut image = VirtualFileTree::new().serialize();
        image[3] = 0;
        assert_eq!(VirtualFileTree::deserialize(&image), Err(ImageError::BadNodeCount(0)));
    }

    #[test]
    fn test_bad_kind() {
        let mut image = VirtualFileTree::new().serialize();
        image[HEADER_SIZE] = 9;
        assert_eq!(
            VirtualFileTree::deserialize(&image),
            Err(ImageError::BadKind { index: 0, kind: 9 })
        );
    }

    #[test]
    fn test_root_must_be_directory() {
        let mut image = VirtualFileTree::new().serialize();
        image[HEADER_SIZE] = NodeKind::File.to_byte();
        assert_eq!(VirtualFileTree::deserialize(&image), Err(ImageError::BadRoot));
    }

    #[test]
    fn test_out_of_range_link_is_corrupt() {
        let mut tree = VirtualFileTree::new();
        tree.create_at(NodeKind::File, "a").unwrap();
        let mut image = tree.serialize();
        // first_child of the root points past the table.
        image[HEADER_SIZE + 5] = 200;
        assert_eq!(VirtualFileTree::deserialize(&image), Err(ImageError::CorruptNode(0)));
    }

    #[test]
    fn test_current_dir_must_be_directory() {
        let mut tree = VirtualFileTree::new();
        let file = tree.create_at(NodeKind::File, "a").unwrap();
        let mut image = tree.serialize();
        image[2] = file;
        assert_eq!(
            VirtualFileTree::deserialize(&image),
            Err(ImageError::BadCurrentDir(file))
        );
    }

    #[test]
    fn test_payload_fields_survive() {
        let mut tree = VirtualFileTree::new();
        let file = tree.create_at(NodeKind::File, "blob.bin").unwrap();
        let node = tree.node_mut(file).unwrap();
        node.content_id = 0x1234;
        node.size = 70_000;

        let back = VirtualFileTree::deserialize(&tree.serialize()).unwrap();
        let node = back.node(file).unwrap();
        assert_eq!(node.content_id, 0x1234);
        assert_eq!(node.size, 70_000);
    }
}
