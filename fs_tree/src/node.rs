//! Node table entries and the name pool

/// Index into the node table
pub type NodeIndex = u8;

/// The root directory, also the "no link" sentinel
pub const ROOT: NodeIndex = 0;

/// Node table size; the persisted node count is a single byte
pub const MAX_NODES: usize = 64;

/// Longest permitted name, in bytes
pub const MAX_NAME_LEN: usize = 32;

/// Name pool size, in bytes
pub const NAME_POOL_SIZE: usize = 2048;

/// Node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    /// A free slot, reusable by the next create
    #[default]
    Empty,
    File,
    Dir,
}

impl NodeKind {
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::File => 1,
            Self::Dir => 2,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Empty),
            1 => Some(Self::File),
            2 => Some(Self::Dir),
            _ => None,
        }
    }
}

/// A node table entry
///
/// `first_child` and `next_sibling` use [`ROOT`] to mean "none"; the root
/// can never be anybody's child, so the value is unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileNode {
    pub kind: NodeKind,
    pub name_start: u16,
    pub name_len: u8,
    pub parent: NodeIndex,
    pub first_child: NodeIndex,
    pub next_sibling: NodeIndex,
    /// Payload handle for file content (0 = none)
    pub content_id: u16,
    pub size: u32,
}

impl FileNode {
    pub const EMPTY: Self = Self {
        kind: NodeKind::Empty,
        name_start: 0,
        name_len: 0,
        parent: ROOT,
        first_child: ROOT,
        next_sibling: ROOT,
        content_id: 0,
        size: 0,
    };

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_free(&self) -> bool {
        self.kind == NodeKind::Empty
    }

    pub fn has_children(&self) -> bool {
        self.first_child != ROOT
    }
}

impl Default for FileNode {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Append-only byte arena for node names
#[derive(Clone)]
pub(crate) struct NamePool {
    bytes: [u8; NAME_POOL_SIZE],
    len: usize,
}

impl NamePool {
    pub(crate) const fn new() -> Self {
        Self {
            bytes: [0u8; NAME_POOL_SIZE],
            len: 0,
        }
    }

    /// Appends `name` and returns its start offset
    pub(crate) fn append(&mut self, name: &[u8]) -> Option<u16> {
        if name.len() > NAME_POOL_SIZE - self.len {
            return None;
        }
        let start = self.len;
        self.bytes[start..start + name.len()].copy_from_slice(name);
        self.len += name.len();
        Some(start as u16)
    }

    pub(crate) fn get(&self, start: u16, len: u8) -> &[u8] {
        let start = start as usize;
        let end = (start + len as usize).min(self.len);
        &self.bytes[start.min(end)..end]
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut pool = Self::new();
        pool.append(bytes)?;
        Some(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_byte_mapping() {
        for kind in [NodeKind::Empty, NodeKind::File, NodeKind::Dir] {
            assert_eq!(NodeKind::from_byte(kind.to_byte()), Some(kind));
        }
        assert_eq!(NodeKind::from_byte(7), None);
    }

    #[test]
    fn test_empty_node() {
        let node = FileNode::default();
        assert!(node.is_free());
        assert!(!node.has_children());
    }

    #[test]
    fn test_name_pool_append_and_get() {
        let mut pool = NamePool::new();
        let a = pool.append(b"docs").unwrap();
        let b = pool.append(b"notes.txt").unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 4);
        assert_eq!(pool.get(b, 9), b"notes.txt");
        assert_eq!(pool.len(), 13);
    }

    #[test]
    fn test_name_pool_exhaustion() {
        let mut pool = NamePool::new();
        let chunk = [b'x'; 1000];
        assert!(pool.append(&chunk).is_some());
        assert!(pool.append(&chunk).is_some());
        assert!(pool.append(&chunk).is_none());
        assert_eq!(pool.len(), 2000);
    }
}
