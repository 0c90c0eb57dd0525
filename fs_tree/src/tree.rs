//! The node table and its operations

use crate::error::TreeError;
use crate::node::{FileNode, NamePool, NodeIndex, NodeKind, MAX_NODES, ROOT};
use crate::path::{Component, PathResolver};
use std::fmt;

/// An index-addressed directory tree
///
/// Owns the node table, the name pool, and the current directory.
#[derive(Clone)]
pub struct VirtualFileTree {
    pub(crate) nodes: [FileNode; MAX_NODES],
    /// High-water mark of used slots; freed slots below it are reused first
    pub(crate) node_count: usize,
    pub(crate) names: NamePool,
    pub(crate) current_dir: NodeIndex,
}

impl VirtualFileTree {
    /// Creates a tree holding only the root directory
    pub fn new() -> Self {
        let mut nodes = [FileNode::EMPTY; MAX_NODES];
        nodes[ROOT as usize] = FileNode {
            kind: NodeKind::Dir,
            ..FileNode::EMPTY
        };
        Self {
            nodes,
            node_count: 1,
            names: NamePool::new(),
            current_dir: ROOT,
        }
    }

    /// Allocates an unlinked node
    ///
    /// Reuses the lowest free slot before growing the table. The node's
    /// parent is the root until it is linked.
    pub fn create_node(&mut self, kind: NodeKind, name: &str) -> Result<NodeIndex, TreeError> {
        if kind == NodeKind::Empty {
            return Err(TreeError::InvalidKind);
        }
        if !PathResolver::is_valid_name(name) {
            return Err(TreeError::InvalidName);
        }

        let slot = match (1..self.node_count).find(|&i| self.nodes[i].is_free()) {
            Some(free) => free,
            None if self.node_count < MAX_NODES => self.node_count,
            None => return Err(TreeError::NoSpace),
        };

        let name_start = self
            .names
            .append(name.as_bytes())
            .ok_or(TreeError::NoSpace)?;

        self.nodes[slot] = FileNode {
            kind,
            name_start,
            name_len: name.len() as u8,
            ..FileNode::EMPTY
        };
        if slot == self.node_count {
            self.node_count += 1;
        }
        Ok(slot as NodeIndex)
    }

    /// Links `child` at the head of `parent`'s child list
    pub fn link_child(&mut self, parent: NodeIndex, child: NodeIndex) -> Result<(), TreeError> {
        self.live(parent)?;
        self.live(child)?;
        if child == ROOT {
            return Err(TreeError::InvalidIndex(child));
        }
        if !self.nodes[parent as usize].is_dir() {
            return Err(TreeError::NotADirectory);
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::WouldCycle);
        }

        let head = self.nodes[parent as usize].first_child;
        let node = &mut self.nodes[child as usize];
        node.next_sibling = head;
        node.parent = parent;
        self.nodes[parent as usize].first_child = child;
        Ok(())
    }

    /// Removes `child` from `parent`'s child list
    pub fn unlink_child(&mut self, parent: NodeIndex, child: NodeIndex) -> Result<(), TreeError> {
        self.live(parent)?;
        if (child as usize) >= self.node_count {
            return Err(TreeError::InvalidIndex(child));
        }

        let mut prev: Option<NodeIndex> = None;
        let mut cursor = self.nodes[parent as usize].first_child;
        while cursor != ROOT {
            let next = self.nodes[cursor as usize].next_sibling;
            if cursor == child {
                match prev {
                    Some(p) => self.nodes[p as usize].next_sibling = next,
                    None => self.nodes[parent as usize].first_child = next,
                }
                let node = &mut self.nodes[child as usize];
                node.next_sibling = ROOT;
                node.parent = ROOT;
                return Ok(());
            }
            prev = Some(cursor);
            cursor = next;
        }
        Err(TreeError::NotFound)
    }

    /// Frees a node's slot
    ///
    /// Children are not touched and the name bytes stay in the pool. Callers
    /// unlink the node first.
    pub fn delete_node(&mut self, index: NodeIndex) -> Result<(), TreeError> {
        if index == ROOT {
            return Err(TreeError::CannotDeleteRoot);
        }
        self.live(index)?;
        self.nodes[index as usize] = FileNode::EMPTY;
        if self.current_dir == index {
            self.current_dir = ROOT;
        }
        Ok(())
    }

    /// Finds a direct child by exact name
    pub fn find_child(&self, parent: NodeIndex, name: &str) -> Option<NodeIndex> {
        self.children(parent).find(|&child| self.name_bytes(child) == name.as_bytes())
    }

    pub fn set_current_dir(&mut self, index: NodeIndex) -> Result<(), TreeError> {
        self.live(index)?;
        if !self.nodes[index as usize].is_dir() {
            return Err(TreeError::NotADirectory);
        }
        self.current_dir = index;
        Ok(())
    }

    pub fn current_dir(&self) -> NodeIndex {
        self.current_dir
    }

    /// Returns a live node
    pub fn node(&self, index: NodeIndex) -> Option<&FileNode> {
        self.nodes[..self.node_count]
            .get(index as usize)
            .filter(|node| !node.is_free())
    }

    /// Mutable access to a live node's payload fields
    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut FileNode> {
        self.nodes[..self.node_count]
            .get_mut(index as usize)
            .filter(|node| !node.is_free())
    }

    /// Name of a node; the root's name is empty
    pub fn name(&self, index: NodeIndex) -> &str {
        std::str::from_utf8(self.name_bytes(index)).unwrap_or("")
    }

    fn name_bytes(&self, index: NodeIndex) -> &[u8] {
        match self.node(index) {
            Some(node) => self.names.get(node.name_start, node.name_len),
            None => &[],
        }
    }

    /// Iterates the children of `parent`, newest first
    pub fn children(&self, parent: NodeIndex) -> Children<'_> {
        let first = self.node(parent).map_or(ROOT, |node| node.first_child);
        Children {
            tree: self,
            next: first,
            remaining: MAX_NODES,
        }
    }

    /// Slots in use or previously used (the table's high-water mark)
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Nodes that are currently allocated, root included
    pub fn live_count(&self) -> usize {
        self.nodes[..self.node_count]
            .iter()
            .filter(|node| !node.is_free())
            .count()
    }

    /// Bytes consumed in the name pool
    pub fn name_pool_used(&self) -> usize {
        self.names.len()
    }

    /// Absolute path of a node, `/` for the root
    pub fn path_of(&self, index: NodeIndex) -> String {
        let mut chain = [ROOT; MAX_NODES];
        let mut depth = 0;
        let mut cursor = index;
        while cursor != ROOT && depth < MAX_NODES {
            chain[depth] = cursor;
            depth += 1;
            cursor = match self.node(cursor) {
                Some(node) => node.parent,
                None => ROOT,
            };
        }

        if depth == 0 {
            return String::from("/");
        }
        let mut path = String::new();
        for &step in chain[..depth].iter().rev() {
            path.push('/');
            path.push_str(self.name(step));
        }
        path
    }

    /// Resolves `path` to a node
    pub fn resolve(&self, path: &str) -> Result<NodeIndex, TreeError> {
        let mut cursor = if PathResolver::is_absolute(path) {
            ROOT
        } else {
            self.current_dir
        };

        for component in PathResolver::components(path) {
            if !self.nodes[cursor as usize].is_dir() {
                return Err(TreeError::NotADirectory);
            }
            cursor = match component {
                Component::Parent => self.nodes[cursor as usize].parent,
                Component::Name(name) => self.find_child(cursor, name).ok_or(TreeError::NotFound)?,
            };
        }
        Ok(cursor)
    }

    /// Resolves the directory that would contain `path`, and the final name
    pub fn resolve_parent<'p>(&self, path: &'p str) -> Result<(NodeIndex, &'p str), TreeError> {
        let (dir, name) = PathResolver::split_last(path);
        if !PathResolver::is_valid_name(name) {
            return Err(TreeError::InvalidName);
        }
        let parent = match dir {
            Some(dir) => self.resolve(dir)?,
            None => self.current_dir,
        };
        if !self.nodes[parent as usize].is_dir() {
            return Err(TreeError::NotADirectory);
        }
        Ok((parent, name))
    }

    /// Creates and links a new node at `path`
    pub fn create_at(&mut self, kind: NodeKind, path: &str) -> Result<NodeIndex, TreeError> {
        let (parent, name) = self.resolve_parent(path)?;
        if self.find_child(parent, name).is_some() {
            return Err(TreeError::AlreadyExists);
        }
        let child = self.create_node(kind, name)?;
        if let Err(err) = self.link_child(parent, child) {
            self.nodes[child as usize] = FileNode::EMPTY;
            return Err(err);
        }
        Ok(child)
    }

    /// Unlinks and frees the file or empty directory at `path`
    pub fn remove_at(&mut self, path: &str) -> Result<NodeIndex, TreeError> {
        let (parent, name) = self.resolve_parent(path)?;
        let child = self.find_child(parent, name).ok_or(TreeError::NotFound)?;
        if self.nodes[child as usize].has_children() {
            return Err(TreeError::NotEmpty);
        }
        self.unlink_child(parent, child)?;
        self.delete_node(child)?;
        Ok(child)
    }

    /// Changes the current directory to `path`
    pub fn change_dir(&mut self, path: &str) -> Result<NodeIndex, TreeError> {
        let target = self.resolve(path)?;
        self.set_current_dir(target)?;
        Ok(target)
    }

    fn live(&self, index: NodeIndex) -> Result<(), TreeError> {
        match self.node(index) {
            Some(_) => Ok(()),
            None => Err(TreeError::InvalidIndex(index)),
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeIndex, mut node: NodeIndex) -> bool {
        for _ in 0..MAX_NODES {
            if node == ancestor {
                return true;
            }
            if node == ROOT {
                return false;
            }
            node = self.nodes[node as usize].parent;
        }
        false
    }
}

impl Default for VirtualFileTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for VirtualFileTree {
    fn eq(&self, other: &Self) -> bool {
        self.node_count == other.node_count
            && self.current_dir == other.current_dir
            && self.nodes[..self.node_count] == other.nodes[..other.node_count]
            && self.names.as_bytes() == other.names.as_bytes()
    }
}

impl Eq for VirtualFileTree {}

impl fmt::Debug for VirtualFileTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualFileTree")
            .field("node_count", &self.node_count)
            .field("live", &self.live_count())
            .field("current_dir", &self.path_of(self.current_dir))
            .field("name_pool_used", &self.names.len())
            .finish()
    }
}

/// Iterator over a directory's children
pub struct Children<'a> {
    tree: &'a VirtualFileTree,
    next: NodeIndex,
    remaining: usize,
}

impl Iterator for Children<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == ROOT || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next;
        self.next = self
            .tree
            .nodes
            .get(current as usize)
            .map_or(ROOT, |node| node.next_sibling);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{MAX_NAME_LEN, NAME_POOL_SIZE};

    fn names(tree: &VirtualFileTree, dir: NodeIndex) -> Vec<&str> {
        tree.children(dir).map(|c| tree.name(c)).collect()
    }

    #[test]
    fn test_new_tree_has_root() {
        let tree = VirtualFileTree::new();
        let root = tree.node(ROOT).unwrap();
        assert!(root.is_dir());
        assert_eq!(root.parent, ROOT);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.current_dir(), ROOT);
        assert_eq!(tree.path_of(ROOT), "/");
    }

    #[test]
    fn test_create_rejects_bad_names() {
        let mut tree = VirtualFileTree::new();
        assert_eq!(tree.create_node(NodeKind::File, ""), Err(TreeError::InvalidName));
        let long = "n".repeat(MAX_NAME_LEN + 1);
        assert_eq!(tree.create_node(NodeKind::File, &long), Err(TreeError::InvalidName));
        assert_eq!(tree.create_node(NodeKind::Empty, "x"), Err(TreeError::InvalidKind));
    }

    #[test]
    fn test_find_child_after_link_and_after_delete() {
        let mut tree = VirtualFileTree::new();
        let idx = tree.create_node(NodeKind::File, "a.txt").unwrap();
        tree.link_child(ROOT, idx).unwrap();
        assert_eq!(tree.find_child(ROOT, "a.txt"), Some(idx));

        tree.unlink_child(ROOT, idx).unwrap();
        tree.delete_node(idx).unwrap();
        assert_eq!(tree.find_child(ROOT, "a.txt"), None);
    }

    #[test]
    fn test_children_newest_first() {
        let mut tree = VirtualFileTree::new();
        for name in ["one", "two", "three"] {
            let idx = tree.create_node(NodeKind::File, name).unwrap();
            tree.link_child(ROOT, idx).unwrap();
        }
        assert_eq!(names(&tree, ROOT), vec!["three", "two", "one"]);
    }

    #[test]
    fn test_unlink_middle_sibling() {
        let mut tree = VirtualFileTree::new();
        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            let idx = tree.create_node(NodeKind::File, name).unwrap();
            tree.link_child(ROOT, idx).unwrap();
            ids.push(idx);
        }
        tree.unlink_child(ROOT, ids[1]).unwrap();
        assert_eq!(names(&tree, ROOT), vec!["c", "a"]);
        assert_eq!(tree.unlink_child(ROOT, ids[1]), Err(TreeError::NotFound));
    }

    #[test]
    fn test_freed_slot_is_reused() {
        let mut tree = VirtualFileTree::new();
        let a = tree.create_node(NodeKind::File, "a").unwrap();
        let b = tree.create_node(NodeKind::File, "b").unwrap();
        tree.delete_node(a).unwrap();
        let c = tree.create_node(NodeKind::Dir, "c").unwrap();
        assert_eq!(c, a);
        assert_ne!(c, b);
        assert_eq!(tree.node_count(), 3);
        // Pool bytes for "a" are not reclaimed.
        assert_eq!(tree.name_pool_used(), 3);
    }

    #[test]
    fn test_table_exhaustion() {
        let mut tree = VirtualFileTree::new();
        for i in 1..MAX_NODES {
            tree.create_node(NodeKind::File, &format!("f{}", i)).unwrap();
        }
        assert_eq!(tree.create_node(NodeKind::File, "overflow"), Err(TreeError::NoSpace));
    }

    #[test]
    fn test_name_pool_exhaustion() {
        let mut tree = VirtualFileTree::new();
        let name = "p".repeat(MAX_NAME_LEN);
        let fits = NAME_POOL_SIZE / MAX_NAME_LEN;
        let mut created = 0;
        // Create and free repeatedly so the table never fills.
        loop {
            match tree.create_node(NodeKind::File, &name) {
                Ok(idx) => {
                    tree.delete_node(idx).unwrap();
                    created += 1;
                }
                Err(err) => {
                    assert_eq!(err, TreeError::NoSpace);
                    break;
                }
            }
        }
        assert_eq!(created, fits);
    }

    #[test]
    fn test_delete_errors() {
        let mut tree = VirtualFileTree::new();
        assert_eq!(tree.delete_node(ROOT), Err(TreeError::CannotDeleteRoot));
        assert_eq!(tree.delete_node(9), Err(TreeError::InvalidIndex(9)));
    }

    #[test]
    fn test_delete_does_not_cascade() {
        let mut tree = VirtualFileTree::new();
        let dir = tree.create_at(NodeKind::Dir, "d").unwrap();
        let file = tree.create_at(NodeKind::File, "d/f").unwrap();
        tree.unlink_child(ROOT, dir).unwrap();
        tree.delete_node(dir).unwrap();
        assert!(tree.node(file).is_some());
    }

    #[test]
    fn test_link_errors() {
        let mut tree = VirtualFileTree::new();
        let file = tree.create_node(NodeKind::File, "f").unwrap();
        let dir = tree.create_node(NodeKind::Dir, "d").unwrap();
        assert_eq!(tree.link_child(file, dir), Err(TreeError::NotADirectory));
        assert_eq!(tree.link_child(ROOT, 40), Err(TreeError::InvalidIndex(40)));
        assert_eq!(tree.link_child(dir, ROOT), Err(TreeError::InvalidIndex(ROOT)));
        assert_eq!(tree.link_child(dir, dir), Err(TreeError::WouldCycle));
    }

    #[test]
    fn test_link_rejects_ancestor_cycle() {
        let mut tree = VirtualFileTree::new();
        let outer = tree.create_at(NodeKind::Dir, "outer").unwrap();
        let inner = tree.create_at(NodeKind::Dir, "outer/inner").unwrap();
        tree.unlink_child(ROOT, outer).unwrap();
        assert_eq!(tree.link_child(inner, outer), Err(TreeError::WouldCycle));
    }

    #[test]
    fn test_set_current_dir() {
        let mut tree = VirtualFileTree::new();
        let dir = tree.create_at(NodeKind::Dir, "docs").unwrap();
        let file = tree.create_at(NodeKind::File, "a.txt").unwrap();
        assert_eq!(tree.set_current_dir(file), Err(TreeError::NotADirectory));
        assert_eq!(tree.set_current_dir(50), Err(TreeError::InvalidIndex(50)));
        tree.set_current_dir(dir).unwrap();
        assert_eq!(tree.current_dir(), dir);
    }

    #[test]
    fn test_resolve_paths() {
        let mut tree = VirtualFileTree::new();
        let docs = tree.create_at(NodeKind::Dir, "docs").unwrap();
        let notes = tree.create_at(NodeKind::Dir, "/docs/notes").unwrap();
        let todo = tree.create_at(NodeKind::File, "docs/notes/todo.txt").unwrap();

        assert_eq!(tree.resolve("/"), Ok(ROOT));
        assert_eq!(tree.resolve("docs/notes"), Ok(notes));
        assert_eq!(tree.resolve("/docs/notes/todo.txt"), Ok(todo));

        tree.change_dir("docs/notes").unwrap();
        assert_eq!(tree.resolve(".."), Ok(docs));
        assert_eq!(tree.resolve("../.."), Ok(ROOT));
        assert_eq!(tree.resolve("../../.."), Ok(ROOT));
        assert_eq!(tree.resolve("todo.txt"), Ok(todo));
        assert_eq!(tree.resolve("todo.txt/x"), Err(TreeError::NotADirectory));
        assert_eq!(tree.resolve("missing"), Err(TreeError::NotFound));
        assert_eq!(tree.path_of(tree.current_dir()), "/docs/notes");
    }

    #[test]
    fn test_create_at_duplicate_and_missing_parent() {
        let mut tree = VirtualFileTree::new();
        tree.create_at(NodeKind::Dir, "docs").unwrap();
        assert_eq!(tree.create_at(NodeKind::File, "docs"), Err(TreeError::AlreadyExists));
        assert_eq!(tree.create_at(NodeKind::File, "nope/a"), Err(TreeError::NotFound));
        assert_eq!(tree.create_at(NodeKind::File, ".."), Err(TreeError::InvalidName));
    }

    #[test]
    fn test_remove_at() {
        let mut tree = VirtualFileTree::new();
        tree.create_at(NodeKind::Dir, "docs").unwrap();
        tree.create_at(NodeKind::File, "docs/a.txt").unwrap();

        assert_eq!(tree.remove_at("docs"), Err(TreeError::NotEmpty));
        assert_eq!(tree.remove_at("missing.txt"), Err(TreeError::NotFound));
        tree.remove_at("docs/a.txt").unwrap();
        tree.remove_at("docs").unwrap();
        assert_eq!(tree.children(ROOT).count(), 0);
        assert_eq!(tree.live_count(), 1);
    }

    #[test]
    fn test_deleting_current_dir_falls_back_to_root() {
        let mut tree = VirtualFileTree::new();
        let dir = tree.create_at(NodeKind::Dir, "tmp").unwrap();
        tree.set_current_dir(dir).unwrap();
        tree.remove_at("/tmp").unwrap();
        assert_eq!(tree.current_dir(), ROOT);
    }
}
