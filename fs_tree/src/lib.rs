//! # Virtual File Tree
//!
//! An in-memory hierarchical namespace addressed by small integer indices.
//!
//! ## Design
//!
//! - Nodes live in a fixed table; index 0 is the root directory and doubles
//!   as the "none" sentinel for child and sibling links
//! - Children form a singly linked list through `next_sibling`, newest first
//! - Names are appended to a shared pool and never reclaimed
//! - Deleting a node only frees its slot; it does not cascade
//! - The whole tree round-trips through a fixed-size binary image
//!
//! Nothing here allocates after construction.

pub mod error;
pub mod image;
pub mod node;
pub mod path;
pub mod tree;

pub use error::{ImageError, TreeError};
pub use image::{IMAGE_SIZE, NODE_RECORD_SIZE};
pub use node::{FileNode, NodeIndex, NodeKind, MAX_NAME_LEN, MAX_NODES, NAME_POOL_SIZE, ROOT};
pub use path::{Component, PathResolver};
pub use tree::{Children, VirtualFileTree};
