//! Tree and image errors

use crate::node::NodeIndex;
use thiserror::Error;

/// Errors from tree operations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// Name is empty, too long, or not a plain component
    #[error("invalid name")]
    InvalidName,

    /// Node table or name pool is exhausted
    #[error("no space left")]
    NoSpace,

    /// Index is out of range or refers to a free slot
    #[error("invalid node index {0}")]
    InvalidIndex(NodeIndex),

    /// Only files and directories can be created
    #[error("invalid node kind")]
    InvalidKind,

    /// Child is not linked under the given parent, or a path does not exist
    #[error("not found")]
    NotFound,

    #[error("not a directory")]
    NotADirectory,

    #[error("cannot delete root")]
    CannotDeleteRoot,

    #[error("already exists")]
    AlreadyExists,

    #[error("directory not empty")]
    NotEmpty,

    /// Linking would make a node its own ancestor
    #[error("would create a cycle")]
    WouldCycle,
}

/// Errors from decoding a persisted image
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ImageError {
    #[error("image truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("node count {0} is outside the node table")]
    BadNodeCount(usize),

    #[error("name pool length {0} exceeds the pool size")]
    NamePoolOverflow(usize),

    #[error("node {index} has unknown kind {kind}")]
    BadKind { index: usize, kind: u8 },

    #[error("node {0} is corrupt")]
    CorruptNode(usize),

    #[error("root node is not a directory")]
    BadRoot,

    #[error("current directory {0} is not a live directory")]
    BadCurrentDir(NodeIndex),
}
