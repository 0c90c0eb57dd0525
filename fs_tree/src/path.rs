//! Path parsing
//!
//! Paths are `/`-separated. A leading `/` starts at the root, anything else
//! starts at the current directory. Empty components and `.` are skipped;
//! `..` moves to the parent (the root is its own parent).

use crate::node::MAX_NAME_LEN;

/// A single step of a parsed path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component<'a> {
    Parent,
    Name(&'a str),
}

/// Path resolver
///
/// Handles splitting paths into components and validating names.
pub struct PathResolver;

impl PathResolver {
    pub fn is_absolute(path: &str) -> bool {
        path.starts_with('/')
    }

    /// Iterates the meaningful components of `path`
    ///
    /// ```
    /// use fs_tree::path::{Component, PathResolver};
    ///
    /// let parts: Vec<_> = PathResolver::components("/docs/./notes/..").collect();
    /// assert_eq!(parts, vec![Component::Name("docs"), Component::Name("notes"), Component::Parent]);
    /// ```
    pub fn components(path: &str) -> impl Iterator<Item = Component<'_>> {
        path.split('/')
            .filter(|part| !part.is_empty() && *part != ".")
            .map(|part| {
                if part == ".." {
                    Component::Parent
                } else {
                    Component::Name(part)
                }
            })
    }

    /// Splits `path` into its directory part and final name
    ///
    /// Trailing slashes are ignored. The directory part is `None` when the
    /// path has a single component, and `Some("/")` for entries of the root.
    pub fn split_last(path: &str) -> (Option<&str>, &str) {
        let trimmed = path.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(0) => (Some("/"), &trimmed[1..]),
            Some(pos) => (Some(&trimmed[..pos]), &trimmed[pos + 1..]),
            None => (None, trimmed),
        }
    }

    /// Validates a single entry name
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= MAX_NAME_LEN
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\0')
    }
}
