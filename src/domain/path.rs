//! Sibling-index paths.
//!
//! A path lists the position of a node among its siblings at every level, starting
//! from the top-level list. Paths are derived from the current shape of the outline
//! and go stale after any structural change.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

use crate::domain::DomainError;

/// Location of a node as sibling indices from the top level, e.g. `[1, 0, 2]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreePath(Vec<usize>);

impl TreePath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// The empty path, naming the top-level list itself.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Nesting depth of the addressed node (top-level nodes are depth 0).
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Position among siblings, `None` for the empty path.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Path of the containing node; `Some(root)` for top-level nodes, `None` for root.
    pub fn parent(&self) -> Option<TreePath> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn child(&self, index: usize) -> TreePath {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// True when `self` equals `other` or lies inside its subtree.
    pub fn is_within(&self, other: &TreePath) -> bool {
        self.0.starts_with(&other.0)
    }
}

impl From<Vec<usize>> for TreePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        write!(f, "{}", self.0.iter().join("."))
    }
}

impl FromStr for TreePath {
    type Err = DomainError;

    /// Parses `1.0.2`; `/` or an empty string is the top-level list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "/" {
            return Ok(Self::root());
        }
        s.split('.')
            .map(|part| {
                part.trim()
                    .parse::<usize>()
                    .map_err(|_| DomainError::InvalidPath(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}
