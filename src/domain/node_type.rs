//! Node kinds and the depth → kind rule.
//!
//! A node's kind is never chosen freely: it follows from how deep the node sits in
//! the outline. Each editor variant has its own fixed ladder of kinds; depth 0 is
//! always a section and anything nested past the last rung keeps the deepest kind.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of an outline node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Section,
    Unit,
    Module,
    Topic,
    Lesson,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Section => "section",
            NodeType::Unit => "unit",
            NodeType::Module => "module",
            NodeType::Topic => "topic",
            NodeType::Lesson => "lesson",
        }
    }

    /// Title given to a node added without an explicit name.
    pub fn default_title(self) -> &'static str {
        match self {
            NodeType::Section => "New Section",
            NodeType::Unit => "New Unit",
            NodeType::Module => "New Module",
            NodeType::Topic => "New Topic",
            NodeType::Lesson => "New Lesson",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const STRUCTURE_LADDER: [NodeType; 3] = [NodeType::Section, NodeType::Unit, NodeType::Module];
const CURRICULUM_LADDER: [NodeType; 4] = [
    NodeType::Section,
    NodeType::Unit,
    NodeType::Topic,
    NodeType::Lesson,
];

/// Which outline editor a tree belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorVariant {
    /// Program/level/paper structure: section → unit → module.
    Structure,
    /// Per-course curriculum: section → unit → topic → lesson.
    Curriculum,
}

impl EditorVariant {
    /// The ordered ladder of kinds, shallowest first.
    pub fn ladder(self) -> &'static [NodeType] {
        match self {
            EditorVariant::Structure => &STRUCTURE_LADDER,
            EditorVariant::Curriculum => &CURRICULUM_LADDER,
        }
    }

    /// Kind implied by `depth`, clamped at the deepest rung.
    pub fn type_for_depth(self, depth: usize) -> NodeType {
        let ladder = self.ladder();
        ladder[depth.min(ladder.len() - 1)]
    }

    /// Kind the explicit "Add" action creates under `parent` (`None` = top level).
    ///
    /// Returns `None` when the parent kind accepts no directly-added children.
    pub fn child_type(self, parent: Option<NodeType>) -> Option<NodeType> {
        let ladder = self.ladder();
        match parent {
            None => ladder.first().copied(),
            Some(kind) => {
                let pos = ladder.iter().position(|k| *k == kind)?;
                ladder.get(pos + 1).copied()
            }
        }
    }

    /// Whether the variant has a dedicated top-level drop zone.
    pub fn has_root_drop_zone(self) -> bool {
        matches!(self, EditorVariant::Structure)
    }
}

impl fmt::Display for EditorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorVariant::Structure => f.write_str("structure"),
            EditorVariant::Curriculum => f.write_str("curriculum"),
        }
    }
}
