//! Expanded/collapsed flags for outline rows.
//!
//! Held in memory only; a fresh session starts fully expanded.

use std::collections::HashMap;

use crate::domain::{NodeType, Outline, TreePath};

/// Collapsed flag per node id; ids not present are expanded.
#[derive(Debug, Clone, Default)]
pub struct CollapseState {
    collapsed: HashMap<String, bool>,
}

/// One row the view should draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    pub path: TreePath,
    pub depth: usize,
    pub id: String,
    pub title: String,
    pub node_type: NodeType,
    pub child_count: usize,
    pub collapsed: bool,
}

impl CollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.collapsed.get(id).copied().unwrap_or(false)
    }

    pub fn set_collapsed(&mut self, id: &str, collapsed: bool) {
        self.collapsed.insert(id.to_string(), collapsed);
    }

    /// Flip the flag for `id`; returns the new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        let next = !self.is_collapsed(id);
        self.set_collapsed(id, next);
        next
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }

    /// Collapse every node that has children.
    pub fn collapse_all(&mut self, outline: &Outline) {
        for (path, _, node) in outline.walk() {
            if outline.child_count(&path).unwrap_or(0) > 0 {
                self.collapsed.insert(node.id.clone(), true);
            }
        }
    }

    /// Forget flags for ids no longer in `outline`.
    pub fn retain_present(&mut self, outline: &Outline) {
        self.collapsed.retain(|id, _| outline.get_by_id(id).is_some());
    }

    /// Rows in display order, skipping descendants of collapsed nodes.
    pub fn visible_rows(&self, outline: &Outline) -> Vec<VisibleRow> {
        let mut rows = Vec::new();
        let mut hidden_under: Option<TreePath> = None;
        for (path, depth, node) in outline.walk() {
            if let Some(hidden) = &hidden_under {
                if path.is_within(hidden) {
                    continue;
                }
                hidden_under = None;
            }
            let collapsed = self.is_collapsed(&node.id);
            let child_count = outline.child_count(&path).unwrap_or(0);
            if collapsed && child_count > 0 {
                hidden_under = Some(path.clone());
            }
            rows.push(VisibleRow {
                path,
                depth,
                id: node.id.clone(),
                title: node.title.clone(),
                node_type: node.node_type,
                child_count,
                collapsed,
            });
        }
        rows
    }
}
