//! Arena-backed outline with depth-typed nodes.
//!
//! Nodes live in a generational arena and refer to each other by arena index; a
//! separate id → index map gives stable addressing by node id. Path-based
//! operations resolve their paths up front, so a move reads the drop target
//! against the tree as it is *after* the dragged node has been detached without
//! any index arithmetic.
//!
//! Every operation is all-or-nothing: a stale path, a refused nesting or a depth
//! overflow leaves the outline exactly as it was and is reported as `None`/`false`.

use std::collections::{BTreeMap, HashMap};

use generational_arena::{Arena, Index};
use tracing::{debug, instrument, warn};

use crate::domain::entities::{derived_node_id, new_node_id, retype_subtree, MAX_DEPTH};
use crate::domain::{DomainError, EditorVariant, LessonDetails, NodeType, TreeNode, TreePath};

/// Payload of one outline node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    pub id: String,
    pub title: String,
    pub node_type: NodeType,
    pub lesson: LessonDetails,
}

#[derive(Debug)]
struct Slot {
    node: OutlineNode,
    parent: Option<Index>,
    children: Vec<Index>,
}

/// A resolved path: the node, the sibling list holding it and its position there.
#[derive(Debug)]
pub struct Located<'a> {
    pub node: &'a OutlineNode,
    /// Ids of the node and its siblings, in order.
    pub siblings: Vec<&'a str>,
    pub index: usize,
}

/// Where the explicit "Add" action puts a new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Last child of the target.
    AsChild,
    /// Sibling immediately before the target.
    Before,
    /// Sibling immediately after the target.
    After,
}

/// Node counts per kind plus total lesson time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineStats {
    pub counts: BTreeMap<NodeType, usize>,
    pub total_minutes: u64,
    pub max_depth: usize,
}

/// Depth-typed outline of sections, units, topics/modules and lessons.
#[derive(Debug)]
pub struct Outline {
    variant: EditorVariant,
    arena: Arena<Slot>,
    roots: Vec<Index>,
    ids: HashMap<String, Index>,
}

impl Outline {
    pub fn new(variant: EditorVariant) -> Self {
        Self {
            variant,
            arena: Arena::new(),
            roots: Vec::new(),
            ids: HashMap::new(),
        }
    }

    /// Build an outline from its exchange form.
    ///
    /// Kinds are re-stamped by depth and a repeated id is replaced by a derived one,
    /// so whatever was stored comes back satisfying both invariants.
    #[instrument(level = "debug", skip(nodes), fields(count = nodes.len()))]
    pub fn from_nodes(variant: EditorVariant, nodes: Vec<TreeNode>) -> Result<Self, DomainError> {
        let mut outline = Self::new(variant);
        for node in nodes {
            let node = retype_subtree(variant, node, 0)?;
            let node = outline.dedupe_ids(node);
            let idx = outline.alloc(node, None);
            outline.roots.push(idx);
        }
        Ok(outline)
    }

    pub fn variant(&self) -> EditorVariant {
        self.variant
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of nodes in the whole outline.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Exchange form of the whole outline, top-level nodes in order.
    pub fn to_nodes(&self) -> Vec<TreeNode> {
        self.roots.iter().map(|&idx| self.export(idx)).collect()
    }

    /// Exchange form of the subtree at `path`.
    pub fn subtree(&self, path: &TreePath) -> Option<TreeNode> {
        self.resolve(path).map(|idx| self.export(idx))
    }

    pub fn get(&self, path: &TreePath) -> Option<&OutlineNode> {
        self.resolve(path).map(|idx| &self.arena[idx].node)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&OutlineNode> {
        self.ids.get(id).map(|&idx| &self.arena[idx].node)
    }

    /// Child count of the node at `path` (top-level count for the root path).
    pub fn child_count(&self, path: &TreePath) -> Option<usize> {
        if path.is_root() {
            return Some(self.roots.len());
        }
        self.resolve(path).map(|idx| self.arena[idx].children.len())
    }

    /// Resolve `path` to the node, its sibling list and its index in that list.
    pub fn node_at_path(&self, path: &TreePath) -> Option<Located<'_>> {
        let idx = self.resolve(path)?;
        let index = path.last()?;
        let siblings = self
            .siblings_of(self.arena[idx].parent)
            .iter()
            .map(|&s| self.arena[s].node.id.as_str())
            .collect();
        Some(Located {
            node: &self.arena[idx].node,
            siblings,
            index,
        })
    }

    /// Current path of the node with `id`.
    pub fn locate(&self, id: &str) -> Option<TreePath> {
        self.ids.get(id).map(|&idx| self.path_of(idx))
    }

    /// Detach and return the subtree at `path`; later siblings shift down by one.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_at_path(&mut self, path: &TreePath) -> Option<TreeNode> {
        let idx = self.resolve(path)?;
        let removed = self.export(idx);
        self.detach(idx);
        self.free(idx);
        debug!("removed '{}' ({} nodes)", removed.title, removed.subtree_len());
        Some(removed)
    }

    /// Insert `node` at position `index` under `parent` (the root path for top level).
    ///
    /// The subtree is stamped with the kinds its new depth implies. Refused when the
    /// parent does not resolve, `index` is past the end, an id is already present or
    /// the result would nest too deep.
    #[instrument(level = "debug", skip(self, node))]
    pub fn insert_at_path(&mut self, parent: &TreePath, index: usize, node: TreeNode) -> bool {
        let parent_idx = if parent.is_root() {
            None
        } else {
            match self.resolve(parent) {
                Some(idx) => Some(idx),
                None => return false,
            }
        };
        if index > self.siblings_of(parent_idx).len() {
            return false;
        }
        if self.any_id_taken(&node) {
            warn!("insert refused: id already present in outline");
            return false;
        }
        let depth = parent.indices().len();
        let node = match retype_subtree(self.variant, node, depth) {
            Ok(node) => node,
            Err(e) => {
                warn!("insert refused: {}", e);
                return false;
            }
        };
        let idx = self.alloc(node, parent_idx);
        self.siblings_of_mut(parent_idx).insert(index, idx);
        true
    }

    /// Move the node at `drag` to be the last child of the node at `drop`.
    ///
    /// Returns the new path of the moved node.
    #[instrument(level = "debug", skip(self))]
    pub fn move_as_child(&mut self, drag: &TreePath, drop: &TreePath) -> Option<TreePath> {
        let (drag_idx, drop_idx) = self.resolve_move(drag, drop)?;
        let depth = self.depth_of(drop_idx) + 1;
        if !self.fits_at(drag_idx, depth) {
            return None;
        }
        self.detach(drag_idx);
        self.arena[drag_idx].parent = Some(drop_idx);
        self.arena[drop_idx].children.push(drag_idx);
        self.restamp(drag_idx, depth);
        Some(self.path_of(drag_idx))
    }

    /// Move the node at `drag` to sit immediately before the node at `drop`.
    #[instrument(level = "debug", skip(self))]
    pub fn move_before(&mut self, drag: &TreePath, drop: &TreePath) -> Option<TreePath> {
        self.move_beside(drag, drop, 0)
    }

    /// Move the node at `drag` to sit immediately after the node at `drop`.
    #[instrument(level = "debug", skip(self))]
    pub fn move_after(&mut self, drag: &TreePath, drop: &TreePath) -> Option<TreePath> {
        self.move_beside(drag, drop, 1)
    }

    /// Move the node at `drag` to the end of the top level as a section.
    ///
    /// Only the structure editor has a top-level drop target.
    #[instrument(level = "debug", skip(self))]
    pub fn make_root_section(&mut self, drag: &TreePath) -> Option<TreePath> {
        if !self.variant.has_root_drop_zone() {
            return None;
        }
        let idx = self.resolve(drag)?;
        if !self.fits_at(idx, 0) {
            return None;
        }
        self.detach(idx);
        self.arena[idx].parent = None;
        self.roots.push(idx);
        self.restamp(idx, 0);
        Some(self.path_of(idx))
    }

    /// Explicit "Add X" action: append a new `kind` node under `parent`.
    ///
    /// Only the kind the parent's rung admits may be added (top level admits
    /// sections). A blank title falls back to the kind's default label.
    #[instrument(level = "debug", skip(self))]
    pub fn add_child(&mut self, parent: &TreePath, kind: NodeType, title: &str) -> Option<TreePath> {
        let parent_kind = if parent.is_root() {
            None
        } else {
            Some(self.get(parent)?.node_type)
        };
        if self.variant.child_type(parent_kind) != Some(kind) {
            debug!("add refused: {:?} does not accept {}", parent_kind, kind);
            return None;
        }
        let title = match title.trim() {
            "" => kind.default_title(),
            t => t,
        };
        let index = self.child_count(parent)?;
        let node = TreeNode::new(title, kind);
        self.insert_at_path(parent, index, node)
            .then(|| parent.child(index))
    }

    /// Add a new node of the kind the target's depth implies, next to or under it.
    ///
    /// Used by keyboard-driven editing where the user adds "a sibling here" rather
    /// than choosing a kind. Child placement follows the same gate as [`add_child`].
    ///
    /// [`add_child`]: Outline::add_child
    pub fn add_relative(&mut self, target: &TreePath, placement: Placement, title: &str) -> Option<TreePath> {
        match placement {
            Placement::AsChild => {
                let kind = self.variant.child_type(Some(self.get(target)?.node_type))?;
                self.add_child(target, kind, title)
            }
            Placement::Before | Placement::After => {
                self.resolve(target)?;
                let parent = target.parent()?;
                let offset = usize::from(placement == Placement::After);
                let index = target.last()? + offset;
                let kind = self.variant.type_for_depth(target.depth());
                let title = match title.trim() {
                    "" => kind.default_title(),
                    t => t,
                };
                self.insert_at_path(&parent, index, TreeNode::new(title, kind))
                    .then(|| parent.child(index))
            }
        }
    }

    /// Set the title of the node at `path`; blank titles are ignored.
    pub fn rename(&mut self, path: &TreePath, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        match self.resolve(path) {
            Some(idx) => {
                self.arena[idx].node.title = title.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove the subtree at `path` if `confirm` agrees when shown the node.
    pub fn delete<F>(&mut self, path: &TreePath, confirm: F) -> Option<TreeNode>
    where
        F: FnOnce(&OutlineNode) -> bool,
    {
        let node = self.get(path)?;
        if !confirm(node) {
            debug!("delete of '{}' cancelled", node.title);
            return None;
        }
        self.remove_at_path(path)
    }

    /// Insert a copy of the subtree at `path` right after it.
    ///
    /// Every node in the copy gets a new id derived from its original.
    #[instrument(level = "debug", skip(self))]
    pub fn duplicate(&mut self, path: &TreePath) -> Option<TreePath> {
        let copy = reassign_ids(self.subtree(path)?, &derived_node_id);
        let parent = path.parent()?;
        let index = path.last()? + 1;
        self.insert_at_path(&parent, index, copy)
            .then(|| parent.child(index))
    }

    /// Replace the lesson fields of the lesson at `path`.
    pub fn update_lesson(&mut self, path: &TreePath, details: LessonDetails) -> bool {
        match self.resolve(path) {
            Some(idx) if self.arena[idx].node.node_type == NodeType::Lesson => {
                self.arena[idx].node.lesson = details;
                true
            }
            _ => false,
        }
    }

    /// Swap the whole outline for `nodes`.
    pub fn replace_all(&mut self, nodes: Vec<TreeNode>) -> Result<(), DomainError> {
        *self = Self::from_nodes(self.variant, nodes)?;
        Ok(())
    }

    /// Append `nodes` at the top level, giving fresh ids to any that collide.
    ///
    /// Returns how many top-level nodes were added.
    pub fn merge_from(&mut self, nodes: Vec<TreeNode>) -> Result<usize, DomainError> {
        let retyped = nodes
            .into_iter()
            .map(|n| retype_subtree(self.variant, n, 0))
            .collect::<Result<Vec<_>, _>>()?;
        let count = retyped.len();
        for node in retyped {
            let node = self.dedupe_ids(node);
            let idx = self.alloc(node, None);
            self.roots.push(idx);
        }
        Ok(count)
    }

    /// True when `inner` is `outer` or one of its descendants.
    pub fn is_within(&self, inner: &TreePath, outer: &TreePath) -> bool {
        match (self.resolve(inner), self.resolve(outer)) {
            (Some(i), Some(o)) => self.is_ancestor_or_self(o, i),
            _ => false,
        }
    }

    /// True when the subtree at `path` could sit at `depth` without passing the
    /// nesting limit.
    pub fn fits_at_depth(&self, path: &TreePath, depth: usize) -> bool {
        self.resolve(path)
            .is_some_and(|idx| depth + self.height_of(idx) <= MAX_DEPTH)
    }

    /// Pre-order walk: `(path, depth, node)` for every node.
    pub fn walk(&self) -> OutlineIter<'_> {
        OutlineIter::new(self)
    }

    pub fn stats(&self) -> OutlineStats {
        let mut stats = OutlineStats::default();
        for (_, depth, node) in self.walk() {
            *stats.counts.entry(node.node_type).or_default() += 1;
            stats.max_depth = stats.max_depth.max(depth);
            if node.node_type == NodeType::Lesson {
                stats.total_minutes += u64::from(node.lesson.duration.unwrap_or(0));
            }
        }
        stats
    }

    // ------------------------------------------------------------
    // internals
    // ------------------------------------------------------------

    fn resolve(&self, path: &TreePath) -> Option<Index> {
        let (&first, rest) = path.indices().split_first()?;
        let mut current = *self.roots.get(first)?;
        for &i in rest {
            current = *self.arena.get(current)?.children.get(i)?;
        }
        Some(current)
    }

    fn resolve_move(&self, drag: &TreePath, drop: &TreePath) -> Option<(Index, Index)> {
        let drag_idx = self.resolve(drag)?;
        let drop_idx = self.resolve(drop)?;
        if self.is_ancestor_or_self(drag_idx, drop_idx) {
            debug!("move refused: target inside dragged subtree");
            return None;
        }
        Some((drag_idx, drop_idx))
    }

    fn move_beside(&mut self, drag: &TreePath, drop: &TreePath, offset: usize) -> Option<TreePath> {
        let (drag_idx, drop_idx) = self.resolve_move(drag, drop)?;
        let parent = self.arena[drop_idx].parent;
        let depth = self.depth_of(drop_idx);
        if !self.fits_at(drag_idx, depth) {
            return None;
        }
        self.detach(drag_idx);
        let position = self
            .siblings_of(parent)
            .iter()
            .position(|&s| s == drop_idx)?;
        self.arena[drag_idx].parent = parent;
        self.siblings_of_mut(parent).insert(position + offset, drag_idx);
        self.restamp(drag_idx, depth);
        Some(self.path_of(drag_idx))
    }

    fn is_ancestor_or_self(&self, ancestor: Index, mut node: Index) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.arena.get(node).and_then(|s| s.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn depth_of(&self, mut idx: Index) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.arena[idx].parent {
            depth += 1;
            idx = parent;
        }
        depth
    }

    fn path_of(&self, mut idx: Index) -> TreePath {
        let mut indices = Vec::new();
        loop {
            let parent = self.arena[idx].parent;
            let position = self
                .siblings_of(parent)
                .iter()
                .position(|&s| s == idx)
                .unwrap_or_default();
            indices.push(position);
            match parent {
                Some(p) => idx = p,
                None => break,
            }
        }
        indices.reverse();
        TreePath::new(indices)
    }

    fn height_of(&self, idx: Index) -> usize {
        let mut height = 0;
        let mut stack = vec![(idx, 0usize)];
        while let Some((current, level)) = stack.pop() {
            height = height.max(level);
            for &child in &self.arena[current].children {
                stack.push((child, level + 1));
            }
        }
        height
    }

    fn fits_at(&self, idx: Index, depth: usize) -> bool {
        let fits = depth + self.height_of(idx) <= MAX_DEPTH;
        if !fits {
            warn!("move refused: nesting would exceed {} levels", MAX_DEPTH);
        }
        fits
    }

    fn siblings_of(&self, parent: Option<Index>) -> &Vec<Index> {
        match parent {
            Some(p) => &self.arena[p].children,
            None => &self.roots,
        }
    }

    fn siblings_of_mut(&mut self, parent: Option<Index>) -> &mut Vec<Index> {
        match parent {
            Some(p) => &mut self.arena[p].children,
            None => &mut self.roots,
        }
    }

    fn detach(&mut self, idx: Index) {
        let parent = self.arena[idx].parent;
        self.siblings_of_mut(parent).retain(|&s| s != idx);
        self.arena[idx].parent = None;
    }

    fn restamp(&mut self, idx: Index, depth: usize) {
        let variant = self.variant;
        let mut stack = vec![(idx, depth)];
        while let Some((current, level)) = stack.pop() {
            let slot = &mut self.arena[current];
            slot.node.node_type = variant.type_for_depth(level);
            stack.extend(slot.children.iter().map(|&c| (c, level + 1)));
        }
    }

    fn alloc(&mut self, node: TreeNode, parent: Option<Index>) -> Index {
        let TreeNode {
            id,
            title,
            node_type,
            lesson,
            children,
        } = node;
        let idx = self.arena.insert(Slot {
            node: OutlineNode {
                id: id.clone(),
                title,
                node_type,
                lesson,
            },
            parent,
            children: Vec::with_capacity(children.len()),
        });
        self.ids.insert(id, idx);
        for child in children {
            let child_idx = self.alloc(child, Some(idx));
            self.arena[idx].children.push(child_idx);
        }
        idx
    }

    fn free(&mut self, idx: Index) {
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(slot) = self.arena.remove(current) {
                self.ids.remove(&slot.node.id);
                stack.extend(slot.children);
            }
        }
    }

    fn export(&self, idx: Index) -> TreeNode {
        let slot = &self.arena[idx];
        TreeNode {
            id: slot.node.id.clone(),
            title: slot.node.title.clone(),
            node_type: slot.node.node_type,
            lesson: slot.node.lesson.clone(),
            children: slot.children.iter().map(|&c| self.export(c)).collect(),
        }
    }

    fn any_id_taken(&self, node: &TreeNode) -> bool {
        let mut seen = std::collections::HashSet::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if self.ids.contains_key(&current.id) || !seen.insert(current.id.as_str()) {
                return true;
            }
            stack.extend(current.children.iter());
        }
        false
    }

    fn dedupe_ids(&self, node: TreeNode) -> TreeNode {
        let mut seen = std::collections::HashSet::new();
        reassign_ids_where(node, &mut |id: &str| {
            if self.ids.contains_key(id) || !seen.insert(id.to_string()) {
                warn!("duplicate node id '{}' replaced", id);
                Some(if id.is_empty() {
                    new_node_id()
                } else {
                    derived_node_id(id)
                })
            } else {
                None
            }
        })
    }
}

/// Give every node in `node` the id `fresh` derives from its old one.
fn reassign_ids(node: TreeNode, fresh: &dyn Fn(&str) -> String) -> TreeNode {
    reassign_ids_where(node, &mut |id: &str| Some(fresh(id)))
}

fn reassign_ids_where(
    mut node: TreeNode,
    replace: &mut dyn FnMut(&str) -> Option<String>,
) -> TreeNode {
    let mut stack: Vec<&mut TreeNode> = vec![&mut node];
    while let Some(current) = stack.pop() {
        if let Some(id) = replace(&current.id) {
            current.id = id;
        }
        stack.extend(current.children.iter_mut());
    }
    node
}

/// Pre-order iterator over an [`Outline`].
pub struct OutlineIter<'a> {
    outline: &'a Outline,
    stack: Vec<(Index, TreePath)>,
}

impl<'a> OutlineIter<'a> {
    fn new(outline: &'a Outline) -> Self {
        // Push in reverse so the first root comes out first
        let stack = outline
            .roots
            .iter()
            .enumerate()
            .rev()
            .map(|(i, &idx)| (idx, TreePath::new(vec![i])))
            .collect();
        Self { outline, stack }
    }
}

impl<'a> Iterator for OutlineIter<'a> {
    type Item = (TreePath, usize, &'a OutlineNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, path) = self.stack.pop()?;
        let slot = self.outline.arena.get(idx)?;
        for (i, &child) in slot.children.iter().enumerate().rev() {
            self.stack.push((child, path.child(i)));
        }
        let depth = path.depth();
        Some((path, depth, &slot.node))
    }
}
