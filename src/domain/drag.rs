//! Drag-and-drop interpretation.
//!
//! Every rendered row offers three drop regions: a thin strip above it, the row
//! body and a thin strip below it. The structure editor also has a top-level
//! region. Which outline operation a release turns into depends on the region and,
//! for the strips, on how far right of the row's left edge the pointer is.

use tracing::debug;

use crate::domain::{NodeType, Outline, TreePath};

/// Default horizontal offset (px) past which a strip drop nests instead of reorders.
pub const DEFAULT_NEST_THRESHOLD: f64 = 20.0;

/// Region of a row (or the top-level target) under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropZone {
    Above,
    Body,
    Below,
    Root,
}

/// Outline operation a drop resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropAction {
    /// Last child of the target row's node.
    Nest,
    /// Sibling just before the target.
    Before,
    /// Sibling just after the target.
    After,
    /// New top-level section.
    Root,
}

/// Pure geometry: map a pointer position within a zone to an action.
pub fn classify_drop(zone: DropZone, pointer_x: f64, row_left: f64, threshold: f64) -> DropAction {
    let indented = pointer_x - row_left > threshold;
    match zone {
        DropZone::Body => DropAction::Nest,
        DropZone::Root => DropAction::Root,
        DropZone::Above if indented => DropAction::Nest,
        DropZone::Above => DropAction::Before,
        DropZone::Below if indented => DropAction::Nest,
        DropZone::Below => DropAction::After,
    }
}

/// Pointer position over a drop region.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTarget {
    /// Row under the pointer; ignored for [`DropZone::Root`].
    pub path: TreePath,
    pub zone: DropZone,
    pub pointer_x: f64,
    pub row_left: f64,
}

impl DropTarget {
    pub fn new(path: TreePath, zone: DropZone) -> Self {
        Self {
            path,
            zone,
            pointer_x: 0.0,
            row_left: 0.0,
        }
    }

    pub fn root() -> Self {
        Self::new(TreePath::root(), DropZone::Root)
    }

    pub fn at(mut self, pointer_x: f64, row_left: f64) -> Self {
        self.pointer_x = pointer_x;
        self.row_left = row_left;
        self
    }
}

/// What a drop would do, shown while hovering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropPreview {
    pub action: DropAction,
    pub depth: usize,
    /// Kind the dragged node would become.
    pub resulting_type: NodeType,
}

/// Why a drop does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropRejection {
    NoActiveDrag,
    /// The dragged node no longer exists.
    SourceGone,
    /// The target row no longer exists.
    TargetGone,
    /// Target is the dragged node or inside its subtree.
    IntoOwnSubtree,
    /// The editor has no top-level drop target.
    RootZoneUnavailable,
    /// The dragged subtree would nest past the depth limit.
    TooDeep,
    /// The outline refused the move.
    Refused,
}

/// Result of releasing a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Applied; the moved node's new path.
    Moved(TreePath),
    Rejected(DropRejection),
}

/// Tracks one drag gesture at a time and turns releases into outline moves.
///
/// The dragged node is remembered by id, not path, so a gesture survives nothing
/// but itself: if the node disappears before release the drop is rejected.
#[derive(Debug, Clone)]
pub struct DragController {
    threshold: f64,
    dragging: Option<String>,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(DEFAULT_NEST_THRESHOLD)
    }
}

impl DragController {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            dragging: None,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Id of the node being dragged.
    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    /// Start dragging the node at `path`. Replaces any gesture in progress.
    pub fn begin(&mut self, outline: &Outline, path: &TreePath) -> bool {
        self.dragging = outline.get(path).map(|n| n.id.clone());
        self.dragging.is_some()
    }

    pub fn cancel(&mut self) {
        self.dragging = None;
    }

    /// What releasing over `target` would do, without doing it.
    pub fn hover(&self, outline: &Outline, target: &DropTarget) -> Result<DropPreview, DropRejection> {
        let id = self.dragging.as_deref().ok_or(DropRejection::NoActiveDrag)?;
        let source = outline.locate(id).ok_or(DropRejection::SourceGone)?;
        let action = classify_drop(target.zone, target.pointer_x, target.row_left, self.threshold);

        let depth = match action {
            DropAction::Root => {
                if !outline.variant().has_root_drop_zone() {
                    return Err(DropRejection::RootZoneUnavailable);
                }
                0
            }
            DropAction::Nest | DropAction::Before | DropAction::After => {
                outline.get(&target.path).ok_or(DropRejection::TargetGone)?;
                if target.path.is_within(&source) {
                    return Err(DropRejection::IntoOwnSubtree);
                }
                match action {
                    DropAction::Nest => target.path.depth() + 1,
                    _ => target.path.depth(),
                }
            }
        };
        if !outline.fits_at_depth(&source, depth) {
            return Err(DropRejection::TooDeep);
        }

        Ok(DropPreview {
            action,
            depth,
            resulting_type: outline.variant().type_for_depth(depth),
        })
    }

    /// Release over `target`: apply the move and end the gesture.
    pub fn drop(&mut self, outline: &mut Outline, target: &DropTarget) -> DropOutcome {
        let preview = match self.hover(outline, target) {
            Ok(preview) => preview,
            Err(rejection) => {
                debug!("drop rejected: {:?}", rejection);
                self.dragging = None;
                return DropOutcome::Rejected(rejection);
            }
        };
        let id = self.dragging.take().unwrap_or_default();
        let source = match outline.locate(&id) {
            Some(path) => path,
            None => return DropOutcome::Rejected(DropRejection::SourceGone),
        };

        let moved = match preview.action {
            DropAction::Nest => outline.move_as_child(&source, &target.path),
            DropAction::Before => outline.move_before(&source, &target.path),
            DropAction::After => outline.move_after(&source, &target.path),
            DropAction::Root => outline.make_root_section(&source),
        };
        match moved {
            Some(path) => {
                debug!("dropped '{}' at {} as {}", id, path, preview.resulting_type);
                DropOutcome::Moved(path)
            }
            None => DropOutcome::Rejected(DropRejection::Refused),
        }
    }
}
