//! Outline editing session
//!
//! One session edits one stored outline. It owns the outline, its collapse state
//! and the drag gesture in progress, persists after every change and queues the
//! events sibling views (lesson drawer, detail panel) react to.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, OutlineRepository, StorageKey};
use crate::config::Settings;
use crate::domain::{
    CollapseState, DragController, DropOutcome, DropPreview, DropRejection, DropTarget,
    LessonDetails, NodeType, Outline, OutlineDisplay, Placement, TreeNode, TreePath, VisibleRow,
    DEFAULT_NEST_THRESHOLD,
};
use crate::infrastructure::traits::{Confirm, Prompt};

/// Notifications for views outside the outline itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    NodeSelected { id: String },
    OpenLessonEditor { id: String },
}

/// How an imported outline combines with the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Discard the current outline.
    Replace,
    /// Append the imported top-level nodes.
    Merge,
}

/// Session tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorOptions {
    pub nest_threshold: f64,
    /// Periodic re-save for curriculum outlines.
    pub autosave_interval: Option<Duration>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            nest_threshold: DEFAULT_NEST_THRESHOLD,
            autosave_interval: None,
        }
    }
}

impl From<&Settings> for EditorOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            nest_threshold: settings.nest_threshold_px,
            autosave_interval: settings.autosave_interval(),
        }
    }
}

pub struct EditorSession {
    key: StorageKey,
    outline: Outline,
    collapse: CollapseState,
    drag: DragController,
    repository: OutlineRepository,
    confirm: Arc<dyn Confirm>,
    prompt: Arc<dyn Prompt>,
    events: VecDeque<EditorEvent>,
    autosave_interval: Option<Duration>,
    last_saved: Instant,
}

impl EditorSession {
    /// Open the outline stored under `key` (or its default).
    pub fn open(
        key: StorageKey,
        repository: OutlineRepository,
        confirm: Arc<dyn Confirm>,
        prompt: Arc<dyn Prompt>,
        options: EditorOptions,
    ) -> Self {
        let outline = repository.load(&key);
        info!("opened {} ({} nodes)", key, outline.len());
        Self {
            key,
            outline,
            collapse: CollapseState::new(),
            drag: DragController::new(options.nest_threshold),
            repository,
            confirm,
            prompt,
            events: VecDeque::new(),
            autosave_interval: options.autosave_interval,
            last_saved: Instant::now(),
        }
    }

    pub fn key(&self) -> &StorageKey {
        &self.key
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    pub fn collapse(&self) -> &CollapseState {
        &self.collapse
    }

    /// Switch to another key; the active outline is replaced wholesale.
    pub fn switch_to(&mut self, key: StorageKey) {
        if key == self.key {
            return;
        }
        self.outline = self.repository.load(&key);
        self.key = key;
        self.collapse = CollapseState::new();
        self.drag.cancel();
        self.events.clear();
        self.last_saved = Instant::now();
    }

    /// Write the outline now. Failures are logged by the repository.
    pub fn persist(&mut self) -> bool {
        self.last_saved = Instant::now();
        self.repository.save(&self.key, &self.outline)
    }

    /// Re-save a curriculum outline if the autosave period has elapsed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(interval) = self.autosave_interval else {
            return false;
        };
        if !matches!(self.key, StorageKey::Curriculum { .. }) {
            return false;
        }
        if now.saturating_duration_since(self.last_saved) < interval {
            return false;
        }
        debug!("autosave {}", self.key);
        self.persist()
    }

    fn committed<T>(&mut self, result: Option<T>) -> Option<T> {
        if result.is_some() {
            self.persist();
        }
        result
    }

    // ------------------------------------------------------------
    // explicit edits
    // ------------------------------------------------------------

    /// "Add X" under `parent` (the root path adds a section).
    ///
    /// Without a title the prompt collaborator is asked; an empty answer cancels.
    #[instrument(level = "debug", skip(self))]
    pub fn add(&mut self, parent: &TreePath, title: Option<&str>) -> Option<TreePath> {
        let parent_kind = if parent.is_root() {
            None
        } else {
            Some(self.outline.get(parent)?.node_type)
        };
        let kind = self.outline.variant().child_type(parent_kind)?;
        let title = match title {
            Some(t) => t.to_string(),
            None => self.ask_title(kind)?,
        };
        let added = self.outline.add_child(parent, kind, &title);
        self.committed(added)
    }

    /// Add a node beside or under `target`, kind chosen by the resulting depth.
    #[instrument(level = "debug", skip(self))]
    pub fn add_relative(&mut self, target: &TreePath, placement: Placement, title: Option<&str>) -> Option<TreePath> {
        let target_kind = self.outline.get(target)?.node_type;
        let variant = self.outline.variant();
        let kind = match placement {
            Placement::AsChild => variant.child_type(Some(target_kind))?,
            Placement::Before | Placement::After => variant.type_for_depth(target.depth()),
        };
        let title = match title {
            Some(t) => t.to_string(),
            None => self.ask_title(kind)?,
        };
        let added = self.outline.add_relative(target, placement, &title);
        self.committed(added)
    }

    fn ask_title(&self, kind: NodeType) -> Option<String> {
        let answer = self.prompt.prompt(&format!("Name of the new {}:", kind));
        let answer = answer.trim();
        (!answer.is_empty()).then(|| answer.to_string())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn rename(&mut self, path: &TreePath, title: &str) -> bool {
        let renamed = self.outline.rename(path, title).then_some(());
        self.committed(renamed).is_some()
    }

    /// Delete the subtree at `path` after the confirm collaborator agrees.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, path: &TreePath) -> Option<TreeNode> {
        let confirm = Arc::clone(&self.confirm);
        let removed = self.outline.delete(path, |node| {
            confirm.confirm(&format!(
                "Delete {} \"{}\" and everything inside it?",
                node.node_type, node.title
            ))
        });
        if removed.is_some() {
            self.collapse.retain_present(&self.outline);
        }
        self.committed(removed)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn duplicate(&mut self, path: &TreePath) -> Option<TreePath> {
        let copy = self.outline.duplicate(path);
        self.committed(copy)
    }

    #[instrument(level = "debug", skip(self, details))]
    pub fn update_lesson(&mut self, path: &TreePath, details: LessonDetails) -> bool {
        let updated = self.outline.update_lesson(path, details).then_some(());
        self.committed(updated).is_some()
    }

    // ------------------------------------------------------------
    // moves
    // ------------------------------------------------------------

    pub fn move_as_child(&mut self, drag: &TreePath, drop: &TreePath) -> Option<TreePath> {
        let moved = self.outline.move_as_child(drag, drop);
        self.committed(moved)
    }

    pub fn move_before(&mut self, drag: &TreePath, drop: &TreePath) -> Option<TreePath> {
        let moved = self.outline.move_before(drag, drop);
        self.committed(moved)
    }

    pub fn move_after(&mut self, drag: &TreePath, drop: &TreePath) -> Option<TreePath> {
        let moved = self.outline.move_after(drag, drop);
        self.committed(moved)
    }

    pub fn make_root_section(&mut self, drag: &TreePath) -> Option<TreePath> {
        let moved = self.outline.make_root_section(drag);
        self.committed(moved)
    }

    pub fn begin_drag(&mut self, path: &TreePath) -> bool {
        self.drag.begin(&self.outline, path)
    }

    pub fn hover(&self, target: &DropTarget) -> Result<DropPreview, DropRejection> {
        self.drag.hover(&self.outline, target)
    }

    pub fn drop(&mut self, target: &DropTarget) -> DropOutcome {
        let outcome = self.drag.drop(&mut self.outline, target);
        if matches!(outcome, DropOutcome::Moved(_)) {
            self.persist();
        }
        outcome
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    // ------------------------------------------------------------
    // view state and events
    // ------------------------------------------------------------

    /// Flip the collapsed flag of the node at `path`; returns the new state.
    pub fn toggle_collapse(&mut self, path: &TreePath) -> Option<bool> {
        let id = self.outline.get(path)?.id.clone();
        Some(self.collapse.toggle(&id))
    }

    pub fn collapse_all(&mut self) {
        self.collapse.collapse_all(&self.outline);
    }

    pub fn expand_all(&mut self) {
        self.collapse.expand_all();
    }

    pub fn visible_rows(&self) -> Vec<VisibleRow> {
        self.collapse.visible_rows(&self.outline)
    }

    /// Printable tree headed by the storage key.
    pub fn render(&self) -> String {
        self.outline
            .to_term_tree(&self.key.to_string(), &self.collapse)
            .to_string()
    }

    pub fn select(&mut self, path: &TreePath) -> bool {
        match self.outline.get(path) {
            Some(node) => {
                self.events.push_back(EditorEvent::NodeSelected {
                    id: node.id.clone(),
                });
                true
            }
            None => false,
        }
    }

    /// Ask the lesson drawer to open; only lessons have one.
    pub fn open_lesson(&mut self, path: &TreePath) -> bool {
        match self.outline.get(path) {
            Some(node) if node.node_type == NodeType::Lesson => {
                self.events.push_back(EditorEvent::OpenLessonEditor {
                    id: node.id.clone(),
                });
                true
            }
            _ => false,
        }
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.events.drain(..).collect()
    }

    // ------------------------------------------------------------
    // import
    // ------------------------------------------------------------

    /// Copy the outline stored under `source` into this one.
    ///
    /// Returns the number of top-level nodes brought in.
    #[instrument(level = "debug", skip(self))]
    pub fn import_from(&mut self, source: &StorageKey, mode: ImportMode) -> ApplicationResult<usize> {
        if *source == self.key {
            return Err(ApplicationError::Refused(format!(
                "cannot import {} into itself",
                source
            )));
        }
        let nodes = self.repository.load_nodes(source).ok_or_else(|| {
            ApplicationError::Refused(format!("nothing usable stored under {}", source))
        })?;
        let count = match mode {
            ImportMode::Replace => {
                let count = nodes.len();
                self.outline.replace_all(nodes)?;
                self.collapse = CollapseState::new();
                count
            }
            ImportMode::Merge => self.outline.merge_from(nodes)?,
        };
        info!("imported {} top-level nodes from {} ({:?})", count, source, mode);
        self.persist();
        Ok(count)
    }
}
