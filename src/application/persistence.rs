//! Outline persistence keyed by editing context.
//!
//! Each program/level/paper structure and each course curriculum is stored whole,
//! as a JSON array of nodes, under its own key. Reads that fail for any reason
//! fall back to the variant's default outline and writes that fail are dropped;
//! both are logged but never surface to the editor.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{EditorVariant, NodeType, Outline, TreeNode};
use crate::infrastructure::traits::KeyValueStore;

const STRUCTURE_PREFIX: &str = "course_structure";
const CURRICULUM_PREFIX: &str = "curriculum";

/// Composite key naming one stored outline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// `course_structure:<program>:<level|"level">:<paper|"paper">`
    Structure {
        program: String,
        level: Option<String>,
        paper: Option<String>,
    },
    /// `curriculum:<course>`
    Curriculum { course: String },
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl StorageKey {
    pub fn structure(program: impl Into<String>, level: Option<String>, paper: Option<String>) -> Self {
        Self::Structure {
            program: program.into(),
            level: non_blank(level),
            paper: non_blank(paper),
        }
    }

    pub fn curriculum(course: impl Into<String>) -> Self {
        Self::Curriculum {
            course: course.into(),
        }
    }

    pub fn variant(&self) -> EditorVariant {
        match self {
            StorageKey::Structure { .. } => EditorVariant::Structure,
            StorageKey::Curriculum { .. } => EditorVariant::Curriculum,
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKey::Structure {
                program,
                level,
                paper,
            } => write!(
                f,
                "{}:{}:{}:{}",
                STRUCTURE_PREFIX,
                program,
                level.as_deref().unwrap_or("level"),
                paper.as_deref().unwrap_or("paper")
            ),
            StorageKey::Curriculum { course } => write!(f, "{}:{}", CURRICULUM_PREFIX, course),
        }
    }
}

impl FromStr for StorageKey {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ApplicationError::InvalidKey(s.to_string());
        let (prefix, rest) = s.split_once(':').ok_or_else(invalid)?;
        match prefix {
            CURRICULUM_PREFIX if !rest.is_empty() => Ok(Self::curriculum(rest)),
            STRUCTURE_PREFIX => {
                let parts: Vec<&str> = rest.split(':').collect();
                match parts.as_slice() {
                    [program, level, paper] if !program.is_empty() => {
                        let level = (*level != "level").then(|| level.to_string());
                        let paper = (*paper != "paper").then(|| paper.to_string());
                        Ok(Self::structure(*program, level, paper))
                    }
                    _ => Err(invalid()),
                }
            }
            _ => Err(invalid()),
        }
    }
}

/// Outline shown when nothing usable is stored for a key.
///
/// The structure editor starts from a one-branch scaffold; the curriculum editor
/// starts empty.
pub fn default_outline(variant: EditorVariant) -> Outline {
    match variant {
        EditorVariant::Structure => {
            let seed = vec![TreeNode::new("Section 1", NodeType::Section).with_children(vec![
                TreeNode::new("Unit 1", NodeType::Unit)
                    .with_children(vec![TreeNode::new("Module 1", NodeType::Module)]),
            ])];
            Outline::from_nodes(variant, seed).unwrap_or_else(|_| Outline::new(variant))
        }
        EditorVariant::Curriculum => Outline::new(variant),
    }
}

/// Reads and writes whole outlines through a [`KeyValueStore`].
#[derive(Clone)]
pub struct OutlineRepository {
    store: Arc<dyn KeyValueStore>,
}

impl OutlineRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored outline for `key`, or the variant default if absent or unreadable.
    #[instrument(level = "debug", skip(self, key), fields(key = %key))]
    pub fn load(&self, key: &StorageKey) -> Outline {
        let variant = key.variant();
        match self.load_nodes(key) {
            Some(nodes) => match Outline::from_nodes(variant, nodes) {
                Ok(outline) => outline,
                Err(e) => {
                    warn!("stored outline for {} rejected: {}", key, e);
                    default_outline(variant)
                }
            },
            None => default_outline(variant),
        }
    }

    /// Raw stored nodes for `key`; `None` if absent or unreadable.
    pub fn load_nodes(&self, key: &StorageKey) -> Option<Vec<TreeNode>> {
        let raw = match self.store.get(&key.to_string()) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("nothing stored under {}", key);
                return None;
            }
            Err(e) => {
                warn!("reading {} failed: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str::<Vec<TreeNode>>(&raw) {
            Ok(nodes) => Some(nodes),
            Err(e) => {
                warn!("stored outline for {} is malformed: {}", key, e);
                None
            }
        }
    }

    /// Overwrite the stored outline for `key`. Returns whether the write landed.
    #[instrument(level = "debug", skip(self, key, outline), fields(key = %key))]
    pub fn save(&self, key: &StorageKey, outline: &Outline) -> bool {
        let json = match serde_json::to_string(&outline.to_nodes()) {
            Ok(json) => json,
            Err(e) => {
                warn!("serialising outline for {} failed: {}", key, e);
                return false;
            }
        };
        match self.store.set(&key.to_string(), &json) {
            Ok(()) => true,
            Err(e) => {
                warn!("writing {} failed: {}", key, e);
                false
            }
        }
    }

    /// Stored keys. Unlike load/save this reports storage errors.
    pub fn keys(&self) -> ApplicationResult<Vec<String>> {
        self.store.keys().with_key_context("list keys in", "store")
    }

    pub fn remove(&self, key: &StorageKey) -> ApplicationResult<()> {
        let key = key.to_string();
        self.store.remove(&key).with_key_context("remove", &key)
    }
}
