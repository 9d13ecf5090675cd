//! Domain entities: the persisted node shape

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{DomainError, EditorVariant, NodeType};

/// Deepest nesting accepted anywhere in an outline.
pub const MAX_DEPTH: usize = 64;

/// Delivery format of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonType {
    Video,
    Text,
    Quiz,
    #[serde(rename = "File-Based")]
    FileBased,
}

impl fmt::Display for LessonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LessonType::Video => f.write_str("Video"),
            LessonType::Text => f.write_str("Text"),
            LessonType::Quiz => f.write_str("Quiz"),
            LessonType::FileBased => f.write_str("File-Based"),
        }
    }
}

impl FromStr for LessonType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(LessonType::Video),
            "text" => Ok(LessonType::Text),
            "quiz" => Ok(LessonType::Quiz),
            "file-based" | "file" | "filebased" => Ok(LessonType::FileBased),
            _ => Err(DomainError::UnknownLessonType(s.to_string())),
        }
    }
}

/// File or link attached to a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

impl FromStr for Attachment {
    type Err = DomainError;

    /// Parses `name=url`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, url) = s
            .split_once('=')
            .ok_or_else(|| DomainError::InvalidAttachment(s.to_string()))?;
        let (name, url) = (name.trim(), url.trim());
        if name.is_empty() || url.is_empty() {
            return Err(DomainError::InvalidAttachment(s.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            url: url.to_string(),
        })
    }
}

/// Lesson-only fields. Empty for every other kind of node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDetails {
    /// Length in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Rich-text body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_type: Option<LessonType>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub attachments: Vec<Attachment>,
}

impl LessonDetails {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One node of a persisted outline, children inline.
///
/// This is the exchange shape: what gets written to the store and what insert and
/// remove operations hand back and forth. Inside the editor nodes live in an arena
/// (see [`crate::domain::Outline`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(flatten)]
    pub lesson: LessonDetails,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Leaf node with a fresh random id.
    pub fn new(title: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: new_node_id(),
            title: title.into(),
            node_type,
            lesson: LessonDetails::default(),
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = children;
        self
    }

    /// Number of nodes in this subtree, including itself.
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(current) = stack.pop() {
            count += 1;
            stack.extend(current.children.iter());
        }
        count
    }

    /// Whether some descendant sits more than `limit` levels below this node.
    ///
    /// Stops descending at the first node past the limit.
    pub fn exceeds_depth(&self, limit: usize) -> bool {
        let mut stack = vec![(self, 0usize)];
        while let Some((current, depth)) = stack.pop() {
            if depth > limit {
                return true;
            }
            stack.extend(current.children.iter().map(|c| (c, depth + 1)));
        }
        false
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Fresh random node id.
pub fn new_node_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Id for a copy of `original`: the old id plus a timestamp-derived suffix.
pub fn derived_node_id(original: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{:x}{}", original, millis, &salt[..6])
}

/// Re-stamp `node` and every descendant with the kind implied by its depth,
/// `base_depth` being the depth `node` itself will occupy.
///
/// Walks with an explicit stack; refuses subtrees that would end up deeper than
/// [`MAX_DEPTH`].
pub fn retype_subtree(
    variant: EditorVariant,
    mut node: TreeNode,
    base_depth: usize,
) -> Result<TreeNode, DomainError> {
    if base_depth > MAX_DEPTH || node.exceeds_depth(MAX_DEPTH - base_depth) {
        return Err(DomainError::DepthLimitExceeded { limit: MAX_DEPTH });
    }
    let mut stack: Vec<(&mut TreeNode, usize)> = vec![(&mut node, base_depth)];
    while let Some((current, depth)) = stack.pop() {
        current.node_type = variant.type_for_depth(depth);
        for child in current.children.iter_mut() {
            stack.push((child, depth + 1));
        }
    }
    Ok(node)
}
