//! Domain layer: outline model, drag-and-drop rules and view state
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod collapse;
pub mod drag;
pub mod entities;
pub mod error;
pub mod node_type;
pub mod outline;
pub mod path;
pub mod render;

pub use collapse::{CollapseState, VisibleRow};
pub use drag::{
    classify_drop, DragController, DropAction, DropOutcome, DropPreview, DropRejection, DropTarget,
    DropZone, DEFAULT_NEST_THRESHOLD,
};
pub use entities::*;
pub use error::DomainError;
pub use node_type::{EditorVariant, NodeType};
pub use outline::{Located, Outline, OutlineNode, OutlineStats, Placement};
pub use path::TreePath;
pub use render::OutlineDisplay;
