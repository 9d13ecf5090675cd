//! Application services

pub mod editor;

pub use editor::{EditorEvent, EditorOptions, EditorSession, ImportMode};
