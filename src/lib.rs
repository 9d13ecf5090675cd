//! coursetree: curriculum outline editor
//!
//! Depth-typed outlines (section, unit, topic or module, lesson), path-addressed
//! editing, drag-and-drop moves that re-type what they move, collapse state and
//! keyed persistence.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
