//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::application::StorageKey;
use crate::cli::{CliError, CliResult};
use crate::domain::{DropZone, Placement};

/// Curriculum outline editor: sections, units, topics/modules and lessons
#[derive(Parser, Debug)]
#[command(name = "coursetree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug level: -d info, -dd debug, -ddd trace
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Store directory (default: from config)
    #[arg(short = 'S', long, global = true, value_hint = ValueHint::DirPath)]
    pub store: Option<PathBuf>,

    /// Do not ask before deleting
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(flatten)]
    pub context: ContextArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Which stored outline to edit.
#[derive(Args, Debug, Default, Clone)]
pub struct ContextArgs {
    /// Program id (course structure editor)
    #[arg(long, global = true, conflicts_with = "course")]
    pub program: Option<String>,

    /// Level id (course structure editor)
    #[arg(long, global = true, requires = "program")]
    pub level: Option<String>,

    /// Paper id (course structure editor)
    #[arg(long, global = true, requires = "program")]
    pub paper: Option<String>,

    /// Course id (curriculum editor)
    #[arg(long, global = true)]
    pub course: Option<String>,
}

impl ContextArgs {
    pub fn storage_key(&self) -> CliResult<StorageKey> {
        match (&self.program, &self.course) {
            (Some(program), None) => Ok(StorageKey::structure(
                program.clone(),
                self.level.clone(),
                self.paper.clone(),
            )),
            (None, Some(course)) => Ok(StorageKey::curriculum(course.clone())),
            _ => Err(CliError::Usage(
                "select an outline with --program [--level --paper] or --course".to_string(),
            )),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the outline as a tree
    Show {
        /// Collapse these nodes (paths like 0.1)
        #[arg(short, long)]
        collapse: Vec<String>,
        /// Collapse every node with children
        #[arg(long, conflicts_with = "collapse")]
        collapse_all: bool,
        /// Print visible rows as a flat list instead of a tree
        #[arg(long)]
        flat: bool,
        /// Print the stored JSON
        #[arg(long, conflicts_with = "flat")]
        json: bool,
    },

    /// Add a node (kind follows the parent)
    Add {
        /// Parent path, or the target with --at before/after ("/" for top level)
        #[arg(default_value = "/")]
        path: String,
        /// Title (prompted when omitted)
        title: Option<String>,
        /// Where the node goes relative to PATH
        #[arg(long, value_enum, default_value_t = AddAt::Child)]
        at: AddAt,
    },

    /// Rename a node
    Rename {
        path: String,
        title: String,
    },

    /// Delete a node and its subtree
    Delete {
        path: String,
    },

    /// Copy a subtree next to itself
    Duplicate {
        path: String,
    },

    /// Drag a node and drop it on a target row
    Move {
        #[command(flatten)]
        drop: DropArgs,
    },

    /// Show what a drop would do without applying it
    Preview {
        #[command(flatten)]
        drop: DropArgs,
    },

    /// Show or edit a lesson's details
    Lesson {
        path: String,
        /// Length in minutes
        #[arg(long)]
        duration: Option<u32>,
        /// Video, Text, Quiz or File-Based
        #[arg(long = "type")]
        lesson_type: Option<String>,
        /// Lesson body
        #[arg(long)]
        content: Option<String>,
        /// Attachment as name=url (repeatable)
        #[arg(long)]
        attach: Vec<String>,
        /// Remove all attachments before adding new ones
        #[arg(long)]
        clear_attachments: bool,
    },

    /// Copy another stored outline into this one
    Import {
        /// Source course id
        #[arg(long, conflicts_with = "key")]
        from_course: Option<String>,
        /// Source storage key (e.g. course_structure:p1:level:paper)
        #[arg(long)]
        key: Option<String>,
        /// Replace instead of appending
        #[arg(long)]
        replace: bool,
    },

    /// Pick a node interactively and print its path
    Select,

    /// Count nodes per kind and total lesson time
    Stats,

    /// List stored outlines
    Keys,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct DropArgs {
    /// Path of the node being dragged
    pub drag: String,
    /// Path of the row dropped on (ignored for --zone root)
    #[arg(default_value = "/")]
    pub target: String,
    /// Region of the target row
    #[arg(long, value_enum, default_value_t = ZoneArg::Body)]
    pub zone: ZoneArg,
    /// Horizontal pointer offset from the row's left edge (px)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub offset: f64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneArg {
    Above,
    Body,
    Below,
    Root,
}

impl From<ZoneArg> for DropZone {
    fn from(zone: ZoneArg) -> Self {
        match zone {
            ZoneArg::Above => DropZone::Above,
            ZoneArg::Body => DropZone::Body,
            ZoneArg::Below => DropZone::Below,
            ZoneArg::Root => DropZone::Root,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddAt {
    Child,
    Before,
    After,
}

impl From<AddAt> for Placement {
    fn from(at: AddAt) -> Self {
        match at {
            AddAt::Child => Placement::AsChild,
            AddAt::Before => Placement::Before,
            AddAt::After => Placement::After,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,
}
