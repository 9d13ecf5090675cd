//! I/O boundary traits for testability
//!
//! These traits abstract the editor's collaborators (storage and the interactive
//! prompts), allowing services to be tested with in-memory implementations.

use std::io::{self, BufRead, Write};

use colored::Colorize;

use crate::infrastructure::{InfraError, InfraResult};

/// String-keyed store holding one serialised outline per key.
pub trait KeyValueStore: Send + Sync {
    /// Value under `key`, `None` if never written.
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> io::Result<()>;

    /// Remove `key`; removing a missing key is not an error.
    fn remove(&self, key: &str) -> io::Result<()>;

    /// All keys currently stored, sorted.
    fn keys(&self) -> io::Result<Vec<String>>;
}

/// Blocking yes/no question, e.g. before deleting a subtree.
pub trait Confirm: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// Blocking free-text question. Returns an empty string on cancel.
pub trait Prompt: Send + Sync {
    fn prompt(&self, message: &str) -> String;
}

/// Item for FZF-style selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionItem {
    /// Display text shown in selector
    pub display: String,
    /// Actual value (e.g., node path)
    pub value: String,
}

/// Interactive FZF-style selector abstraction.
pub trait Selector: Send + Sync {
    /// Present items to user and return selected one.
    /// Returns None if user cancels (Esc/Ctrl-C).
    fn select_one(&self, items: &[SelectionItem], prompt: &str) -> InfraResult<Option<SelectionItem>>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Asks on stderr, reads the answer from stdin. Anything but `y`/`yes` declines.
#[derive(Debug, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, message: &str) -> bool {
        eprint!("{} {} ", message.cyan(), "[y/N]".dimmed());
        io::stderr().flush().ok();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Confirms everything (`--yes`, or deletes configured not to ask).
#[derive(Debug, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// Reads one line from stdin after printing `message`.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn prompt(&self, message: &str) -> String {
        eprint!("{} ", message.cyan());
        io::stderr().flush().ok();
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => answer.trim().to_string(),
            Err(_) => String::new(),
        }
    }
}

/// Real selector implementation using skim (FZF-like).
#[derive(Debug, Default)]
pub struct SkimSelector;

impl Selector for SkimSelector {
    fn select_one(&self, items: &[SelectionItem], prompt: &str) -> InfraResult<Option<SelectionItem>> {
        use skim::prelude::*;
        use std::io::Cursor;

        if items.is_empty() {
            return Ok(None);
        }

        let input = items
            .iter()
            .map(|i| i.display.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let options = SkimOptionsBuilder::default()
            .prompt(Some(prompt))
            .height(Some("50%"))
            .multi(false)
            .build()
            .map_err(|e| InfraError::Selector {
                message: format!("failed to build skim options: {e}"),
            })?;

        let item_reader = SkimItemReader::default();
        let source = item_reader.of_bufread(Cursor::new(input));

        match Skim::run_with(&options, Some(source)) {
            Some(out) if out.is_abort => Ok(None),
            Some(out) => Ok(out.selected_items.first().and_then(|selected| {
                let display = selected.output().to_string();
                items.iter().find(|i| i.display == display).cloned()
            })),
            None => Ok(None),
        }
    }
}
