//! Service container for dependency injection
//!
//! Wires the store and the interactive collaborators into editing sessions.

use std::sync::Arc;

use crate::application::services::{EditorOptions, EditorSession};
use crate::application::{OutlineRepository, StorageKey};
use crate::config::Settings;
use crate::infrastructure::store::FileKeyValueStore;
use crate::infrastructure::traits::{
    AssumeYes, Confirm, KeyValueStore, Prompt, Selector, SkimSelector, TerminalConfirm,
    TerminalPrompt,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Outline storage
    pub store: Arc<dyn KeyValueStore>,

    /// Delete confirmation
    pub confirm: Arc<dyn Confirm>,

    /// Title prompt for adds
    pub prompt: Arc<dyn Prompt>,

    /// Interactive node picker
    pub selector: Arc<dyn Selector>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    ///
    /// `assume_yes` skips delete confirmation, as does `confirm_deletes = false`.
    pub fn new(settings: Settings, assume_yes: bool) -> Self {
        let store = Arc::new(FileKeyValueStore::new(settings.store_dir.clone()));
        let confirm: Arc<dyn Confirm> = if assume_yes || !settings.confirm_deletes {
            Arc::new(AssumeYes)
        } else {
            Arc::new(TerminalConfirm)
        };
        Self::with_deps(
            settings,
            store,
            confirm,
            Arc::new(TerminalPrompt),
            Arc::new(SkimSelector),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        store: Arc<dyn KeyValueStore>,
        confirm: Arc<dyn Confirm>,
        prompt: Arc<dyn Prompt>,
        selector: Arc<dyn Selector>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            store,
            confirm,
            prompt,
            selector,
        }
    }

    pub fn repository(&self) -> OutlineRepository {
        OutlineRepository::new(Arc::clone(&self.store))
    }

    /// Open an editing session on the outline stored under `key`.
    pub fn open_session(&self, key: StorageKey) -> EditorSession {
        EditorSession::open(
            key,
            self.repository(),
            Arc::clone(&self.confirm),
            Arc::clone(&self.prompt),
            EditorOptions::from(self.settings.as_ref()),
        )
    }
}
