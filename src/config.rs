//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/coursetree/coursetree.toml`
//! 3. Local config: `<store_dir>/.coursetree.toml`
//! 4. Environment variables: `COURSETREE_*` prefix

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, IoResultExt};
use crate::domain::DEFAULT_NEST_THRESHOLD;

/// Raw settings for intermediate parsing (every field optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub store_dir: Option<PathBuf>,
    pub nest_threshold_px: Option<f64>,
    pub autosave_interval_secs: Option<u64>,
    pub confirm_deletes: Option<bool>,
}

/// Unified configuration for coursetree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding stored outlines (default: ~/.coursetree/store)
    pub store_dir: PathBuf,
    /// Horizontal pointer offset (px) past which a strip drop nests
    pub nest_threshold_px: f64,
    /// Curriculum autosave period in seconds; 0 disables it
    pub autosave_interval_secs: u64,
    /// Ask before deleting a subtree
    pub confirm_deletes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            nest_threshold_px: DEFAULT_NEST_THRESHOLD,
            autosave_interval_secs: 30,
            confirm_deletes: true,
        }
    }
}

fn default_store_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".coursetree").join("store"))
        .unwrap_or_else(|| PathBuf::from("~/.coursetree/store"))
}

/// Get the XDG config directory for coursetree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "coursetree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("coursetree.toml"))
}

/// Get the path to the local config file in a store directory.
pub fn local_config_path(store_dir: &Path) -> PathBuf {
    store_dir.join(".coursetree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).with_path_context("read config", path)?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; unexpandable input is returned unchanged.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Overlay: values present in `raw` win.
    fn merge_with(&self, raw: &RawSettings) -> Self {
        Self {
            store_dir: raw
                .store_dir
                .clone()
                .unwrap_or_else(|| self.store_dir.clone()),
            nest_threshold_px: raw.nest_threshold_px.unwrap_or(self.nest_threshold_px),
            autosave_interval_secs: raw
                .autosave_interval_secs
                .unwrap_or(self.autosave_interval_secs),
            confirm_deletes: raw.confirm_deletes.unwrap_or(self.confirm_deletes),
        }
    }

    /// Curriculum autosave period, `None` when disabled.
    pub fn autosave_interval(&self) -> Option<Duration> {
        (self.autosave_interval_secs > 0).then(|| Duration::from_secs(self.autosave_interval_secs))
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `store_override` - Store directory given on the command line; its local
    ///   config file is consulted instead of the configured store's.
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/coursetree/coursetree.toml`
    /// 3. Local config: `<store_dir>/.coursetree.toml`
    /// 4. Environment variables: `COURSETREE_*` prefix
    pub fn load(store_override: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = store_override {
            current.store_dir = dir.to_path_buf();
        }

        let local_path = local_config_path(&expand_path(&current.store_dir));
        if local_path.exists() {
            debug!("loading local config {}", local_path.display());
            current = current.merge_with(&load_raw_settings(&local_path)?);
            if let Some(dir) = store_override {
                current.store_dir = dir.to_path_buf();
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.store_dir = expand_path(&current.store_dir);

        Ok(current)
    }

    /// Apply COURSETREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("COURSETREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("store_dir") {
            settings.store_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_float("nest_threshold_px") {
            settings.nest_threshold_px = val;
        }
        if let Ok(val) = config.get_int("autosave_interval_secs") {
            settings.autosave_interval_secs = u64::try_from(val).unwrap_or(0);
        }
        if let Ok(val) = config.get_bool("confirm_deletes") {
            settings.confirm_deletes = val;
        }

        Ok(settings)
    }

    /// Render as TOML, for `config show`.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })
    }
}
