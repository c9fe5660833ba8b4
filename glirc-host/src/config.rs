//! Extension host configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ExtensionHostError;

/// How verdicts from several extensions combine for one message.
///
/// Either way a single `Drop` suppresses delivery; the policies differ in
/// whether later extensions still observe a dropped message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Every started extension sees every message
    #[default]
    NotifyAll,
    /// Stop dispatching once an extension drops the message
    FirstDrop,
}

/// Configuration for [`crate::ExtensionHost`]
///
/// Stored as TOML in `~/.config/glirc/extensions.toml`; every field is
/// optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directories scanned for extensions, first match wins
    pub extension_dirs: Vec<PathBuf>,
    /// Registry of enabled extensions
    pub registry_path: PathBuf,
    /// Verdict aggregation
    pub drop_policy: DropPolicy,
    /// Refuse extensions whose major version differs. Versions are
    /// advisory when unset.
    pub required_major: Option<i32>,
}

impl Default for HostConfig {
    fn default() -> Self {
        let extensions_dir = glirc_paths::extensions_dir();
        Self {
            registry_path: glirc_paths::registry_file(&extensions_dir),
            extension_dirs: vec![extensions_dir],
            drop_policy: DropPolicy::default(),
            required_major: None,
        }
    }
}

impl HostConfig {
    /// Configuration rooted at a single extension directory.
    pub fn with_extension_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            registry_path: glirc_paths::registry_file(&dir),
            extension_dirs: vec![dir],
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    ///
    /// Returns the defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ExtensionHostError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ExtensionHostError::Config(e.to_string()))
    }

    /// Load from the default location.
    pub fn load_default() -> Result<Self, ExtensionHostError> {
        Self::load(&glirc_paths::host_config_file())
    }
}
