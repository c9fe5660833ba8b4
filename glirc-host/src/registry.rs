//! Extension registry - tracks enabled/disabled extensions

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::ExtensionHostError;

/// Registry of enabled extensions
///
/// Stored as TOML in `~/.config/glirc/extensions/registry.toml`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExtensionRegistry {
    /// Names of enabled extensions
    #[serde(default)]
    pub enabled: BTreeSet<String>,
}

impl ExtensionRegistry {
    /// Load registry from a TOML file
    ///
    /// Returns an empty registry if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ExtensionHostError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ExtensionHostError::Registry(e.to_string()))
    }

    /// Save registry to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ExtensionHostError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ExtensionHostError::Registry(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.exists()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }

    pub fn enable(&mut self, name: &str) {
        self.enabled.insert(name.to_string());
    }

    pub fn disable(&mut self, name: &str) {
        self.enabled.remove(name);
    }

    /// Enabled extensions in name order
    pub fn enabled_extensions(&self) -> impl Iterator<Item = &str> {
        self.enabled.iter().map(String::as_str)
    }
}
