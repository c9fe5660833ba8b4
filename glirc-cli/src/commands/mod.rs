pub mod check;
pub mod extension;

use std::path::Path;

use anyhow::{Context, Result};
use glirc_host::HostConfig;

/// Load the host configuration from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<HostConfig> {
    match path {
        Some(path) => HostConfig::load(path)
            .with_context(|| format!("Failed to read config {}", path.display())),
        None => HostConfig::load_default().context("Failed to read host config"),
    }
}
