//! XDG Base Directory paths for glirc.
//!
//! The extension host keeps its configuration, extension libraries and the
//! enabled-extension registry under the XDG config directory on every
//! platform, the same way the client itself does.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "glirc";

/// Get the glirc config directory.
///
/// Returns `$XDG_CONFIG_HOME/glirc` if set, otherwise `~/.config/glirc`.
///
/// # Examples
///
/// ```
/// use glirc_paths::config_dir;
///
/// let config = config_dir();
/// assert!(config.ends_with("glirc"));
/// ```
pub fn config_dir() -> PathBuf {
    resolve_config_dir(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        dirs::home_dir(),
    )
}

/// Directory scanned for extension libraries (`<config>/extensions`).
pub fn extensions_dir() -> PathBuf {
    config_dir().join("extensions")
}

/// Host configuration file (`<config>/extensions.toml`).
pub fn host_config_file() -> PathBuf {
    config_dir().join("extensions.toml")
}

/// Registry of enabled extensions, stored alongside the libraries.
pub fn registry_file(extensions_dir: &Path) -> PathBuf {
    extensions_dir.join("registry.toml")
}

fn resolve_config_dir(xdg_config: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    match (xdg_config, home) {
        (Some(xdg), _) if !xdg.as_os_str().is_empty() => xdg.join(APP_DIR),
        (_, Some(home)) => home.join(".config").join(APP_DIR),
        _ => PathBuf::from(".config").join(APP_DIR),
    }
}
