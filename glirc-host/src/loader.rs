//! Finding extension modules on disk.
//!
//! Each extension lives in its own directory under an extension dir:
//!
//! ```text
//! ~/.config/glirc/extensions/
//! ├── registry.toml
//! └── auto-away/
//!     └── libauto_away.so
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::driver::{DescriptorInfo, ExtensionDriver, ForeignDriver};
use crate::error::ExtensionHostError;

/// An extension directory with a library in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredExtension {
    /// Directory name; the registry key
    pub name: String,
    pub dir: PathBuf,
    pub library: PathBuf,
}

fn library_extensions() -> &'static [&'static str] {
    if cfg!(target_os = "macos") {
        &["dylib", "so"]
    } else if cfg!(target_os = "windows") {
        &["dll"]
    } else {
        &["so"]
    }
}

/// Find the library file in an extension directory.
///
/// Tries `<name>.<ext>`, then `lib<name>.<ext>`, then the cargo spelling
/// with dashes turned into underscores.
pub fn find_library(dir: &Path, name: &str) -> Result<PathBuf, ExtensionHostError> {
    let underscored = name.replace('-', "_");
    for ext in library_extensions() {
        let candidates = [
            format!("{name}.{ext}"),
            format!("lib{name}.{ext}"),
            format!("lib{underscored}.{ext}"),
        ];
        if let Some(path) = candidates
            .iter()
            .map(|file| dir.join(file))
            .find(|path| path.exists())
        {
            return Ok(path);
        }
    }

    Err(ExtensionHostError::LibraryNotFound {
        dir: dir.to_path_buf(),
    })
}

/// Scan extension directories in order. When two directories hold an
/// extension of the same name the first one wins.
pub fn discover(dirs: &[PathBuf]) -> Result<Vec<DiscoveredExtension>, ExtensionHostError> {
    let mut found = Vec::new();
    let mut seen = BTreeSet::new();

    for base_dir in dirs {
        if !base_dir.exists() {
            tracing::debug!(dir = %base_dir.display(), "Extension directory does not exist");
            continue;
        }

        let mut entries = std::fs::read_dir(base_dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort();

        for dir in entries.into_iter().filter(|p| p.is_dir()) {
            let Some(name) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            if seen.contains(&name) {
                tracing::debug!(extension = %name, dir = %dir.display(), "Shadowed by earlier directory");
                continue;
            }
            match find_library(&dir, &name) {
                Ok(library) => {
                    seen.insert(name.clone());
                    found.push(DiscoveredExtension { name, dir, library });
                }
                Err(e) => {
                    tracing::debug!(extension = %name, error = %e, "Skipping directory");
                }
            }
        }
    }

    Ok(found)
}

/// Read a module's descriptor without starting it.
pub fn inspect(path: &Path) -> Result<DescriptorInfo, ExtensionHostError> {
    Ok(ForeignDriver::open(path)?.info().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_find_library_not_found() {
        let dir = TempDir::new().unwrap();
        let result = find_library(dir.path(), "nonexistent");
        assert!(matches!(
            result,
            Err(ExtensionHostError::LibraryNotFound { .. })
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_find_library_naming_conventions() {
        let dir = TempDir::new().unwrap();

        touch(&dir.path().join("plain/plain.so"));
        assert!(find_library(&dir.path().join("plain"), "plain")
            .unwrap()
            .ends_with("plain.so"));

        touch(&dir.path().join("auto-away/libauto_away.so"));
        assert!(find_library(&dir.path().join("auto-away"), "auto-away")
            .unwrap()
            .ends_with("libauto_away.so"));
    }

    #[test]
    fn test_discover_missing_dir_is_empty() {
        let found = discover(&[PathBuf::from("/nonexistent/glirc/extensions")]).unwrap();
        assert!(found.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_discover_first_directory_wins() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        touch(&project.path().join("echo/libecho.so"));
        touch(&user.path().join("echo/libecho.so"));
        touch(&user.path().join("logger/logger.so"));
        std::fs::create_dir_all(user.path().join("empty")).unwrap();
        touch(&user.path().join("registry.toml"));

        let found = discover(&[project.path().to_path_buf(), user.path().to_path_buf()]).unwrap();
        let names: Vec<_> = found.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["echo", "logger"]);
        assert!(found[0].library.starts_with(project.path()));
    }

    #[test]
    fn test_inspect_rejects_non_library() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bogus.so");
        std::fs::write(&path, b"not an object file").unwrap();
        assert!(matches!(
            inspect(&path),
            Err(ExtensionHostError::LibraryLoad(_))
        ));
    }
}
