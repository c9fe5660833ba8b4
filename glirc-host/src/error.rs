//! Extension host error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or managing extensions
#[derive(Error, Debug)]
pub enum ExtensionHostError {
    /// Extension library not found in directory
    #[error("Extension library not found in {dir}")]
    LibraryNotFound { dir: PathBuf },

    /// Failed to load dynamic library or resolve its descriptor
    #[error("Failed to load extension library: {0}")]
    LibraryLoad(#[from] libloading::Error),

    /// The exported descriptor is unusable
    #[error("Invalid extension descriptor in {path}: {reason}")]
    InvalidDescriptor { path: PathBuf, reason: String },

    /// Major version mismatch between host and extension
    #[error("API version mismatch: host requires major {expected}, extension has {found}")]
    ApiVersionMismatch { expected: i32, found: i32 },

    /// An extension with this name is already loaded
    #[error("Extension '{name}' is already loaded")]
    Duplicate { name: String },

    /// `start` reported failure; the extension stays inert
    #[error("Extension '{name}' failed to start")]
    StartFailed { name: String },

    /// Extension not found
    #[error("Extension '{name}' not found")]
    NotFound { name: String },

    /// Host configuration could not be read or written
    #[error("Config error: {0}")]
    Config(String),

    /// Registry error (parsing, saving, etc.)
    #[error("Registry error: {0}")]
    Registry(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_not_found_display() {
        let err = ExtensionHostError::LibraryNotFound {
            dir: PathBuf::from("/some/path"),
        };
        assert!(err.to_string().contains("/some/path"));
    }

    #[test]
    fn test_api_version_mismatch_display() {
        let err = ExtensionHostError::ApiVersionMismatch {
            expected: 0,
            found: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("major 0"));
        assert!(msg.contains("has 2"));
    }

    #[test]
    fn test_start_failed_display() {
        let err = ExtensionHostError::StartFailed {
            name: "spam-filter".to_string(),
        };
        assert_eq!(err.to_string(), "Extension 'spam-filter' failed to start");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ExtensionHostError = io_err.into();
        assert!(matches!(err, ExtensionHostError::Io(_)));
    }
}
