//! Error types shared by extensions and the host

use std::ffi::c_int;

use thiserror::Error;

/// Failure of a host action (`send_message`, `print`).
///
/// At the C boundary these travel as the non-zero status codes returned by
/// the `glirc_*` functions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The action did not take effect
    #[error("host action failed")]
    Failed,

    /// The message named a network the client does not know
    #[error("unknown network{}", detail(.0))]
    UnknownNetwork(String),

    /// An argument could not be decoded (bad code, null record)
    #[error("invalid argument{}", detail(.0))]
    InvalidArgument(String),
}

// Statuses decoded from the C boundary carry no detail text.
fn detail(text: &str) -> String {
    if text.is_empty() {
        String::new()
    } else {
        format!(": {text}")
    }
}

impl HostError {
    pub const STATUS_OK: c_int = 0;
    pub const STATUS_FAILED: c_int = 1;
    pub const STATUS_UNKNOWN_NETWORK: c_int = 2;
    pub const STATUS_INVALID_ARGUMENT: c_int = 3;

    /// Status code reported through the C ABI.
    pub fn status(&self) -> c_int {
        match self {
            Self::Failed => Self::STATUS_FAILED,
            Self::UnknownNetwork(_) => Self::STATUS_UNKNOWN_NETWORK,
            Self::InvalidArgument(_) => Self::STATUS_INVALID_ARGUMENT,
        }
    }

    /// Encode a host action result as a C status.
    pub fn to_status(result: Result<(), HostError>) -> c_int {
        match result {
            Ok(()) => Self::STATUS_OK,
            Err(e) => e.status(),
        }
    }

    /// Decode a C status. The detail text is not carried across the ABI.
    pub fn from_status(status: c_int) -> Result<(), HostError> {
        match status {
            Self::STATUS_OK => Ok(()),
            Self::STATUS_UNKNOWN_NETWORK => Err(Self::UnknownNetwork(String::new())),
            Self::STATUS_INVALID_ARGUMENT => Err(Self::InvalidArgument(String::new())),
            _ => Err(Self::Failed),
        }
    }
}

/// Errors an extension can report from `start`.
#[derive(Error, Debug)]
pub enum ExtensionError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A host action failed during startup
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// Custom error with message
    #[error("{0}")]
    Custom(String),
}

impl ExtensionError {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
