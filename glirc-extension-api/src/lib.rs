//! glirc-extension-api - extension interface for the glirc chat client
//!
//! This crate defines what crosses the boundary between the client (the
//! host) and a dynamically loaded extension module:
//!
//! - the `#[repr(C)]` records of `glirc-api.h` ([`abi`])
//! - safe borrowed views of messages and commands ([`Message`], [`Command`])
//! - the protocol's identifier case mapping ([`identifier_cmp`], [`Identifier`])
//! - the host query/action surface ([`Host`]) and ownership-transfer
//!   results ([`OwnedString`], [`OwnedStringList`])
//! - the [`Extension`] trait and, with the `extension` feature, the
//!   [`export_extension!`] macro that produces the exported descriptor
//!
//! # Features
//!
//! - `extension` - builds the export shims and `foreign::ForeignHost`.
//!   Enable it only in an extension cdylib: it links against the `glirc_*`
//!   symbols the host process exports, so host crates must leave it off.
//!
//! # Example
//!
//! ```ignore
//! use glirc_extension_api::{Extension, ExtensionError, Host, Message, ProcessResult, export_extension};
//! use std::path::Path;
//!
//! pub struct Quiet;
//!
//! impl Extension for Quiet {
//!     fn start(host: &mut dyn Host, _path: &Path) -> Result<Self, ExtensionError> {
//!         host.print_info("quiet loaded")?;
//!         Ok(Quiet)
//!     }
//!
//!     fn process_message(&mut self, _host: &mut dyn Host, msg: &Message<'_>) -> ProcessResult {
//!         if msg.command == b"JOIN" || msg.command == b"PART" {
//!             ProcessResult::Drop
//!         } else {
//!             ProcessResult::Pass
//!         }
//!     }
//! }
//!
//! export_extension!(Quiet, c"quiet");
//! ```

pub mod abi;
pub mod error;
pub mod extension;
pub mod host;
pub mod identifier;
pub mod message;
pub mod owned;
pub mod types;

// The crate's own tests define the `glirc_*` symbols and exercise the shims
// without the feature.
#[cfg(any(feature = "extension", test))]
mod export;
#[cfg(any(feature = "extension", test))]
pub mod foreign;

pub use abi::ExtensionDescriptor;
pub use error::{ExtensionError, HostError};
pub use extension::Extension;
pub use host::Host;
pub use identifier::{IdentStr, Identifier, identifier_cmp, identifier_eq};
pub use message::{Command, Message, Tag};
pub use owned::{OwnedString, OwnedStringList};
pub use types::{MessageCode, ProcessResult};

/// Interface major version. Hosts may refuse extensions built against a
/// different major version before calling `start`.
pub const API_MAJOR_VERSION: i32 = 0;

/// Interface minor version. Additions only.
pub const API_MINOR_VERSION: i32 = 1;

/// Export an [`Extension`] type as the module's `extension` descriptor.
///
/// # Usage
///
/// ```ignore
/// glirc_extension_api::export_extension!(MyExtension, c"my-extension");
/// glirc_extension_api::export_extension!(MyExtension, c"my-extension", 0, 3);
/// ```
///
/// The version defaults to the API version the extension was built against.
#[cfg(feature = "extension")]
#[macro_export]
macro_rules! export_extension {
    ($ty:ty, $name:expr, $major:expr, $minor:expr) => {
        #[unsafe(no_mangle)]
        #[allow(non_upper_case_globals)]
        pub static extension: $crate::abi::ExtensionDescriptor =
            $crate::abi::ExtensionDescriptor::for_extension::<$ty>($name, $major, $minor);
    };
    ($ty:ty, $name:expr) => {
        $crate::export_extension!(
            $ty,
            $name,
            $crate::API_MAJOR_VERSION,
            $crate::API_MINOR_VERSION
        );
    };
}
