//! glirc-host: the host side of the glirc extension interface
//!
//! This crate loads extension modules and drives them:
//!
//! - **Loading** - [`loader`] finds modules on disk; [`ForeignDriver`] opens
//!   one and resolves its exported `extension` descriptor
//! - **Lifecycle** - [`ExtensionState`] tracks each extension from start to
//!   stop, and panics mark it failed
//! - **Dispatch** - [`ExtensionHost`] offers messages and commands to every
//!   started extension in load order and combines verdicts per [`DropPolicy`]
//! - **Callbacks** - [`ffi`] exports the `glirc_*` functions extensions call
//!   back into, served by the [`ClientState`] the host owns
//!
//! # Quick Start
//!
//! ```no_run
//! use glirc_extension_api::Message;
//! use glirc_host::{ClientModel, ExtensionHost, HostConfig};
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut host = ExtensionHost::new(HostConfig::load_default()?, ClientModel::new());
//!     host.load_all()?;
//!
//!     let msg = Message::new("freenode", "PRIVMSG").with_param("#rust").with_param("hi");
//!     if host.process_inbound(&msg).is_drop() {
//!         println!("suppressed by an extension");
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod ffi;
pub mod host;
pub mod lifecycle;
pub mod loader;
pub mod registry;

pub use client::{ClientModel, ClientState, OutboundMessage, PrintedLine, WindowState};
pub use config::{DropPolicy, HostConfig};
pub use context::HostContext;
pub use driver::{DescriptorInfo, ExtensionDriver, ForeignDriver, InstanceHandle, NativeDriver, Slots};
pub use error::ExtensionHostError;
pub use host::{ExtensionHost, ExtensionInfo};
pub use lifecycle::ExtensionState;
pub use registry::ExtensionRegistry;
