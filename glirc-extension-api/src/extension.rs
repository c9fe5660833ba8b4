//! The safe extension trait

use std::path::Path;

use crate::error::ExtensionError;
use crate::host::Host;
use crate::message::{Command, Message};
use crate::types::ProcessResult;

/// An extension's four entry points.
///
/// The value returned by [`Extension::start`] is the extension's private
/// state. The host keeps it behind an opaque handle, passes it back into
/// every dispatch call, and hands it to [`Extension::stop`] exactly once.
/// If `start` fails nothing else is ever called.
///
/// Handlers only receive borrowed views; the borrow checker keeps them
/// from escaping the call.
pub trait Extension: Sized {
    /// Called once when the extension is loaded. `path` is the file the
    /// extension was loaded from.
    fn start(host: &mut dyn Host, path: &Path) -> Result<Self, ExtensionError>;

    /// Called once when the extension is unloaded or the host shuts down.
    fn stop(self, _host: &mut dyn Host) {}

    /// Called for every inbound protocol message. Return
    /// [`ProcessResult::Drop`] to hide it from the UI and logs.
    fn process_message(&mut self, _host: &mut dyn Host, _message: &Message<'_>) -> ProcessResult {
        ProcessResult::Pass
    }

    /// Called for every client command. Commands always proceed.
    fn process_command(&mut self, _host: &mut dyn Host, _command: &Command<'_>) {}
}
