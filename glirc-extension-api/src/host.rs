//! The host query/action surface, as seen from inside an extension.

use std::cmp::Ordering;

use crate::error::HostError;
use crate::identifier;
use crate::message::Message;
use crate::types::MessageCode;

/// Calls an extension may make back into the host.
///
/// Available while the host is inside `start`, `stop` or a dispatch call.
/// Query results are copies the caller owns; unknown networks and channels
/// produce empty lists or `None` rather than errors.
pub trait Host {
    /// Submit a message for the host to transmit as if it originated normally.
    fn send_message(&mut self, message: &Message<'_>) -> Result<(), HostError>;

    /// Append a line to the client UI.
    fn print(&mut self, code: MessageCode, text: &str) -> Result<(), HostError>;

    fn list_networks(&self) -> Vec<String>;

    fn list_channels(&self, network: &str) -> Vec<String>;

    /// Members of a channel. Order is unspecified; no two entries are equal
    /// under [`identifier::identifier_cmp`].
    fn list_channel_users(&self, network: &str, channel: &str) -> Vec<String>;

    /// Our nickname on `network`, or `None` when unknown or disconnected.
    fn my_nick(&self, network: &str) -> Option<String>;

    /// Mark a window's backlog as read. Idempotent.
    fn mark_seen(&mut self, network: &str, channel: &str);

    /// Clear a window's history. Idempotent.
    fn clear_window(&mut self, network: &str, channel: &str);

    /// Compare identifiers the way the host does.
    fn identifier_cmp(&self, s: &str, t: &str) -> Ordering {
        identifier::identifier_cmp(s.as_bytes(), t.as_bytes())
    }

    // ─── Convenience ─────────────────────────────────────────────────

    fn print_info(&mut self, text: &str) -> Result<(), HostError> {
        self.print(MessageCode::Normal, text)
    }

    fn print_error(&mut self, text: &str) -> Result<(), HostError> {
        self.print(MessageCode::Error, text)
    }
}
