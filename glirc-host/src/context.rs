//! The host context threaded through every extension call

use std::collections::BTreeSet;

use glirc_extension_api::{Host, HostError, Identifier, Message, MessageCode};

use crate::client::{ClientState, OutboundMessage};

/// What an extension's `glirc` pointer points at during a call.
///
/// Lives on the host's stack for the duration of one `start`, `stop` or
/// dispatch call and forwards the [`Host`] surface to the client.
pub struct HostContext<'c> {
    client: &'c mut dyn ClientState,
}

impl<'c> HostContext<'c> {
    pub fn new(client: &'c mut dyn ClientState) -> Self {
        Self { client }
    }
}

impl Host for HostContext<'_> {
    fn send_message(&mut self, message: &Message<'_>) -> Result<(), HostError> {
        self.client.send_message(OutboundMessage::from_message(message))
    }

    fn print(&mut self, code: MessageCode, text: &str) -> Result<(), HostError> {
        self.client.print(code, text)
    }

    fn list_networks(&self) -> Vec<String> {
        self.client.networks()
    }

    fn list_channels(&self, network: &str) -> Vec<String> {
        self.client.channels(network)
    }

    fn list_channel_users(&self, network: &str, channel: &str) -> Vec<String> {
        // members are a set under the case mapping; the first spelling the
        // client reports for a nick is the one kept
        let mut users = BTreeSet::new();
        for user in self.client.channel_users(network, channel) {
            users.insert(Identifier::from(user));
        }
        users.into_iter().map(Identifier::into_string).collect()
    }

    fn my_nick(&self, network: &str) -> Option<String> {
        self.client.my_nick(network)
    }

    fn mark_seen(&mut self, network: &str, channel: &str) {
        self.client.mark_seen(network, channel)
    }

    fn clear_window(&mut self, network: &str, channel: &str) {
        self.client.clear_window(network, channel)
    }
}
