//! The client-side collaborator behind the host surface.
//!
//! [`ClientState`] is everything the extension host needs from the rest of
//! the client: connection and membership state to answer queries, a way to
//! transmit messages, the UI to print to, and the normal consumers a passed
//! message is delivered to. [`ClientModel`] is an in-memory implementation.

use std::collections::{BTreeMap, BTreeSet};

use glirc_extension_api::{HostError, IdentStr, Identifier, Message, MessageCode};

/// An owned copy of a message an extension asked the host to send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundMessage {
    pub network: String,
    pub prefix_nick: String,
    pub prefix_user: String,
    pub prefix_host: String,
    pub command: String,
    pub params: Vec<String>,
    pub tags: Vec<(String, String)>,
}

impl OutboundMessage {
    pub fn from_message(message: &Message<'_>) -> Self {
        let text = |b: &[u8]| String::from_utf8_lossy(b).into_owned();
        Self {
            network: text(message.network),
            prefix_nick: text(message.prefix_nick),
            prefix_user: text(message.prefix_user),
            prefix_host: text(message.prefix_host),
            command: text(message.command),
            params: message.params.iter().map(|p| text(*p)).collect(),
            tags: message
                .tags
                .iter()
                .map(|t| (text(t.key), text(t.value)))
                .collect(),
        }
    }
}

/// A line printed to the client UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintedLine {
    pub code: MessageCode,
    pub text: String,
}

/// Connection, window and UI state the host surface reads and acts on.
pub trait ClientState {
    /// Names of configured networks.
    fn networks(&self) -> Vec<String>;

    /// Channels joined on `network`; empty when the network is unknown.
    fn channels(&self, network: &str) -> Vec<String>;

    /// Members of `channel` on `network`; empty when either is unknown.
    fn channel_users(&self, network: &str, channel: &str) -> Vec<String>;

    /// Current nickname, `None` when unknown or disconnected.
    fn my_nick(&self, network: &str) -> Option<String>;

    /// Transmit a message.
    fn send_message(&mut self, message: OutboundMessage) -> Result<(), HostError>;

    /// Append a line to the UI.
    fn print(&mut self, code: MessageCode, text: &str) -> Result<(), HostError>;

    fn mark_seen(&mut self, network: &str, channel: &str);

    fn clear_window(&mut self, network: &str, channel: &str);

    /// Hand a message that every extension passed to the UI and logs.
    fn deliver(&mut self, message: &Message<'_>);
}

/// Per-window state tracked by [`ClientModel`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowState {
    /// Lines delivered since the window was last marked seen
    pub unseen: usize,
    /// Delivered lines since the window was last cleared
    pub history: Vec<String>,
}

#[derive(Debug, Default)]
struct ChannelState {
    users: BTreeSet<Identifier>,
    window: WindowState,
}

#[derive(Debug, Default)]
struct NetworkState {
    nick: Option<String>,
    channels: BTreeMap<Identifier, ChannelState>,
}

/// In-memory [`ClientState`].
///
/// Membership is keyed by [`Identifier`], so lookups and de-duplication use
/// the protocol case mapping.
#[derive(Debug, Default)]
pub struct ClientModel {
    networks: BTreeMap<String, NetworkState>,
    outbox: Vec<OutboundMessage>,
    printed: Vec<PrintedLine>,
    delivered: Vec<OutboundMessage>,
}

impl ClientModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connected network with our nickname on it.
    pub fn connect(&mut self, network: &str, nick: &str) -> &mut Self {
        self.networks.entry(network.to_string()).or_default().nick = Some(nick.to_string());
        self
    }

    /// Keep the network but forget our nickname, as after a disconnect.
    pub fn disconnect(&mut self, network: &str) -> &mut Self {
        if let Some(state) = self.networks.get_mut(network) {
            state.nick = None;
        }
        self
    }

    /// Join `channel` on a known network with the given members.
    pub fn join<I, S>(&mut self, network: &str, channel: &str, users: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(state) = self.networks.get_mut(network) {
            let chan = state.channels.entry(Identifier::from(channel)).or_default();
            chan.users
                .extend(users.into_iter().map(|u| Identifier::new(u.into())));
        } else {
            tracing::debug!(network, channel, "Join on unknown network ignored");
        }
        self
    }

    /// Remove a member; a no-op if absent.
    pub fn part(&mut self, network: &str, channel: &str, user: &str) -> &mut Self {
        if let Some(chan) = self.channel_mut(network, channel) {
            chan.users.remove(IdentStr::new(user));
        }
        self
    }

    pub fn outbox(&self) -> &[OutboundMessage] {
        &self.outbox
    }

    pub fn printed(&self) -> &[PrintedLine] {
        &self.printed
    }

    /// Messages handed to the normal consumers.
    pub fn delivered(&self) -> &[OutboundMessage] {
        &self.delivered
    }

    pub fn window(&self, network: &str, channel: &str) -> Option<&WindowState> {
        self.networks
            .get(network)?
            .channels
            .get(IdentStr::new(channel))
            .map(|c| &c.window)
    }

    fn channel_mut(&mut self, network: &str, channel: &str) -> Option<&mut ChannelState> {
        self.networks
            .get_mut(network)?
            .channels
            .get_mut(IdentStr::new(channel))
    }
}

impl ClientState for ClientModel {
    fn networks(&self) -> Vec<String> {
        self.networks.keys().cloned().collect()
    }

    fn channels(&self, network: &str) -> Vec<String> {
        self.networks
            .get(network)
            .map(|n| n.channels.keys().map(|c| c.to_string()).collect())
            .unwrap_or_default()
    }

    fn channel_users(&self, network: &str, channel: &str) -> Vec<String> {
        self.networks
            .get(network)
            .and_then(|n| n.channels.get(IdentStr::new(channel)))
            .map(|c| c.users.iter().map(|u| u.to_string()).collect())
            .unwrap_or_default()
    }

    fn my_nick(&self, network: &str) -> Option<String> {
        self.networks.get(network)?.nick.clone()
    }

    fn send_message(&mut self, message: OutboundMessage) -> Result<(), HostError> {
        if !self.networks.contains_key(&message.network) {
            return Err(HostError::UnknownNetwork(message.network));
        }
        tracing::debug!(
            network = %message.network,
            command = %message.command,
            "Queued message from extension"
        );
        self.outbox.push(message);
        Ok(())
    }

    fn print(&mut self, code: MessageCode, text: &str) -> Result<(), HostError> {
        match code {
            MessageCode::Normal => tracing::info!(target: "glirc::extension", "{}", text),
            MessageCode::Error => tracing::warn!(target: "glirc::extension", "{}", text),
        }
        self.printed.push(PrintedLine {
            code,
            text: text.to_string(),
        });
        Ok(())
    }

    fn mark_seen(&mut self, network: &str, channel: &str) {
        if let Some(chan) = self.channel_mut(network, channel) {
            chan.window.unseen = 0;
        }
    }

    fn clear_window(&mut self, network: &str, channel: &str) {
        if let Some(chan) = self.channel_mut(network, channel) {
            chan.window.history.clear();
        }
    }

    fn deliver(&mut self, message: &Message<'_>) {
        let owned = OutboundMessage::from_message(message);
        if let Some(target) = owned.params.first().cloned() {
            let line = owned.params.last().cloned().unwrap_or_default();
            if let Some(chan) = self.channel_mut(&owned.network, &target) {
                chan.window.unseen += 1;
                chan.window.history.push(line);
            }
        }
        self.delivered.push(owned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ClientModel {
        let mut model = ClientModel::new();
        model
            .connect("freenode", "me")
            .join("freenode", "#test", ["alice", "Bob", "carol"]);
        model
    }

    #[test]
    fn test_queries_on_known_network() {
        let model = model();
        assert_eq!(model.networks(), vec!["freenode"]);
        assert_eq!(model.channels("freenode"), vec!["#test"]);
        assert_eq!(model.my_nick("freenode").as_deref(), Some("me"));

        let mut users = model.channel_users("freenode", "#TEST");
        users.sort();
        assert_eq!(users, vec!["Bob", "alice", "carol"]);
    }

    #[test]
    fn test_queries_on_unknown_network_are_empty() {
        let model = model();
        assert!(model.channels("libera").is_empty());
        assert!(model.channel_users("libera", "#test").is_empty());
        assert!(model.channel_users("freenode", "#other").is_empty());
        assert!(model.my_nick("libera").is_none());
    }

    #[test]
    fn test_members_are_a_set_under_case_mapping() {
        let mut model = model();
        model.join("freenode", "#test", ["BOB", "Alice"]);
        assert_eq!(model.channel_users("freenode", "#test").len(), 3);

        model.part("freenode", "#test", "bob");
        assert_eq!(model.channel_users("freenode", "#test").len(), 2);
    }

    #[test]
    fn test_disconnect_clears_nick() {
        let mut model = model();
        model.disconnect("freenode");
        assert!(model.my_nick("freenode").is_none());
        assert_eq!(model.networks(), vec!["freenode"]);
    }

    #[test]
    fn test_send_to_unknown_network_fails() {
        let mut model = model();
        let msg = OutboundMessage {
            network: "libera".into(),
            command: "PRIVMSG".into(),
            ..OutboundMessage::default()
        };
        assert_eq!(
            model.send_message(msg),
            Err(HostError::UnknownNetwork("libera".into()))
        );
        assert!(model.outbox().is_empty());
    }

    #[test]
    fn test_deliver_updates_window_and_mark_seen_is_idempotent() {
        let mut model = model();
        let msg = Message::new("freenode", "PRIVMSG")
            .with_param("#Test")
            .with_param("hi");
        model.deliver(&msg);
        model.deliver(&msg);

        let window = model.window("freenode", "#test").unwrap();
        assert_eq!(window.unseen, 2);
        assert_eq!(window.history, vec!["hi", "hi"]);

        model.mark_seen("freenode", "#test");
        model.mark_seen("freenode", "#test");
        assert_eq!(model.window("freenode", "#test").unwrap().unseen, 0);

        model.clear_window("freenode", "#test");
        model.clear_window("freenode", "#test");
        assert!(model.window("freenode", "#test").unwrap().history.is_empty());
        assert_eq!(model.delivered().len(), 2);
    }

    #[test]
    fn test_outbound_copy_keeps_tags_in_order() {
        let msg = Message::new("freenode", "TAGMSG")
            .with_tag("time", "2024-01-01T00:00:00Z")
            .with_tag("account", "alice");
        let owned = OutboundMessage::from_message(&msg);
        assert_eq!(
            owned.tags,
            vec![
                ("time".to_string(), "2024-01-01T00:00:00Z".to_string()),
                ("account".to_string(), "alice".to_string()),
            ]
        );
    }
}
