//! Borrowed views of protocol messages and client commands.
//!
//! Every byte slice in a [`Message`] or [`Command`] borrows from the caller
//! for a single lifetime `'a`: the duration of one dispatch call. Extensions
//! that need to keep anything must copy it out (see [`Message::to_owned_strings`]).

use std::borrow::Cow;

use crate::abi::{self, RawCommand, RawCommandBuf, RawMessage, RawMessageBuf, RawStr};

/// One message tag. Keys are not unique; order is preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
}

/// An inbound or outbound protocol message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message<'a> {
    /// Connection the message arrived on or is destined for
    pub network: &'a [u8],
    pub prefix_nick: &'a [u8],
    pub prefix_user: &'a [u8],
    pub prefix_host: &'a [u8],
    /// Protocol verb or three-digit numeric
    pub command: &'a [u8],
    /// Positional parameters
    pub params: Vec<&'a [u8]>,
    /// Tags in wire order; duplicates are kept
    pub tags: Vec<Tag<'a>>,
}

impl<'a> Message<'a> {
    /// Start a message for `network` with the given command.
    pub fn new<N, C>(network: &'a N, command: &'a C) -> Self
    where
        N: AsRef<[u8]> + ?Sized,
        C: AsRef<[u8]> + ?Sized,
    {
        Self {
            network: network.as_ref(),
            command: command.as_ref(),
            ..Self::default()
        }
    }

    /// Builder: set the origin prefix.
    pub fn with_prefix<S>(mut self, nick: &'a S, user: &'a S, host: &'a S) -> Self
    where
        S: AsRef<[u8]> + ?Sized,
    {
        self.prefix_nick = nick.as_ref();
        self.prefix_user = user.as_ref();
        self.prefix_host = host.as_ref();
        self
    }

    /// Builder: append a positional parameter.
    pub fn with_param<S: AsRef<[u8]> + ?Sized>(mut self, param: &'a S) -> Self {
        self.params.push(param.as_ref());
        self
    }

    /// Builder: append a tag.
    pub fn with_tag<K, V>(mut self, key: &'a K, value: &'a V) -> Self
    where
        K: AsRef<[u8]> + ?Sized,
        V: AsRef<[u8]> + ?Sized,
    {
        self.tags.push(Tag {
            key: key.as_ref(),
            value: value.as_ref(),
        });
        self
    }

    /// Build a view over a raw record received through the C ABI.
    ///
    /// # Safety
    ///
    /// Every view and array in `raw` must be valid for `'a`; `params` must
    /// hold `params_n` entries and both `tagkeys` and `tagvals` must hold
    /// `tags_n` entries.
    pub unsafe fn from_raw(raw: &'a RawMessage) -> Self {
        // SAFETY: upheld by the caller.
        unsafe {
            let keys = abi::views(raw.tagkeys, raw.tags_n);
            let vals = abi::views(raw.tagvals, raw.tags_n);
            Self {
                network: raw.network.as_bytes(),
                prefix_nick: raw.prefix_nick.as_bytes(),
                prefix_user: raw.prefix_user.as_bytes(),
                prefix_host: raw.prefix_host.as_bytes(),
                command: raw.command.as_bytes(),
                params: abi::views(raw.params, raw.params_n),
                tags: keys
                    .into_iter()
                    .zip(vals)
                    .map(|(key, value)| Tag { key, value })
                    .collect(),
            }
        }
    }

    /// Lay the message out as a raw record for the C ABI.
    pub fn to_raw(&self) -> RawMessageBuf<'_> {
        let raw = RawMessage {
            network: RawStr::from_bytes(self.network),
            prefix_nick: RawStr::from_bytes(self.prefix_nick),
            prefix_user: RawStr::from_bytes(self.prefix_user),
            prefix_host: RawStr::from_bytes(self.prefix_host),
            command: RawStr::from_bytes(self.command),
            params: std::ptr::null(),
            params_n: 0,
            tagkeys: std::ptr::null(),
            tagvals: std::ptr::null(),
            tags_n: 0,
        };
        let params = self.params.iter().map(|p| RawStr::from_bytes(p)).collect();
        let keys = self.tags.iter().map(|t| RawStr::from_bytes(t.key)).collect();
        let vals = self.tags.iter().map(|t| RawStr::from_bytes(t.value)).collect();
        RawMessageBuf::new(raw, params, keys, vals)
    }

    pub fn network_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.network)
    }

    pub fn command_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.command)
    }

    pub fn param(&self, index: usize) -> Option<&'a [u8]> {
        self.params.get(index).copied()
    }

    /// First value for `key`, if any.
    pub fn tag(&self, key: &[u8]) -> Option<&'a [u8]> {
        self.tags.iter().find(|t| t.key == key).map(|t| t.value)
    }

    /// Tag keys in order.
    pub fn tag_keys(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.tags.iter().map(|t| t.key)
    }

    /// Tag values in the same order as [`Message::tag_keys`].
    pub fn tag_values(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.tags.iter().map(|t| t.value)
    }

    /// Copy the parameters out so they survive the dispatch call.
    pub fn to_owned_strings(&self) -> Vec<String> {
        self.params
            .iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect()
    }
}

/// A locally issued client command, e.g. typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command<'a> {
    pub params: Vec<&'a [u8]>,
}

impl<'a> Command<'a> {
    pub fn new<S: AsRef<[u8]> + ?Sized>(params: &[&'a S]) -> Self {
        Self {
            params: params.iter().map(|&p| p.as_ref()).collect(),
        }
    }

    /// Build a view over a raw record received through the C ABI.
    ///
    /// # Safety
    ///
    /// `raw.params` must hold `raw.params_n` views valid for `'a`.
    pub unsafe fn from_raw(raw: &'a RawCommand) -> Self {
        Self {
            // SAFETY: upheld by the caller.
            params: unsafe { abi::views(raw.params, raw.params_n) },
        }
    }

    pub fn to_raw(&self) -> RawCommandBuf<'_> {
        RawCommandBuf::new(self.params.iter().map(|p| RawStr::from_bytes(p)).collect())
    }

    /// The command name (first parameter), if any.
    pub fn name(&self) -> Option<Cow<'a, str>> {
        self.params.first().map(|p| String::from_utf8_lossy(*p))
    }

    /// Parameters after the command name.
    pub fn args(&self) -> &[&'a [u8]] {
        self.params.get(1..).unwrap_or(&[])
    }

    pub fn to_owned_strings(&self) -> Vec<String> {
        self.params
            .iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect()
    }
}
