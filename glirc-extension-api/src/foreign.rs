//! Calling the host from inside an extension module.
//!
//! The host process exports the `glirc_*` functions; an extension cdylib
//! resolves them when it is loaded.

use std::cmp::Ordering;
use std::ffi::{c_char, c_int, c_void};

use crate::abi::{RawMessage, RawStr};
use crate::error::HostError;
use crate::host::Host;
use crate::message::Message;
use crate::owned::{OwnedString, OwnedStringList};
use crate::types::MessageCode;

unsafe extern "C" {
    fn glirc_send_message(glirc: *mut c_void, message: *const RawMessage) -> c_int;
    fn glirc_print(glirc: *mut c_void, code: c_int, msg: RawStr) -> c_int;
    fn glirc_list_networks(glirc: *mut c_void) -> *mut *mut c_char;
    fn glirc_list_channels(glirc: *mut c_void, network: RawStr) -> *mut *mut c_char;
    fn glirc_list_channel_users(
        glirc: *mut c_void,
        network: RawStr,
        channel: RawStr,
    ) -> *mut *mut c_char;
    fn glirc_my_nick(glirc: *mut c_void, network: RawStr) -> *mut c_char;
    fn glirc_mark_seen(glirc: *mut c_void, network: RawStr, channel: RawStr);
    fn glirc_clear_window(glirc: *mut c_void, network: RawStr, channel: RawStr);
    fn glirc_identifier_cmp(s: RawStr, t: RawStr) -> c_int;
}

/// [`Host`] implemented over the opaque context pointer the host passed in.
pub struct ForeignHost {
    glirc: *mut c_void,
}

impl ForeignHost {
    /// # Safety
    ///
    /// `glirc` must be the context pointer received in the current call
    /// from the host, and the wrapper must not outlive that call.
    pub unsafe fn new(glirc: *mut c_void) -> Self {
        Self { glirc }
    }

    fn strings(raw: *mut *mut c_char) -> Vec<String> {
        // SAFETY: list results transfer ownership to us.
        unsafe { OwnedStringList::from_raw(raw) }
            .map(|list| list.to_vec())
            .unwrap_or_default()
    }
}

impl Host for ForeignHost {
    fn send_message(&mut self, message: &Message<'_>) -> Result<(), HostError> {
        let raw = message.to_raw();
        HostError::from_status(unsafe { glirc_send_message(self.glirc, raw.as_ptr()) })
    }

    fn print(&mut self, code: MessageCode, text: &str) -> Result<(), HostError> {
        let msg = RawStr::from_bytes(text.as_bytes());
        HostError::from_status(unsafe { glirc_print(self.glirc, code.to_raw(), msg) })
    }

    fn list_networks(&self) -> Vec<String> {
        Self::strings(unsafe { glirc_list_networks(self.glirc) })
    }

    fn list_channels(&self, network: &str) -> Vec<String> {
        let network = RawStr::from_bytes(network.as_bytes());
        Self::strings(unsafe { glirc_list_channels(self.glirc, network) })
    }

    fn list_channel_users(&self, network: &str, channel: &str) -> Vec<String> {
        let network = RawStr::from_bytes(network.as_bytes());
        let channel = RawStr::from_bytes(channel.as_bytes());
        Self::strings(unsafe { glirc_list_channel_users(self.glirc, network, channel) })
    }

    fn my_nick(&self, network: &str) -> Option<String> {
        let network = RawStr::from_bytes(network.as_bytes());
        // SAFETY: the nick is transferred to us; null means unknown.
        unsafe { OwnedString::from_raw(glirc_my_nick(self.glirc, network)) }
            .map(|nick| nick.to_string_lossy())
    }

    fn mark_seen(&mut self, network: &str, channel: &str) {
        let network = RawStr::from_bytes(network.as_bytes());
        let channel = RawStr::from_bytes(channel.as_bytes());
        unsafe { glirc_mark_seen(self.glirc, network, channel) }
    }

    fn clear_window(&mut self, network: &str, channel: &str) {
        let network = RawStr::from_bytes(network.as_bytes());
        let channel = RawStr::from_bytes(channel.as_bytes());
        unsafe { glirc_clear_window(self.glirc, network, channel) }
    }

    fn identifier_cmp(&self, s: &str, t: &str) -> Ordering {
        let s = RawStr::from_bytes(s.as_bytes());
        let t = RawStr::from_bytes(t.as_bytes());
        unsafe { glirc_identifier_cmp(s, t) }.cmp(&0)
    }
}
