//! The `glirc_*` functions exported to extension modules.
//!
//! Names and signatures follow `glirc-api.h`. The first argument is the
//! context pointer the host passed into the current extension call, which
//! points at a [`HostContext`]. List and string results are allocated with
//! `malloc` and ownership transfers to the caller.
//!
//! A host binary must export its dynamic symbols (`-rdynamic`) for modules
//! to resolve these at load time.

use std::ffi::{c_char, c_int, c_void};
use std::panic::{self, AssertUnwindSafe};

use glirc_extension_api::abi::{RawMessage, RawStr};
use glirc_extension_api::{
    Host, HostError, Message, MessageCode, OwnedString, OwnedStringList, identifier_cmp,
};

use crate::context::HostContext;

/// Run `f` against the context behind `glirc`, or return `fallback` when
/// the pointer is null or the client panics.
///
/// # Safety
///
/// `glirc` must be null or the context pointer of an extension call that
/// is still in progress.
unsafe fn with_context<R>(
    glirc: *mut c_void,
    fallback: R,
    f: impl FnOnce(&mut HostContext<'_>) -> R,
) -> R {
    if glirc.is_null() {
        return fallback;
    }
    // SAFETY: upheld by the caller; the host does not touch the context
    // while the extension runs.
    let ctx = unsafe { &mut *glirc.cast::<HostContext<'_>>() };
    match panic::catch_unwind(AssertUnwindSafe(|| f(ctx))) {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Client panicked while serving an extension call");
            fallback
        }
    }
}

fn text(view: RawStr) -> String {
    // SAFETY: views passed by extensions are valid for the call.
    String::from_utf8_lossy(unsafe { view.as_bytes() }).into_owned()
}

/// Submit a message for transmission. Returns 0 on success.
///
/// # Safety
///
/// `glirc` must be a live context pointer and `message` a valid record.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn glirc_send_message(glirc: *mut c_void, message: *const RawMessage) -> c_int {
    if message.is_null() {
        return HostError::STATUS_INVALID_ARGUMENT;
    }
    // SAFETY: the record and its views are valid for this call.
    let message = unsafe { Message::from_raw(&*message) };
    unsafe {
        with_context(glirc, HostError::STATUS_FAILED, |ctx| {
            HostError::to_status(ctx.send_message(&message))
        })
    }
}

/// Print a line to the client UI. Returns 0 on success.
///
/// # Safety
///
/// `glirc` must be a live context pointer and `msg` a valid view.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn glirc_print(glirc: *mut c_void, code: c_int, msg: RawStr) -> c_int {
    let Some(code) = MessageCode::from_raw(code) else {
        return HostError::STATUS_INVALID_ARGUMENT;
    };
    let text = text(msg);
    unsafe {
        with_context(glirc, HostError::STATUS_FAILED, |ctx| {
            HostError::to_status(ctx.print(code, &text))
        })
    }
}

/// Null-terminated list of network names; the caller frees it.
///
/// # Safety
///
/// `glirc` must be a live context pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn glirc_list_networks(glirc: *mut c_void) -> *mut *mut c_char {
    let names = unsafe { with_context(glirc, Vec::new(), |ctx| ctx.list_networks()) };
    OwnedStringList::from_strings(names).into_raw()
}

/// Null-terminated list of channels on `network`; the caller frees it.
///
/// # Safety
///
/// `glirc` must be a live context pointer and `network` a valid view.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn glirc_list_channels(glirc: *mut c_void, network: RawStr) -> *mut *mut c_char {
    let network = text(network);
    let names = unsafe { with_context(glirc, Vec::new(), |ctx| ctx.list_channels(&network)) };
    OwnedStringList::from_strings(names).into_raw()
}

/// Null-terminated list of members of `channel`; the caller frees it.
///
/// # Safety
///
/// `glirc` must be a live context pointer and both views valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn glirc_list_channel_users(
    glirc: *mut c_void,
    network: RawStr,
    channel: RawStr,
) -> *mut *mut c_char {
    let network = text(network);
    let channel = text(channel);
    let names = unsafe {
        with_context(glirc, Vec::new(), |ctx| {
            ctx.list_channel_users(&network, &channel)
        })
    };
    OwnedStringList::from_strings(names).into_raw()
}

/// Our nickname on `network`, or null; the caller frees it.
///
/// # Safety
///
/// `glirc` must be a live context pointer and `network` a valid view.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn glirc_my_nick(glirc: *mut c_void, network: RawStr) -> *mut c_char {
    let network = text(network);
    unsafe { with_context(glirc, None, |ctx| ctx.my_nick(&network)) }
        .map_or(std::ptr::null_mut(), |nick| OwnedString::new(&nick).into_raw())
}

/// # Safety
///
/// `glirc` must be a live context pointer and both views valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn glirc_mark_seen(glirc: *mut c_void, network: RawStr, channel: RawStr) {
    let network = text(network);
    let channel = text(channel);
    unsafe { with_context(glirc, (), |ctx| ctx.mark_seen(&network, &channel)) }
}

/// # Safety
///
/// `glirc` must be a live context pointer and both views valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn glirc_clear_window(glirc: *mut c_void, network: RawStr, channel: RawStr) {
    let network = text(network);
    let channel = text(channel);
    unsafe { with_context(glirc, (), |ctx| ctx.clear_window(&network, &channel)) }
}

/// Three-way identifier comparison: negative, zero or positive.
///
/// # Safety
///
/// Both views must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn glirc_identifier_cmp(s: RawStr, t: RawStr) -> c_int {
    let (s, t) = unsafe { (s.as_bytes(), t.as_bytes()) };
    identifier_cmp(s, t) as c_int
}

/// Addresses of every exported callback.
///
/// A binary that loads extensions passes this through
/// [`std::hint::black_box`] so the linker keeps the symbols even though
/// nothing in the binary calls them.
pub fn exported_callbacks() -> [*const c_void; 9] {
    [
        glirc_send_message as *const c_void,
        glirc_print as *const c_void,
        glirc_list_networks as *const c_void,
        glirc_list_channels as *const c_void,
        glirc_list_channel_users as *const c_void,
        glirc_my_nick as *const c_void,
        glirc_mark_seen as *const c_void,
        glirc_clear_window as *const c_void,
        glirc_identifier_cmp as *const c_void,
    ]
}
