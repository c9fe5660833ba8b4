//! C ABI records shared between the host and extension modules.
//!
//! These mirror `glirc-api.h` field for field. Everything here is plain
//! `#[repr(C)]` data; the safe views live in [`crate::message`].

use std::ffi::{c_char, c_int, c_void};
use std::marker::PhantomData;

/// Borrowed string view: a byte pointer and a length.
///
/// Not null-terminated and not owned by the receiver. A null pointer with
/// length zero is the empty view.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawStr {
    pub str: *const c_char,
    pub len: usize,
}

impl RawStr {
    /// The empty view.
    pub const EMPTY: RawStr = RawStr {
        str: std::ptr::null(),
        len: 0,
    };

    /// Borrow `bytes` as a raw view. The view is only valid while `bytes` is.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            str: bytes.as_ptr().cast(),
            len: bytes.len(),
        }
    }

    /// Reinterpret the view as a byte slice.
    ///
    /// # Safety
    ///
    /// `str` must point to `len` initialized bytes that stay valid and
    /// unmodified for `'a`. A null pointer is accepted only when `len` is 0.
    pub unsafe fn as_bytes<'a>(self) -> &'a [u8] {
        if self.str.is_null() || self.len == 0 {
            &[]
        } else {
            // SAFETY: upheld by the caller.
            unsafe { std::slice::from_raw_parts(self.str.cast::<u8>(), self.len) }
        }
    }
}

impl Default for RawStr {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// `struct glirc_message`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawMessage {
    pub network: RawStr,
    pub prefix_nick: RawStr,
    pub prefix_user: RawStr,
    pub prefix_host: RawStr,
    pub command: RawStr,
    pub params: *const RawStr,
    pub params_n: usize,
    pub tagkeys: *const RawStr,
    pub tagvals: *const RawStr,
    pub tags_n: usize,
}

/// `struct glirc_command`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawCommand {
    pub params: *const RawStr,
    pub params_n: usize,
}

/// `enum message_code` as passed to `glirc_print`.
pub const NORMAL_MESSAGE: c_int = 0;
pub const ERROR_MESSAGE: c_int = 1;

/// `enum process_result` as returned by `process_message`.
pub const PASS_MESSAGE: c_int = 0;
pub const DROP_MESSAGE: c_int = 1;

/// `start(glirc, path) -> state`; null means the extension failed to start.
pub type StartFn = unsafe extern "C" fn(glirc: *mut c_void, path: *const c_char) -> *mut c_void;

/// `stop(glirc, state)`; consumes the state returned by `start`.
pub type StopFn = unsafe extern "C" fn(glirc: *mut c_void, state: *mut c_void);

/// `process_message(glirc, state, message) -> process_result`
pub type ProcessMessageFn =
    unsafe extern "C" fn(glirc: *mut c_void, state: *mut c_void, message: *const RawMessage) -> c_int;

/// `process_command(glirc, state, command)`
pub type ProcessCommandFn =
    unsafe extern "C" fn(glirc: *mut c_void, state: *mut c_void, command: *const RawCommand);

/// `struct glirc_extension`, exported by every extension module under the
/// symbol name [`DESCRIPTOR_SYMBOL`].
///
/// Any callback slot may be null; a missing `process_message` passes every
/// message and a missing `start` leaves the state handle null.
#[repr(C)]
#[derive(Debug)]
pub struct ExtensionDescriptor {
    pub name: *const c_char,
    pub major_version: c_int,
    pub minor_version: c_int,
    pub start: Option<StartFn>,
    pub stop: Option<StopFn>,
    pub process_message: Option<ProcessMessageFn>,
    pub process_command: Option<ProcessCommandFn>,
}

// SAFETY: the descriptor is immutable after load; `name` points at static
// text owned by the module.
unsafe impl Sync for ExtensionDescriptor {}

/// Name of the exported descriptor symbol.
pub const DESCRIPTOR_SYMBOL: &[u8] = b"extension\0";

/// Backing storage for a [`RawMessage`] built from a safe view.
///
/// The raw record points into the vectors held here and into the borrowed
/// bytes of the source message, so it cannot outlive `'a`.
pub struct RawMessageBuf<'a> {
    raw: RawMessage,
    _params: Vec<RawStr>,
    _keys: Vec<RawStr>,
    _vals: Vec<RawStr>,
    _borrow: PhantomData<&'a [u8]>,
}

impl<'a> RawMessageBuf<'a> {
    pub(crate) fn new(
        mut raw: RawMessage,
        params: Vec<RawStr>,
        keys: Vec<RawStr>,
        vals: Vec<RawStr>,
    ) -> Self {
        raw.params = params.as_ptr();
        raw.params_n = params.len();
        raw.tagkeys = keys.as_ptr();
        raw.tagvals = vals.as_ptr();
        raw.tags_n = keys.len();
        Self {
            raw,
            _params: params,
            _keys: keys,
            _vals: vals,
            _borrow: PhantomData,
        }
    }

    pub fn as_raw(&self) -> &RawMessage {
        &self.raw
    }

    pub fn as_ptr(&self) -> *const RawMessage {
        &self.raw
    }
}

/// Backing storage for a [`RawCommand`] built from a safe view.
pub struct RawCommandBuf<'a> {
    raw: RawCommand,
    _params: Vec<RawStr>,
    _borrow: PhantomData<&'a [u8]>,
}

impl<'a> RawCommandBuf<'a> {
    pub(crate) fn new(params: Vec<RawStr>) -> Self {
        Self {
            raw: RawCommand {
                params: params.as_ptr(),
                params_n: params.len(),
            },
            _params: params,
            _borrow: PhantomData,
        }
    }

    pub fn as_raw(&self) -> &RawCommand {
        &self.raw
    }

    pub fn as_ptr(&self) -> *const RawCommand {
        &self.raw
    }
}

/// Read `n` views starting at `ptr`.
///
/// # Safety
///
/// `ptr` must point to `n` valid [`RawStr`] records, each satisfying the
/// contract of [`RawStr::as_bytes`] for `'a`. Null is accepted when `n` is 0.
pub(crate) unsafe fn views<'a>(ptr: *const RawStr, n: usize) -> Vec<&'a [u8]> {
    if ptr.is_null() || n == 0 {
        return Vec::new();
    }
    // SAFETY: upheld by the caller.
    let raw = unsafe { std::slice::from_raw_parts(ptr, n) };
    raw.iter().map(|s| unsafe { s.as_bytes() }).collect()
}
