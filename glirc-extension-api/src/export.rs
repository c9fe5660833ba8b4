//! `extern "C"` shims that adapt an [`Extension`] to the descriptor slots.
//!
//! The state returned by `start` is boxed and its pointer becomes the opaque
//! handle. Panics never cross the boundary: a panicking `start` reports
//! failure, a panicking handler passes the message.

use std::ffi::{CStr, c_char, c_int, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use crate::abi::{ExtensionDescriptor, PASS_MESSAGE, RawCommand, RawMessage};
use crate::extension::Extension;
use crate::foreign::ForeignHost;
use crate::host::Host;
use crate::message::{Command, Message};

impl ExtensionDescriptor {
    /// Descriptor whose four slots drive `E`.
    pub const fn for_extension<E: Extension>(
        name: &'static CStr,
        major_version: c_int,
        minor_version: c_int,
    ) -> Self {
        Self {
            name: name.as_ptr(),
            major_version,
            minor_version,
            start: Some(start::<E>),
            stop: Some(stop::<E>),
            process_message: Some(process_message::<E>),
            process_command: Some(process_command::<E>),
        }
    }
}

unsafe extern "C" fn start<E: Extension>(glirc: *mut c_void, path: *const c_char) -> *mut c_void {
    // SAFETY: glirc is the context for this call.
    let mut host = unsafe { ForeignHost::new(glirc) };
    let path = if path.is_null() {
        PathBuf::new()
    } else {
        // SAFETY: the host passes a NUL-terminated path.
        PathBuf::from(unsafe { CStr::from_ptr(path) }.to_string_lossy().into_owned())
    };

    match panic::catch_unwind(AssertUnwindSafe(|| E::start(&mut host, &path))) {
        Ok(Ok(state)) => Box::into_raw(Box::new(state)).cast(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, path = %path.display(), "Extension start failed");
            let _ = host.print_error(&format!("extension failed to start: {e}"));
            std::ptr::null_mut()
        }
        Err(_) => {
            tracing::error!(path = %path.display(), "Extension panicked in start");
            std::ptr::null_mut()
        }
    }
}

unsafe extern "C" fn stop<E: Extension>(glirc: *mut c_void, state: *mut c_void) {
    if state.is_null() {
        return;
    }
    // SAFETY: state came from Box::into_raw in `start` and stop runs once.
    let state = *unsafe { Box::from_raw(state.cast::<E>()) };
    let mut host = unsafe { ForeignHost::new(glirc) };
    if panic::catch_unwind(AssertUnwindSafe(|| state.stop(&mut host))).is_err() {
        tracing::error!("Extension panicked in stop");
    }
}

unsafe extern "C" fn process_message<E: Extension>(
    glirc: *mut c_void,
    state: *mut c_void,
    message: *const RawMessage,
) -> c_int {
    if state.is_null() || message.is_null() {
        return PASS_MESSAGE;
    }
    // SAFETY: state is the live handle from `start`; the host serializes calls.
    let ext = unsafe { &mut *state.cast::<E>() };
    let mut host = unsafe { ForeignHost::new(glirc) };
    // SAFETY: the record and its views are valid for this call.
    let message = unsafe { Message::from_raw(&*message) };

    panic::catch_unwind(AssertUnwindSafe(|| ext.process_message(&mut host, &message)))
        .map(|verdict| verdict.to_raw())
        .unwrap_or_else(|_| {
            tracing::error!("Extension panicked in process_message");
            PASS_MESSAGE
        })
}

unsafe extern "C" fn process_command<E: Extension>(
    glirc: *mut c_void,
    state: *mut c_void,
    command: *const RawCommand,
) {
    if state.is_null() || command.is_null() {
        return;
    }
    let ext = unsafe { &mut *state.cast::<E>() };
    let mut host = unsafe { ForeignHost::new(glirc) };
    let command = unsafe { Command::from_raw(&*command) };

    if panic::catch_unwind(AssertUnwindSafe(|| ext.process_command(&mut host, &command))).is_err() {
        tracing::error!("Extension panicked in process_command");
    }
}
