//! Drivers: how the host calls into one extension.
//!
//! [`ForeignDriver`] calls through the C descriptor slots, either from a
//! loaded module or from a descriptor linked into the process.
//! [`NativeDriver`] calls a Rust [`Extension`] directly, without crossing
//! the C ABI.

use std::any::Any;
use std::ffi::{CStr, CString, c_void};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use glirc_extension_api::abi::{DESCRIPTOR_SYMBOL, ExtensionDescriptor};
use glirc_extension_api::{
    API_MAJOR_VERSION, API_MINOR_VERSION, Command, Extension, Host, Message, ProcessResult,
};
use libloading::Library;

use crate::context::HostContext;
use crate::error::ExtensionHostError;

/// Which descriptor slots an extension fills in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slots {
    pub start: bool,
    pub stop: bool,
    pub process_message: bool,
    pub process_command: bool,
}

impl Slots {
    pub const ALL: Slots = Slots {
        start: true,
        stop: true,
        process_message: true,
        process_command: true,
    };

    fn of(descriptor: &ExtensionDescriptor) -> Self {
        Self {
            start: descriptor.start.is_some(),
            stop: descriptor.stop.is_some(),
            process_message: descriptor.process_message.is_some(),
            process_command: descriptor.process_command.is_some(),
        }
    }

    /// Names of the filled slots, in descriptor order.
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.start, "start"),
            (self.stop, "stop"),
            (self.process_message, "process_message"),
            (self.process_command, "process_command"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }
}

/// Descriptor metadata copied out of the module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorInfo {
    pub name: String,
    pub major_version: i32,
    pub minor_version: i32,
    pub slots: Slots,
}

impl DescriptorInfo {
    /// Validate and copy a descriptor.
    ///
    /// # Safety
    ///
    /// `descriptor.name`, if non-null, must point at a NUL-terminated string.
    unsafe fn read(descriptor: &ExtensionDescriptor, path: &Path) -> Result<Self, ExtensionHostError> {
        let invalid = |reason: &str| ExtensionHostError::InvalidDescriptor {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        if descriptor.name.is_null() {
            return Err(invalid("name is null"));
        }
        // SAFETY: upheld by the caller.
        let name = unsafe { CStr::from_ptr(descriptor.name) }
            .to_str()
            .map_err(|_| invalid("name is not valid UTF-8"))?;
        if name.is_empty() {
            return Err(invalid("name is empty"));
        }

        Ok(Self {
            name: name.to_string(),
            major_version: descriptor.major_version,
            minor_version: descriptor.minor_version,
            slots: Slots::of(descriptor),
        })
    }

    pub fn version(&self) -> String {
        format!("{}.{}", self.major_version, self.minor_version)
    }
}

/// The opaque per-instance handle returned by a successful start.
pub struct InstanceHandle(Handle);

enum Handle {
    Foreign(*mut c_void),
    Native(Box<dyn Any>),
}

impl InstanceHandle {
    pub fn foreign(state: *mut c_void) -> Self {
        Self(Handle::Foreign(state))
    }

    pub fn native<T: 'static>(state: T) -> Self {
        Self(Handle::Native(Box::new(state)))
    }

    /// The raw pointer to hand back to a foreign extension; null for
    /// native handles.
    pub fn as_ptr(&self) -> *mut c_void {
        match &self.0 {
            Handle::Foreign(ptr) => *ptr,
            Handle::Native(_) => std::ptr::null_mut(),
        }
    }

    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        match &mut self.0 {
            Handle::Native(state) => state.downcast_mut(),
            Handle::Foreign(_) => None,
        }
    }

    pub fn into_native<T: 'static>(self) -> Option<T> {
        match self.0 {
            Handle::Native(state) => state.downcast().ok().map(|b| *b),
            Handle::Foreign(_) => None,
        }
    }
}

impl std::fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Handle::Foreign(ptr) => f.debug_tuple("Foreign").field(ptr).finish(),
            Handle::Native(_) => f.write_str("Native(..)"),
        }
    }
}

/// Calls into a single extension.
///
/// Drivers are stateless with respect to instances: the handle returned by
/// `start` is threaded back through every later call. The host guarantees
/// `stop`, `process_message` and `process_command` only ever see a handle
/// from a successful `start`, and `stop` at most once.
pub trait ExtensionDriver {
    fn info(&self) -> &DescriptorInfo;

    /// `None` means the extension failed to start.
    fn start(&self, ctx: &mut HostContext<'_>, path: &Path) -> Option<InstanceHandle>;

    fn stop(&self, ctx: &mut HostContext<'_>, handle: InstanceHandle);

    fn process_message(
        &self,
        ctx: &mut HostContext<'_>,
        handle: &mut InstanceHandle,
        message: &Message<'_>,
    ) -> ProcessResult;

    fn process_command(
        &self,
        ctx: &mut HostContext<'_>,
        handle: &mut InstanceHandle,
        command: &Command<'_>,
    );
}

fn context_ptr(ctx: &mut HostContext<'_>) -> *mut c_void {
    (ctx as *mut HostContext<'_>).cast()
}

/// Drives an extension through its C descriptor.
pub struct ForeignDriver {
    descriptor: NonNull<ExtensionDescriptor>,
    info: DescriptorInfo,
    path: Option<PathBuf>,
    // Dropped last so the descriptor and code stay mapped until then.
    _library: Option<Library>,
}

impl ForeignDriver {
    /// Load a module and resolve its `extension` descriptor.
    pub fn open(path: &Path) -> Result<Self, ExtensionHostError> {
        // SAFETY: loading runs the module's initializers; the user chose
        // to load it.
        let library = unsafe { Library::new(path)? };
        Self::from_library(library, path)
    }

    /// Resolve an `extension` descriptor exported by the running executable.
    ///
    /// The executable must put its symbols in the dynamic symbol table
    /// (`-rdynamic`), otherwise the lookup fails with `LibraryLoad`.
    #[cfg(unix)]
    pub fn open_self() -> Result<Self, ExtensionHostError> {
        let library: Library = libloading::os::unix::Library::this().into();
        let path = std::env::current_exe()?;
        Self::from_library(library, &path)
    }

    fn from_library(library: Library, path: &Path) -> Result<Self, ExtensionHostError> {
        // SAFETY: the symbol is a data symbol of type `struct glirc_extension`.
        let descriptor = unsafe {
            let symbol = library.get::<*const ExtensionDescriptor>(DESCRIPTOR_SYMBOL)?;
            *symbol
        };
        let descriptor =
            NonNull::new(descriptor.cast_mut()).ok_or_else(|| ExtensionHostError::InvalidDescriptor {
                path: path.to_path_buf(),
                reason: "descriptor symbol is null".to_string(),
            })?;
        // SAFETY: the descriptor lives as long as `library`, which we keep.
        let info = unsafe { DescriptorInfo::read(descriptor.as_ref(), path)? };

        Ok(Self {
            descriptor,
            info,
            path: Some(path.to_path_buf()),
            _library: Some(library),
        })
    }

    /// Drive a descriptor that is linked into this process.
    pub fn from_static(descriptor: &'static ExtensionDescriptor) -> Result<Self, ExtensionHostError> {
        // SAFETY: a static descriptor's name is static text.
        let info = unsafe { DescriptorInfo::read(descriptor, Path::new("<static>"))? };
        Ok(Self {
            descriptor: NonNull::from(descriptor),
            info,
            path: None,
            _library: None,
        })
    }

    /// Module path, if this driver owns a loaded library.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn descriptor(&self) -> &ExtensionDescriptor {
        // SAFETY: valid while `_library` is held, or static.
        unsafe { self.descriptor.as_ref() }
    }
}

impl ExtensionDriver for ForeignDriver {
    fn info(&self) -> &DescriptorInfo {
        &self.info
    }

    fn start(&self, ctx: &mut HostContext<'_>, path: &Path) -> Option<InstanceHandle> {
        let Some(start) = self.descriptor().start else {
            return Some(InstanceHandle::foreign(std::ptr::null_mut()));
        };
        let Ok(path) = CString::new(path.to_string_lossy().into_owned()) else {
            tracing::warn!(extension = %self.info.name, "Module path contains a NUL byte");
            return None;
        };

        // SAFETY: the context outlives the call and `path` is NUL-terminated.
        let state = unsafe { start(context_ptr(ctx), path.as_ptr()) };
        if state.is_null() {
            None
        } else {
            Some(InstanceHandle::foreign(state))
        }
    }

    fn stop(&self, ctx: &mut HostContext<'_>, handle: InstanceHandle) {
        if let Some(stop) = self.descriptor().stop {
            // SAFETY: the handle came from this extension's `start`.
            unsafe { stop(context_ptr(ctx), handle.as_ptr()) }
        }
    }

    fn process_message(
        &self,
        ctx: &mut HostContext<'_>,
        handle: &mut InstanceHandle,
        message: &Message<'_>,
    ) -> ProcessResult {
        let Some(process) = self.descriptor().process_message else {
            return ProcessResult::Pass;
        };
        let raw = message.to_raw();
        // SAFETY: `raw` and the views it points into outlive the call.
        ProcessResult::from_raw(unsafe { process(context_ptr(ctx), handle.as_ptr(), raw.as_ptr()) })
    }

    fn process_command(
        &self,
        ctx: &mut HostContext<'_>,
        handle: &mut InstanceHandle,
        command: &Command<'_>,
    ) {
        if let Some(process) = self.descriptor().process_command {
            let raw = command.to_raw();
            // SAFETY: as for `process_message`.
            unsafe { process(context_ptr(ctx), handle.as_ptr(), raw.as_ptr()) }
        }
    }
}

/// Drives a Rust [`Extension`] in-process.
pub struct NativeDriver<E> {
    info: DescriptorInfo,
    _extension: PhantomData<fn() -> E>,
}

impl<E: Extension + 'static> NativeDriver<E> {
    /// Driver reporting the host's own API version.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_version(name, API_MAJOR_VERSION, API_MINOR_VERSION)
    }

    pub fn with_version(name: impl Into<String>, major_version: i32, minor_version: i32) -> Self {
        Self {
            info: DescriptorInfo {
                name: name.into(),
                major_version,
                minor_version,
                slots: Slots::ALL,
            },
            _extension: PhantomData,
        }
    }
}

impl<E: Extension + 'static> ExtensionDriver for NativeDriver<E> {
    fn info(&self) -> &DescriptorInfo {
        &self.info
    }

    fn start(&self, ctx: &mut HostContext<'_>, path: &Path) -> Option<InstanceHandle> {
        match E::start(ctx, path) {
            Ok(state) => Some(InstanceHandle::native(state)),
            Err(e) => {
                tracing::warn!(extension = %self.info.name, error = %e, "Extension start failed");
                let _ = ctx.print_error(&format!("{}: failed to start: {e}", self.info.name));
                None
            }
        }
    }

    fn stop(&self, ctx: &mut HostContext<'_>, handle: InstanceHandle) {
        if let Some(state) = handle.into_native::<E>() {
            state.stop(ctx);
        }
    }

    fn process_message(
        &self,
        ctx: &mut HostContext<'_>,
        handle: &mut InstanceHandle,
        message: &Message<'_>,
    ) -> ProcessResult {
        handle
            .downcast_mut::<E>()
            .map(|state| state.process_message(ctx, message))
            .unwrap_or_default()
    }

    fn process_command(
        &self,
        ctx: &mut HostContext<'_>,
        handle: &mut InstanceHandle,
        command: &Command<'_>,
    ) {
        if let Some(state) = handle.downcast_mut::<E>() {
            state.process_command(ctx, command);
        }
    }
}
