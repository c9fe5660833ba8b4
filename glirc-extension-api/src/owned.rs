//! Results whose ownership transfers from the host to the caller.
//!
//! The host allocates these with the C allocator and hands them over; from
//! then on the receiver owns them and must release them with `free`, never
//! the host. [`OwnedString`] and [`OwnedStringList`] hold such an allocation
//! and release it on drop, so the transfer is visible in the type instead of
//! being a calling convention.

use std::alloc::Layout;
use std::ffi::{CStr, c_char};
use std::fmt;
use std::ptr::NonNull;

fn malloc_or_abort<T>(count: usize) -> NonNull<T> {
    let size = count.max(1) * size_of::<T>();
    // SAFETY: malloc with a non-zero size; null is handled below.
    let ptr = unsafe { libc::malloc(size) }.cast::<T>();
    NonNull::new(ptr).unwrap_or_else(|| {
        let layout = Layout::array::<T>(count.max(1)).unwrap_or(Layout::new::<T>());
        std::alloc::handle_alloc_error(layout)
    })
}

/// A single null-terminated string allocated with `malloc`.
pub struct OwnedString {
    ptr: NonNull<c_char>,
}

impl OwnedString {
    /// Copy `s` into a fresh C allocation. Text after an interior NUL is
    /// dropped, since the result is NUL-terminated.
    pub fn new(s: &str) -> Self {
        let bytes = s.as_bytes();
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let ptr = malloc_or_abort::<c_char>(len + 1);
        // SAFETY: ptr has room for len + 1 bytes and does not overlap `bytes`.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr().cast::<c_char>(), ptr.as_ptr(), len);
            ptr.as_ptr().add(len).write(0);
        }
        Self { ptr }
    }

    /// Take ownership of a string handed over through the C ABI.
    ///
    /// Returns `None` for the null sentinel.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a NUL-terminated string allocated with `malloc`
    /// that nobody else will free.
    pub unsafe fn from_raw(ptr: *mut c_char) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    /// Give up ownership; the receiver becomes responsible for `free`.
    pub fn into_raw(self) -> *mut c_char {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }

    pub fn as_c_str(&self) -> &CStr {
        // SAFETY: the allocation is NUL-terminated and owned by self.
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
    }

    pub fn to_string_lossy(&self) -> String {
        self.as_c_str().to_string_lossy().into_owned()
    }
}

impl Drop for OwnedString {
    fn drop(&mut self) {
        // SAFETY: allocated with malloc and exclusively owned.
        unsafe { libc::free(self.ptr.as_ptr().cast()) }
    }
}

impl fmt::Debug for OwnedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_c_str(), f)
    }
}

/// A null-terminated array of [`OwnedString`] pointers, itself allocated
/// with `malloc`.
///
/// An empty list (terminator at position 0) is how list queries report an
/// unknown or disconnected network.
pub struct OwnedStringList {
    ptr: NonNull<*mut c_char>,
    len: usize,
}

impl OwnedStringList {
    pub fn from_strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<OwnedString> = items
            .into_iter()
            .map(|s| OwnedString::new(s.as_ref()))
            .collect();
        let len = items.len();
        let ptr = malloc_or_abort::<*mut c_char>(len + 1);
        // SAFETY: ptr has room for len + 1 pointers.
        unsafe {
            for (i, item) in items.into_iter().enumerate() {
                ptr.as_ptr().add(i).write(item.into_raw());
            }
            ptr.as_ptr().add(len).write(std::ptr::null_mut());
        }
        Self { ptr, len }
    }

    pub fn empty() -> Self {
        Self::from_strings(std::iter::empty::<&str>())
    }

    /// Take ownership of a list handed over through the C ABI.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a `malloc`ed, null-terminated array of
    /// `malloc`ed NUL-terminated strings, none of which anybody else frees.
    pub unsafe fn from_raw(ptr: *mut *mut c_char) -> Option<Self> {
        let ptr = NonNull::new(ptr)?;
        let mut len = 0;
        // SAFETY: the array is null-terminated per the caller's contract.
        while !unsafe { *ptr.as_ptr().add(len) }.is_null() {
            len += 1;
        }
        Some(Self { ptr, len })
    }

    /// Give up ownership; the receiver must free every entry and the array.
    pub fn into_raw(self) -> *mut *mut c_char {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &CStr> + '_ {
        // SAFETY: entries 0..len are valid owned strings.
        (0..self.len).map(move |i| unsafe { CStr::from_ptr(*self.ptr.as_ptr().add(i)) })
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter()
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }
}

impl Drop for OwnedStringList {
    fn drop(&mut self) {
        // SAFETY: every entry and the array were allocated with malloc and
        // are exclusively owned.
        unsafe {
            for i in 0..self.len {
                libc::free((*self.ptr.as_ptr().add(i)).cast());
            }
            libc::free(self.ptr.as_ptr().cast());
        }
    }
}

impl fmt::Debug for OwnedStringList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_string_round_trip() {
        let s = OwnedString::new("alice");
        assert_eq!(s.as_c_str().to_bytes(), b"alice");

        let raw = s.into_raw();
        let back = unsafe { OwnedString::from_raw(raw) }.unwrap();
        assert_eq!(back.to_string_lossy(), "alice");
    }

    #[test]
    fn test_owned_string_truncates_at_nul() {
        let s = OwnedString::new("ab\0cd");
        assert_eq!(s.to_string_lossy(), "ab");
    }

    #[test]
    fn test_null_sentinel_is_none() {
        assert!(unsafe { OwnedString::from_raw(std::ptr::null_mut()) }.is_none());
        assert!(unsafe { OwnedStringList::from_raw(std::ptr::null_mut()) }.is_none());
    }

    #[test]
    fn test_list_is_null_terminated() {
        let list = OwnedStringList::from_strings(["alice", "Bob", "carol"]);
        let raw = list.into_raw();
        unsafe {
            assert!(!(*raw.add(2)).is_null());
            assert!((*raw.add(3)).is_null());
        }
        let list = unsafe { OwnedStringList::from_raw(raw) }.unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.to_vec(), vec!["alice", "Bob", "carol"]);
    }

    #[test]
    fn test_empty_list_terminator_at_zero() {
        let list = OwnedStringList::empty();
        assert!(list.is_empty());
        let raw = list.into_raw();
        assert!(unsafe { *raw }.is_null());
        drop(unsafe { OwnedStringList::from_raw(raw) });
    }

    #[test]
    fn test_list_contents_stable_until_released() {
        let list = OwnedStringList::from_strings(vec!["#a".to_string(), "#b".to_string()]);
        let first: Vec<String> = list.to_vec();
        let second: Vec<String> = list.to_vec();
        assert_eq!(first, second);
        assert_eq!(format!("{:?}", list), r##"["#a", "#b"]"##);
    }
}
