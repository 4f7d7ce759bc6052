//! RAII wrapper for engine-allocated strings, plus inbound text conversion

use never_jscore_sys::never_jscore_free_string_fn;
use std::ffi::{CStr, CString, c_char};
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::str::Utf8Error;

use crate::error::{JsCoreError, JsCoreResult};

/// Owned buffer returned by the engine, released through the engine's own
/// `free_string` when dropped.
///
/// Wrapping happens immediately at the boundary, so the buffer is released
/// exactly once on every path, including early returns and failures.
///
/// # Thread Safety
///
/// This type is `!Send` and `!Sync`: the release function belongs to an
/// engine that is driven from a single thread.
pub struct NativeString {
    raw: NonNull<c_char>,
    release: never_jscore_free_string_fn,
    /// Marker to make this type !Send + !Sync
    _not_send: PhantomData<*mut ()>,
}

impl NativeString {
    /// Take ownership of an engine buffer. Returns `None` for null.
    ///
    /// # Safety
    /// - `raw` must be null or a null-terminated buffer returned by the engine
    ///   that `release` belongs to
    /// - Nothing else may read or release `raw` afterwards
    pub unsafe fn from_raw(raw: *mut c_char, release: never_jscore_free_string_fn) -> Option<Self> {
        NonNull::new(raw).map(|raw| Self {
            raw,
            release,
            _not_send: PhantomData,
        })
    }

    /// Borrow the contents as a C string
    pub fn as_c_str(&self) -> &CStr {
        // SAFETY: raw is non-null, null-terminated and alive until drop
        unsafe { CStr::from_ptr(self.raw.as_ptr()) }
    }

    /// Borrow the contents as UTF-8
    pub fn to_str(&self) -> Result<&str, Utf8Error> {
        self.as_c_str().to_str()
    }

    /// Copy the contents into a host-owned string
    pub fn to_string_lossy(&self) -> String {
        self.as_c_str().to_string_lossy().into_owned()
    }

    /// Length in bytes, without the terminator
    pub fn len(&self) -> usize {
        self.as_c_str().to_bytes().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for NativeString {
    fn drop(&mut self) {
        // SAFETY: raw came from the engine owning `release` and is released only here
        unsafe { (self.release)(self.raw.as_ptr()) };
    }
}

impl fmt::Display for NativeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_c_str().to_string_lossy())
    }
}

impl fmt::Debug for NativeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeString({:?})", self.as_c_str())
    }
}

/// Convert host text to the engine's null-terminated encoding
pub(crate) fn to_c_text(what: &'static str, text: impl Into<Vec<u8>>) -> JsCoreResult<CString> {
    CString::new(text).map_err(|_| JsCoreError::InteriorNul { what })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    thread_local! {
        static RELEASED: Cell<usize> = const { Cell::new(0) };
    }

    unsafe extern "C" fn counting_release(s: *mut c_char) {
        RELEASED.with(|count| count.set(count.get() + 1));
        // SAFETY: test buffers are created with CString::into_raw
        drop(unsafe { CString::from_raw(s) });
    }

    fn engine_buffer(text: &str) -> *mut c_char {
        CString::new(text).unwrap().into_raw()
    }

    #[test]
    fn test_release_on_drop() {
        let before = RELEASED.with(Cell::get);
        let buffer = unsafe { NativeString::from_raw(engine_buffer("{\"a\":1}"), counting_release) }.unwrap();
        assert_eq!(buffer.to_str().unwrap(), "{\"a\":1}");
        assert_eq!(buffer.len(), 7);
        drop(buffer);
        assert_eq!(RELEASED.with(Cell::get), before + 1);
    }

    #[test]
    fn test_null_is_not_wrapped() {
        let before = RELEASED.with(Cell::get);
        let buffer = unsafe { NativeString::from_raw(std::ptr::null_mut(), counting_release) };
        assert!(buffer.is_none());
        assert_eq!(RELEASED.with(Cell::get), before);
    }

    #[test]
    fn test_display_copies_contents() {
        let buffer = unsafe { NativeString::from_raw(engine_buffer("hello"), counting_release) }.unwrap();
        let copied = buffer.to_string();
        drop(buffer);
        assert_eq!(copied, "hello");
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = unsafe { NativeString::from_raw(engine_buffer(""), counting_release) }.unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_to_c_text_rejects_nul() {
        assert!(to_c_text("code", "1 + 1").is_ok());
        let err = to_c_text("code", "1\0 + 1").unwrap_err();
        assert!(matches!(err, JsCoreError::InteriorNul { what: "code" }));
    }
}
