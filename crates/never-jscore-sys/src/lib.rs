//! Raw C ABI surface of the never_jscore engine
//!
//! This crate provides the low-level types shared by every implementation of
//! the engine surface: the opaque context handle, the entry-point signatures
//! and the [`EngineSurface`] function table that groups them.
//! Use the safe wrappers in `never-jscore` for higher-level access.

#![allow(non_camel_case_types)]

use std::ffi::c_void;
use std::os::raw::{c_char, c_int};

/// Opaque pointer to one isolated execution context inside the engine
pub type ContextPtr = *mut c_void;

/// Status returned by `exec`, `compile` and `take_heap_snapshot` on success
pub const STATUS_OK: c_int = 0;
/// Status returned by the reference engine on any failure
pub const STATUS_ERROR: c_int = -1;
/// `random_seed` sentinel requesting the engine's own seeding
pub const SEED_DEFAULT: i64 = -1;

// Entry-point signatures
pub type never_jscore_init_fn = unsafe extern "C" fn();
pub type never_jscore_new_fn =
    unsafe extern "C" fn(enable_extensions: c_int, enable_logging: c_int, random_seed: i64) -> ContextPtr;
pub type never_jscore_free_fn = unsafe extern "C" fn(ptr: ContextPtr);
pub type never_jscore_exec_fn = unsafe extern "C" fn(ptr: ContextPtr, code: *const c_char) -> c_int;
pub type never_jscore_compile_fn = unsafe extern "C" fn(ptr: ContextPtr, code: *const c_char) -> c_int;
pub type never_jscore_eval_fn = unsafe extern "C" fn(ptr: ContextPtr, code: *const c_char) -> *mut c_char;
pub type never_jscore_free_string_fn = unsafe extern "C" fn(s: *mut c_char);
pub type never_jscore_gc_fn = unsafe extern "C" fn(ptr: ContextPtr);
pub type never_jscore_get_stats_fn = unsafe extern "C" fn(ptr: ContextPtr) -> usize;
pub type never_jscore_reset_stats_fn = unsafe extern "C" fn(ptr: ContextPtr);
pub type never_jscore_get_heap_statistics_fn = unsafe extern "C" fn(ptr: ContextPtr) -> *mut c_char;
pub type never_jscore_take_heap_snapshot_fn =
    unsafe extern "C" fn(ptr: ContextPtr, file_path: *const c_char) -> c_int;
pub type never_jscore_last_error_fn = unsafe extern "C" fn(ptr: ContextPtr) -> *mut c_char;

/// Function table of one engine implementation.
///
/// Every buffer returned by `eval`, `get_heap_statistics` or `last_error` is
/// owned by the caller and must be handed back to `free_string` of the same
/// table exactly once.
///
/// `last_error` is optional: engines that cannot report why the last
/// exec/compile/eval failed leave it as `None`.
#[derive(Clone, Copy, Debug)]
pub struct EngineSurface {
    pub init: never_jscore_init_fn,
    pub new_context: never_jscore_new_fn,
    pub free_context: never_jscore_free_fn,
    pub exec: never_jscore_exec_fn,
    pub compile: never_jscore_compile_fn,
    pub eval: never_jscore_eval_fn,
    pub free_string: never_jscore_free_string_fn,
    pub gc: never_jscore_gc_fn,
    pub get_stats: never_jscore_get_stats_fn,
    pub reset_stats: never_jscore_reset_stats_fn,
    pub get_heap_statistics: never_jscore_get_heap_statistics_fn,
    pub take_heap_snapshot: never_jscore_take_heap_snapshot_fn,
    pub last_error: Option<never_jscore_last_error_fn>,
}

// FFI declarations for an externally built engine library
#[cfg(feature = "linked")]
#[link(name = "never_jscore")]
unsafe extern "C" {
    pub fn never_jscore_init();
    pub fn never_jscore_new(enable_extensions: c_int, enable_logging: c_int, random_seed: i64) -> ContextPtr;
    pub fn never_jscore_free(ptr: ContextPtr);
    pub fn never_jscore_eval(ptr: ContextPtr, code: *const c_char) -> *mut c_char;
    pub fn never_jscore_free_string(s: *mut c_char);
    pub fn never_jscore_exec(ptr: ContextPtr, code: *const c_char) -> c_int;
    pub fn never_jscore_compile(ptr: ContextPtr, code: *const c_char) -> c_int;
    pub fn never_jscore_gc(ptr: ContextPtr);
    pub fn never_jscore_get_stats(ptr: ContextPtr) -> usize;
    pub fn never_jscore_reset_stats(ptr: ContextPtr);
    pub fn never_jscore_get_heap_statistics(ptr: ContextPtr) -> *mut c_char;
    pub fn never_jscore_take_heap_snapshot(ptr: ContextPtr, file_path: *const c_char) -> c_int;
}

/// Surface of the externally linked library.
///
/// The external library is not assumed to export `never_jscore_last_error`.
#[cfg(feature = "linked")]
pub static LINKED_SURFACE: EngineSurface = EngineSurface {
    init: never_jscore_init,
    new_context: never_jscore_new,
    free_context: never_jscore_free,
    exec: never_jscore_exec,
    compile: never_jscore_compile,
    eval: never_jscore_eval,
    free_string: never_jscore_free_string,
    gc: never_jscore_gc,
    get_stats: never_jscore_get_stats,
    reset_stats: never_jscore_reset_stats,
    get_heap_statistics: never_jscore_get_heap_statistics,
    take_heap_snapshot: never_jscore_take_heap_snapshot,
    last_error: None,
};

/// Returns `true` when a status code reports success
#[inline]
pub fn status_ok(status: c_int) -> bool {
    status == STATUS_OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ok() {
        assert!(status_ok(STATUS_OK));
        assert!(!status_ok(STATUS_ERROR));
        assert!(!status_ok(1));
    }

    #[test]
    fn test_seed_sentinel_is_negative() {
        assert!(SEED_DEFAULT < 0);
    }
}
