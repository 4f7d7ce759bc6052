//! C ABI exports of the engine surface.
//!
//! Every export tolerates null handles and null text pointers, and no panic
//! is allowed to unwind across the boundary.

// Allow unsafe operations in unsafe functions (Rust 2024 compatibility)
#![allow(unsafe_op_in_unsafe_fn)]

use never_jscore_sys::{ContextPtr, STATUS_ERROR, STATUS_OK};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::ptr;
use std::sync::Once;
use tracing::{debug, error};

use crate::context::{EngineContext, EngineOptions};

static INIT: Once = Once::new();

/// Run `f`, turning a panic into `fallback`
fn guarded<R>(operation: &str, fallback: R, f: impl FnOnce() -> R) -> R {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error!(operation, "panic caught at the engine boundary");
            fallback
        }
    }
}

/// Borrow the context behind a handle.
///
/// # Safety
/// `ptr` must be null or a live handle from `never_jscore_new`.
unsafe fn context_mut<'a>(ptr: ContextPtr) -> Option<&'a mut EngineContext> {
    (ptr as *mut EngineContext).as_mut()
}

/// # Safety
/// `text` must be null or a valid null-terminated string.
unsafe fn text_arg<'a>(text: *const c_char) -> Option<&'a str> {
    if text.is_null() {
        return None;
    }
    CStr::from_ptr(text).to_str().ok()
}

/// Hand a string to the caller; released by `never_jscore_free_string`
fn into_buffer(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_string) => c_string.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn status<T, E>(result: Result<T, E>) -> c_int {
    match result {
        Ok(_) => STATUS_OK,
        Err(_) => STATUS_ERROR,
    }
}

/// Prepare process-wide engine state. Safe to call any number of times.
#[unsafe(no_mangle)]
pub extern "C" fn never_jscore_init() {
    INIT.call_once(|| {
        debug!(contexts = crate::heap::live_contexts(), "never_jscore engine initialized");
    });
}

/// Create a context. Returns null on failure.
///
/// A negative `random_seed` keeps the engine's own seeding.
#[unsafe(no_mangle)]
pub extern "C" fn never_jscore_new(
    enable_extensions: c_int,
    enable_logging: c_int,
    random_seed: i64,
) -> ContextPtr {
    let options = EngineOptions {
        extensions: enable_extensions != 0,
        logging: enable_logging != 0,
        random_seed: if random_seed < 0 { None } else { Some(random_seed as u32) },
    };

    guarded("new", ptr::null_mut(), || match EngineContext::new(options) {
        Ok(ctx) => Box::into_raw(Box::new(ctx)) as ContextPtr,
        Err(err) => {
            error!(error = %err, "context creation failed");
            ptr::null_mut()
        }
    })
}

/// Destroy a context.
///
/// # Safety
/// - `ptr` must be null or a handle from `never_jscore_new`
/// - The handle must not be used after this call
#[unsafe(no_mangle)]
pub unsafe extern "C" fn never_jscore_free(ptr: ContextPtr) {
    if ptr.is_null() {
        return;
    }
    let ctx = Box::from_raw(ptr as *mut EngineContext);
    guarded("free", (), move || drop(ctx));
}

/// Evaluate code and return its completion value as owned JSON text, or null.
///
/// # Safety
/// - `ptr` must be null or a live handle
/// - `code` must be null or a valid null-terminated string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn never_jscore_eval(ptr: ContextPtr, code: *const c_char) -> *mut c_char {
    let (Some(ctx), Some(code)) = (context_mut(ptr), text_arg(code)) else {
        return ptr::null_mut();
    };
    guarded("eval", ptr::null_mut(), || match ctx.execute_js(code) {
        Ok(json) => into_buffer(json),
        Err(_) => ptr::null_mut(),
    })
}

/// Release a buffer returned by this engine.
///
/// # Safety
/// - `s` must be null or a buffer returned by `never_jscore_eval`,
///   `never_jscore_get_heap_statistics` or `never_jscore_last_error`
/// - Each buffer must be released at most once
#[unsafe(no_mangle)]
pub unsafe extern "C" fn never_jscore_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Execute code for side effects only. Returns 0 on success.
///
/// # Safety
/// - `ptr` must be null or a live handle
/// - `code` must be null or a valid null-terminated string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn never_jscore_exec(ptr: ContextPtr, code: *const c_char) -> c_int {
    let (Some(ctx), Some(code)) = (context_mut(ptr), text_arg(code)) else {
        return STATUS_ERROR;
    };
    guarded("exec", STATUS_ERROR, || status(ctx.exec_script(code)))
}

/// Load code into the global scope. Returns 0 on success.
///
/// # Safety
/// - `ptr` must be null or a live handle
/// - `code` must be null or a valid null-terminated string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn never_jscore_compile(ptr: ContextPtr, code: *const c_char) -> c_int {
    let (Some(ctx), Some(code)) = (context_mut(ptr), text_arg(code)) else {
        return STATUS_ERROR;
    };
    guarded("compile", STATUS_ERROR, || status(ctx.compile_script(code)))
}

/// Request a garbage collection pass.
///
/// # Safety
/// `ptr` must be null or a live handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn never_jscore_gc(ptr: ContextPtr) {
    if let Some(ctx) = context_mut(ptr) {
        guarded("gc", (), || ctx.request_gc());
    }
}

/// Successful exec/compile/eval count since creation or last reset.
///
/// # Safety
/// `ptr` must be null or a live handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn never_jscore_get_stats(ptr: ContextPtr) -> usize {
    match context_mut(ptr) {
        Some(ctx) => ctx.get_exec_count(),
        None => 0,
    }
}

/// # Safety
/// `ptr` must be null or a live handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn never_jscore_reset_stats(ptr: ContextPtr) {
    if let Some(ctx) = context_mut(ptr) {
        ctx.reset_exec_count();
    }
}

/// Heap statistics as an owned JSON object of name -> count, or null.
///
/// # Safety
/// `ptr` must be null or a live handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn never_jscore_get_heap_statistics(ptr: ContextPtr) -> *mut c_char {
    let Some(ctx) = context_mut(ptr) else {
        return ptr::null_mut();
    };
    guarded("get_heap_statistics", ptr::null_mut(), || {
        match serde_json::to_string(&ctx.get_heap_stats()) {
            Ok(json) => into_buffer(json),
            Err(_) => ptr::null_mut(),
        }
    })
}

/// Write a heap snapshot to `file_path`. Returns 0 on success.
///
/// # Safety
/// - `ptr` must be null or a live handle
/// - `file_path` must be null or a valid null-terminated string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn never_jscore_take_heap_snapshot(
    ptr: ContextPtr,
    file_path: *const c_char,
) -> c_int {
    let (Some(ctx), Some(path)) = (context_mut(ptr), text_arg(file_path)) else {
        return STATUS_ERROR;
    };
    guarded("take_heap_snapshot", STATUS_ERROR, || {
        status(ctx.take_heap_snapshot(Path::new(path)))
    })
}

/// Message of the most recent failed exec/compile/eval as an owned buffer,
/// or null when the last operation succeeded.
///
/// # Safety
/// `ptr` must be null or a live handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn never_jscore_last_error(ptr: ContextPtr) -> *mut c_char {
    match context_mut(ptr).and_then(|ctx| ctx.last_error()) {
        Some(message) => into_buffer(message.to_string()),
        None => ptr::null_mut(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cstr(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    unsafe fn take(buffer: *mut c_char) -> String {
        assert!(!buffer.is_null());
        let text = CStr::from_ptr(buffer).to_string_lossy().into_owned();
        never_jscore_free_string(buffer);
        text
    }

    #[test]
    fn test_lifecycle() {
        never_jscore_init();
        never_jscore_init();

        let ctx = never_jscore_new(1, 0, -1);
        assert!(!ctx.is_null());
        unsafe {
            let code = cstr("function add(a, b) { return a + b; }");
            assert_eq!(never_jscore_exec(ctx, code.as_ptr()), STATUS_OK);

            let call = cstr("add(1, 2)");
            assert_eq!(take(never_jscore_eval(ctx, call.as_ptr())), "3");
            assert_eq!(never_jscore_get_stats(ctx), 2);

            never_jscore_reset_stats(ctx);
            assert_eq!(never_jscore_get_stats(ctx), 0);

            never_jscore_gc(ctx);
            never_jscore_free(ctx);
        }
    }

    #[test]
    fn test_seed_is_truncated_not_dropped() {
        let wide = never_jscore_new(0, 0, (1_i64 << 32) + 3);
        let unseeded = never_jscore_new(0, 0, -5);
        unsafe {
            assert_eq!(context_mut(wide).unwrap().options().random_seed, Some(3));
            assert_eq!(context_mut(unseeded).unwrap().options().random_seed, None);
            never_jscore_free(wide);
            never_jscore_free(unseeded);
        }
    }

    #[test]
    fn test_null_handle_is_rejected() {
        let code = cstr("1");
        unsafe {
            assert_eq!(never_jscore_exec(ptr::null_mut(), code.as_ptr()), STATUS_ERROR);
            assert_eq!(never_jscore_compile(ptr::null_mut(), code.as_ptr()), STATUS_ERROR);
            assert!(never_jscore_eval(ptr::null_mut(), code.as_ptr()).is_null());
            assert!(never_jscore_get_heap_statistics(ptr::null_mut()).is_null());
            assert_eq!(never_jscore_get_stats(ptr::null_mut()), 0);
            never_jscore_gc(ptr::null_mut());
            never_jscore_reset_stats(ptr::null_mut());
            never_jscore_free(ptr::null_mut());
            never_jscore_free_string(ptr::null_mut());
        }
    }

    #[test]
    fn test_null_code_is_rejected() {
        let ctx = never_jscore_new(0, 0, -1);
        unsafe {
            assert_eq!(never_jscore_exec(ctx, ptr::null()), STATUS_ERROR);
            assert!(never_jscore_eval(ctx, ptr::null()).is_null());
            assert_eq!(never_jscore_take_heap_snapshot(ctx, ptr::null()), STATUS_ERROR);
            never_jscore_free(ctx);
        }
    }

    #[test]
    fn test_eval_failure_reports_last_error() {
        let ctx = never_jscore_new(0, 0, -1);
        unsafe {
            let code = cstr("throw new TypeError('bad input')");
            assert!(never_jscore_eval(ctx, code.as_ptr()).is_null());
            assert!(take(never_jscore_last_error(ctx)).contains("bad input"));

            let ok = cstr("1 + 1");
            assert_eq!(take(never_jscore_eval(ctx, ok.as_ptr())), "2");
            assert!(never_jscore_last_error(ctx).is_null());
            never_jscore_free(ctx);
        }
    }

    #[test]
    fn test_heap_statistics_json() {
        let ctx = never_jscore_new(0, 0, -1);
        unsafe {
            let text = take(never_jscore_get_heap_statistics(ctx));
            let stats: std::collections::HashMap<String, u64> = serde_json::from_str(&text).unwrap();
            assert!(stats.contains_key("used_heap_size"));
            never_jscore_free(ctx);
        }
    }

    #[test]
    fn test_heap_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = cstr(dir.path().join("out.heapsnapshot").to_str().unwrap());
        let bad = cstr(dir.path().join("nope").join("out.heapsnapshot").to_str().unwrap());

        let ctx = never_jscore_new(0, 0, -1);
        unsafe {
            assert_eq!(never_jscore_take_heap_snapshot(ctx, path.as_ptr()), STATUS_OK);
            assert_eq!(never_jscore_take_heap_snapshot(ctx, bad.as_ptr()), STATUS_ERROR);
            never_jscore_free(ctx);
        }
        assert!(dir.path().join("out.heapsnapshot").exists());
    }
}
