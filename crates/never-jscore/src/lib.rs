//! Safe wrappers for the never_jscore engine surface.
//!
//! This crate provides memory-safe, RAII-based wrappers around the raw
//! C entry points described in `never-jscore-sys`: one [`Context`] owns one
//! engine handle, and every string the engine hands back is released through
//! the engine's own `free_string` exactly once.
//!
//! # Example
//!
//! ```
//! use never_jscore::Context;
//!
//! never_jscore::init();
//!
//! let mut ctx = Context::new(true, false, -1).unwrap();
//! ctx.exec("function add(a, b) { return a + b; }").unwrap();
//! assert_eq!(ctx.eval("add(1, 2)").unwrap(), "3");
//! assert_eq!(ctx.call("add", [5, 7]).unwrap(), "12");
//! ```
//!
//! # Thread Safety
//!
//! [`Context`] and [`NativeString`] are `!Send` and `!Sync` because the
//! engine mutates a context in place on every call without locking.
//! Create one context per thread, or serialize access externally.
//!
//! ## Example: Wrong (won't compile)
//!
//! ```compile_fail
//! use never_jscore::Context;
//! use std::thread;
//!
//! let mut ctx = Context::new(true, false, -1).unwrap();
//! thread::spawn(move || {
//!     ctx.eval("1 + 1"); // Error: Context is !Send
//! });
//! ```
//!
//! ```compile_fail
//! use never_jscore::Context;
//! use std::sync::Arc;
//!
//! let ctx = Arc::new(Context::new(true, false, -1).unwrap());
//! let ctx2 = ctx.clone();
//! std::thread::spawn(move || {
//!     let _ = ctx2.get_execution_stats(); // Error: Context is !Sync
//! });
//! ```
//!
//! ## Example: Correct
//!
//! ```
//! use never_jscore::Context;
//! use std::thread;
//!
//! let handle = thread::spawn(|| {
//!     let mut ctx = Context::new(true, false, -1).unwrap();
//!     ctx.eval("6 * 7").unwrap()
//! });
//! assert_eq!(handle.join().unwrap(), "42");
//! ```

mod buffer;
pub mod call;
mod context;
mod engine;
mod error;
mod heap;
mod options;

pub use buffer::NativeString;
pub use call::{ARG_SEPARATOR, build_call_expression};
pub use context::Context;
pub use engine::Engine;
pub use error::{JsCoreError, JsCoreResult};
pub use heap::HeapStatistics;
pub use options::ContextOptions;

// Re-export the sys crate for direct FFI access when needed
pub use never_jscore_sys;

#[cfg(feature = "bundled")]
pub use never_jscore_engine;

/// Initialize the default engine.
///
/// Must run before the first context is created; [`Context::new`] calls it
/// for you. Repeated calls are no-ops.
#[cfg(any(feature = "bundled", feature = "linked"))]
pub fn init() {
    Engine::global().init();
}
