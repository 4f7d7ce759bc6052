//! Reference implementation of the never_jscore engine surface.
//!
//! This crate exports the `never_jscore_*` C entry points on top of the
//! [Boa](https://boajs.dev/) JavaScript engine. It builds as a `cdylib` for
//! foreign hosts and as an `rlib` so Rust hosts can link it directly and obtain
//! the function table through [`surface`].
//!
//! ```
//! use never_jscore_engine::surface;
//!
//! let surface = surface();
//! unsafe {
//!     (surface.init)();
//!     let ctx = (surface.new_context)(0, 0, -1);
//!     assert!(!ctx.is_null());
//!     (surface.free_context)(ctx);
//! }
//! ```

mod console;
mod context;
mod error;
pub mod ffi;
pub mod heap;
mod prelude;

pub use console::ConsoleLevel;
pub use context::{EngineContext, EngineOptions};
pub use error::{EngineError, EngineResult};
pub use heap::{CountingAllocator, HeapStats};

// Re-export never-jscore-sys so hosts can name the table type
pub use never_jscore_sys;

use never_jscore_sys::EngineSurface;

static SURFACE: EngineSurface = EngineSurface {
    init: ffi::never_jscore_init,
    new_context: ffi::never_jscore_new,
    free_context: ffi::never_jscore_free,
    exec: ffi::never_jscore_exec,
    compile: ffi::never_jscore_compile,
    eval: ffi::never_jscore_eval,
    free_string: ffi::never_jscore_free_string,
    gc: ffi::never_jscore_gc,
    get_stats: ffi::never_jscore_get_stats,
    reset_stats: ffi::never_jscore_reset_stats,
    get_heap_statistics: ffi::never_jscore_get_heap_statistics,
    take_heap_snapshot: ffi::never_jscore_take_heap_snapshot,
    last_error: Some(ffi::never_jscore_last_error),
};

/// Function table wired to this crate's exports
pub fn surface() -> &'static EngineSurface {
    &SURFACE
}
