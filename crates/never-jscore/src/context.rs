//! Context handle wrapper with safe execution, invocation and diagnostics

use never_jscore_sys::{ContextPtr, status_ok};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::ptr;
use tracing::{debug, trace, warn};

use crate::buffer::{NativeString, to_c_text};
use crate::call::build_call_expression;
use crate::engine::Engine;
use crate::error::{JsCoreError, JsCoreResult};
use crate::heap::HeapStatistics;
use crate::options::ContextOptions;

/// A JavaScript execution context
///
/// Owns exactly one engine handle. The handle is released once, either by
/// [`Context::close`] or when the wrapper is dropped; afterwards every
/// operation fails with [`JsCoreError::ContextClosed`], except the diagnostic
/// ones ([`request_gc`](Self::request_gc),
/// [`get_execution_stats`](Self::get_execution_stats),
/// [`reset_execution_stats`](Self::reset_execution_stats)) which do nothing.
///
/// # Thread Safety
///
/// This type is `!Send` and `!Sync`. The engine mutates the context in place
/// on every call and provides no locking; use one context per thread.
pub struct Context {
    engine: &'static Engine,
    /// Null once closed
    raw: ContextPtr,
    /// Marker to make this type !Send + !Sync
    _not_send: PhantomData<*mut ()>,
}

impl Context {
    /// Create a context on the default engine.
    ///
    /// Any negative `random_seed` keeps the engine's own seeding.
    #[cfg(any(feature = "bundled", feature = "linked"))]
    pub fn new(enable_extensions: bool, enable_logging: bool, random_seed: i64) -> JsCoreResult<Self> {
        Self::with_options(ContextOptions::from_raw(enable_extensions, enable_logging, random_seed))
    }

    /// Create a context on the default engine
    #[cfg(any(feature = "bundled", feature = "linked"))]
    pub fn with_options(options: ContextOptions) -> JsCoreResult<Self> {
        Self::with_engine(Engine::global(), options)
    }

    /// Create a context on a specific engine, initializing it first if needed
    pub fn with_engine(engine: &'static Engine, options: ContextOptions) -> JsCoreResult<Self> {
        engine.init();

        // SAFETY: the engine has been initialized; arguments are plain values
        let raw = unsafe {
            (engine.surface().new_context)(
                options.extensions_arg(),
                options.logging_arg(),
                options.seed_arg(),
            )
        };
        if raw.is_null() {
            warn!(?options, "engine returned a null context handle");
            return Err(JsCoreError::CreationFailed);
        }

        debug!(?options, "context created");
        Ok(Self {
            engine,
            raw,
            _not_send: PhantomData,
        })
    }

    /// The engine this context belongs to
    pub fn engine(&self) -> &'static Engine {
        self.engine
    }

    /// Get the raw handle, or null once closed
    pub fn raw(&self) -> ContextPtr {
        self.raw
    }

    pub fn is_closed(&self) -> bool {
        self.raw.is_null()
    }

    fn handle(&self) -> JsCoreResult<ContextPtr> {
        if self.raw.is_null() {
            return Err(JsCoreError::ContextClosed);
        }
        Ok(self.raw)
    }

    /// Take ownership of a buffer returned by this context's engine
    fn take_buffer(&self, raw: *mut std::ffi::c_char) -> Option<NativeString> {
        // SAFETY: raw was just returned by this engine and is owned by nobody else
        unsafe { NativeString::from_raw(raw, self.engine.surface().free_string) }
    }

    /// Ask the engine why the last exec/compile/eval failed, when it can say
    fn last_error(&self, raw: ContextPtr) -> Option<String> {
        let last_error = self.engine.surface().last_error?;
        // SAFETY: raw is a live handle of this engine
        let buffer = self.take_buffer(unsafe { last_error(raw) })?;
        Some(buffer.to_string_lossy())
    }

    /// Execute code for side effects only; any produced value is discarded
    pub fn exec(&mut self, code: &str) -> JsCoreResult<()> {
        let raw = self.handle()?;
        let code = to_c_text("code", code)?;

        trace!(len = code.as_bytes().len(), "exec");
        // SAFETY: raw is live, code is null-terminated and outlives the call
        let status = unsafe { (self.engine.surface().exec)(raw, code.as_ptr()) };
        if !status_ok(status) {
            let detail = self.last_error(raw);
            debug!(status, ?detail, "exec failed");
            return Err(JsCoreError::execution(detail));
        }
        Ok(())
    }

    /// Load code into the context's global scope.
    ///
    /// Functions and bindings it defines stay callable from later operations.
    pub fn compile(&mut self, code: &str) -> JsCoreResult<()> {
        let raw = self.handle()?;
        let code = to_c_text("code", code)?;

        trace!(len = code.as_bytes().len(), "compile");
        // SAFETY: raw is live, code is null-terminated and outlives the call
        let status = unsafe { (self.engine.surface().compile)(raw, code.as_ptr()) };
        if !status_ok(status) {
            let detail = self.last_error(raw);
            debug!(status, ?detail, "compile failed");
            return Err(JsCoreError::compilation(detail));
        }
        Ok(())
    }

    /// Evaluate code and return its result as JSON text.
    ///
    /// A script error and a result that cannot be serialized both surface as
    /// [`JsCoreError::ExecutionFailed`].
    pub fn eval(&mut self, code: &str) -> JsCoreResult<String> {
        let raw = self.handle()?;
        let code = to_c_text("code", code)?;

        trace!(len = code.as_bytes().len(), "eval");
        // SAFETY: raw is live, code is null-terminated and outlives the call
        let result = unsafe { (self.engine.surface().eval)(raw, code.as_ptr()) };
        match self.take_buffer(result) {
            Some(buffer) => Ok(buffer.to_string_lossy()),
            None => {
                let detail = self.last_error(raw);
                debug!(?detail, "eval failed");
                Err(JsCoreError::execution(detail))
            }
        }
    }

    /// Evaluate code and decode its JSON result
    pub fn eval_as<T: DeserializeOwned>(&mut self, code: &str) -> JsCoreResult<T> {
        let json = self.eval(code)?;
        serde_json::from_str(&json)
            .map_err(|e| JsCoreError::execution(Some(format!("result decoding failed: {}", e))))
    }

    /// Call a function by name with JSON-encoded arguments.
    ///
    /// Builds `name(arg0, arg1, ...)` and evaluates it, so failures are those
    /// of [`eval`](Self::eval) plus [`JsCoreError::ArgumentEncodingFailed`].
    ///
    /// ```
    /// # use never_jscore::Context;
    /// # use serde_json::json;
    /// let mut ctx = Context::new(true, false, -1)?;
    /// ctx.exec("function add(a, b) { return a + b; }")?;
    /// assert_eq!(ctx.call("add", [5, 7])?, "12");
    /// assert_eq!(ctx.call("JSON.stringify", [json!({ "k": [1, "x"] })])?, r#""{\"k\":[1,\"x\"]}""#);
    /// # Ok::<(), never_jscore::JsCoreError>(())
    /// ```
    pub fn call<I>(&mut self, name: &str, args: I) -> JsCoreResult<String>
    where
        I: IntoIterator,
        I::Item: Serialize,
    {
        self.handle()?;
        let expression = build_call_expression(name, args)?;
        self.eval(&expression)
    }

    /// Call a function by name and decode its JSON result
    pub fn call_as<T, I>(&mut self, name: &str, args: I) -> JsCoreResult<T>
    where
        T: DeserializeOwned,
        I: IntoIterator,
        I::Item: Serialize,
    {
        self.handle()?;
        let expression = build_call_expression(name, args)?;
        self.eval_as(&expression)
    }

    /// Request a garbage collection pass. Ignored on a closed context.
    pub fn request_gc(&mut self) {
        if let Ok(raw) = self.handle() {
            trace!("gc");
            // SAFETY: raw is live
            unsafe { (self.engine.surface().gc)(raw) };
        }
    }

    /// Successful exec/compile/eval count since creation or last reset.
    ///
    /// Returns 0 on a closed context.
    pub fn get_execution_stats(&self) -> u64 {
        match self.handle() {
            // SAFETY: raw is live
            Ok(raw) => unsafe { (self.engine.surface().get_stats)(raw) as u64 },
            Err(_) => 0,
        }
    }

    /// Zero the execution counter. Ignored on a closed context.
    pub fn reset_execution_stats(&mut self) {
        if let Ok(raw) = self.handle() {
            // SAFETY: raw is live
            unsafe { (self.engine.surface().reset_stats)(raw) };
        }
    }

    /// Sample the engine's heap statistics
    pub fn get_heap_statistics(&self) -> JsCoreResult<HeapStatistics> {
        let raw = self.handle()?;
        // SAFETY: raw is live
        let result = unsafe { (self.engine.surface().get_heap_statistics)(raw) };
        let buffer = self.take_buffer(result).ok_or(JsCoreError::HeapStatsUnavailable)?;

        // Released before the parse result, good or bad, reaches the caller
        let stats = HeapStatistics::parse(&buffer.to_string_lossy());
        drop(buffer);
        stats
    }

    /// Ask the engine to write a heap snapshot to `path`
    pub fn take_heap_snapshot(&mut self, path: impl AsRef<Path>) -> JsCoreResult<()> {
        let raw = self.handle()?;
        let path = path.as_ref();
        let c_path = to_c_text("snapshot path", path.as_os_str().as_encoded_bytes())?;

        debug!(path = %path.display(), "taking heap snapshot");
        // SAFETY: raw is live, c_path is null-terminated and outlives the call
        let status = unsafe { (self.engine.surface().take_heap_snapshot)(raw, c_path.as_ptr()) };
        if !status_ok(status) {
            return Err(JsCoreError::SnapshotFailed {
                path: PathBuf::from(path),
            });
        }
        Ok(())
    }

    /// Release the engine handle. Calling it again does nothing.
    pub fn close(&mut self) {
        let raw = std::mem::replace(&mut self.raw, ptr::null_mut());
        if raw.is_null() {
            return;
        }
        // SAFETY: raw was created by this engine and is released only here
        unsafe { (self.engine.surface().free_context)(raw) };
        debug!("context closed");
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("raw", &self.raw)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(all(test, feature = "bundled"))]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> Context {
        Context::new(true, false, -1).unwrap()
    }

    #[test]
    fn test_context_creation() {
        let ctx = context();
        assert!(!ctx.is_closed());
        assert!(ctx.engine().is_initialized());
        drop(ctx);
    }

    #[test]
    fn test_eval_number() {
        let mut ctx = context();
        assert_eq!(ctx.eval("1 + 1").unwrap(), "2");
    }

    #[test]
    fn test_eval_string() {
        let mut ctx = context();
        assert_eq!(ctx.eval("'hello'").unwrap(), r#""hello""#);
        assert_eq!(ctx.eval_as::<String>("'hel' + 'lo'").unwrap(), "hello");
    }

    #[test]
    fn test_eval_error() {
        let mut ctx = context();
        let err = ctx.eval("throw new Error('oops')").unwrap_err();
        assert!(err.is_script_error());
        assert!(err.detail().unwrap().contains("oops"));
    }

    #[test]
    fn test_exec_error() {
        let mut ctx = context();
        let err = ctx.exec("undefinedFunction()").unwrap_err();
        assert!(matches!(err, JsCoreError::ExecutionFailed { .. }));
    }

    #[test]
    fn test_compile_error() {
        let mut ctx = context();
        let err = ctx.compile("function (").unwrap_err();
        assert!(matches!(err, JsCoreError::CompilationFailed { .. }));
    }

    #[test]
    fn test_interior_nul_is_rejected_before_the_engine() {
        let mut ctx = context();
        let err = ctx.eval("1\0").unwrap_err();
        assert!(matches!(err, JsCoreError::InteriorNul { what: "code" }));
        assert_eq!(ctx.get_execution_stats(), 0);
    }

    #[test]
    fn test_call_structured_args() {
        let mut ctx = context();
        ctx.exec("function keys(o) { return Object.keys(o).sort(); }").unwrap();
        let keys: Vec<String> = ctx.call_as("keys", [json!({ "b": 1, "a": 2 })]).unwrap();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut ctx = context();
        ctx.close();
        ctx.close();
        assert!(ctx.is_closed());
        assert!(ctx.raw().is_null());
    }

    #[test]
    fn test_heap_statistics() {
        let ctx = context();
        let stats = ctx.get_heap_statistics().unwrap();
        assert!(stats.used_heap_size().is_some());
    }
}
