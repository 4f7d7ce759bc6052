//! Engine-side execution context backed by Boa

use boa_engine::{Context, JsValue, Script, Source, js_string};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, trace};

use crate::console::register_console_api;
use crate::error::{EngineError, EngineResult};
use crate::heap::{self, HeapStats};
use crate::prelude::{EXTENSIONS_PRELUDE, seeded_random_prelude};

/// Creation flags for one context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub extensions: bool,
    pub logging: bool,
    pub random_seed: Option<u32>,
}

/// One isolated JavaScript execution environment.
///
/// Owns its Boa context plus the counters exposed through the C surface.
pub struct EngineContext {
    context: Context,
    options: EngineOptions,
    exec_count: usize,
    gc_requests: u64,
    last_error: Option<String>,
}

impl EngineContext {
    pub fn new(options: EngineOptions) -> EngineResult<Self> {
        let mut context = Context::builder()
            .build()
            .map_err(|e| EngineError::Creation(e.to_string()))?;

        register_console_api(&mut context, options.logging)
            .map_err(|e| EngineError::Creation(e.to_string()))?;

        if options.extensions {
            context
                .eval(Source::from_bytes(EXTENSIONS_PRELUDE))
                .map_err(|e| EngineError::Creation(e.to_string()))?;
        }

        if let Some(seed) = options.random_seed {
            context
                .eval(Source::from_bytes(&seeded_random_prelude(seed)))
                .map_err(|e| EngineError::Creation(e.to_string()))?;
        }

        heap::context_created();
        debug!(
            extensions = options.extensions,
            logging = options.logging,
            seed = ?options.random_seed,
            "engine context created"
        );

        Ok(Self {
            context,
            options,
            exec_count: 0,
            gc_requests: 0,
            last_error: None,
        })
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Run script text for its side effects only
    pub fn exec_script(&mut self, code: &str) -> EngineResult<()> {
        trace!(len = code.len(), "exec");
        let result = self
            .context
            .eval(Source::from_bytes(code))
            .map(drop)
            .map_err(EngineError::script);
        self.finish(result)
    }

    /// Parse script text, then evaluate it in the global scope so its
    /// declarations stay callable from later operations
    pub fn compile_script(&mut self, code: &str) -> EngineResult<()> {
        trace!(len = code.len(), "compile");
        let result = Script::parse(Source::from_bytes(code), None, &mut self.context)
            .map_err(|e| EngineError::Syntax(e.to_string()))
            .and_then(|script| {
                script
                    .evaluate(&mut self.context)
                    .map(drop)
                    .map_err(EngineError::script)
            });
        self.finish(result)
    }

    /// Run script text and return its completion value as JSON text
    pub fn execute_js(&mut self, code: &str) -> EngineResult<String> {
        trace!(len = code.len(), "eval");
        let result = self
            .context
            .eval(Source::from_bytes(code))
            .map_err(EngineError::script)
            .and_then(|value| self.to_json_text(&value));
        self.finish(result)
    }

    /// Serialize through the context's own `JSON.stringify`.
    ///
    /// Values without a JSON form (undefined, functions, symbols) encode as `null`.
    fn to_json_text(&mut self, value: &JsValue) -> EngineResult<String> {
        let serialization = |e: boa_engine::JsError| EngineError::Serialization(e.to_string());

        let json = self
            .context
            .global_object()
            .get(js_string!("JSON"), &mut self.context)
            .map_err(serialization)?;
        let stringify = json
            .as_object()
            .ok_or_else(|| EngineError::Serialization("JSON is not an object".into()))?
            .get(js_string!("stringify"), &mut self.context)
            .map_err(serialization)?;
        let stringify = stringify
            .as_object()
            .ok_or_else(|| EngineError::Serialization("JSON.stringify is not callable".into()))?
            .clone();

        let text = stringify
            .call(&JsValue::undefined(), std::slice::from_ref(value), &mut self.context)
            .map_err(serialization)?;

        match text.as_string() {
            Some(s) => Ok(s.to_std_string_escaped()),
            None => Ok("null".to_string()),
        }
    }

    fn finish<T>(&mut self, result: EngineResult<T>) -> EngineResult<T> {
        match &result {
            Ok(_) => {
                self.exec_count += 1;
                self.last_error = None;
            }
            Err(err) => {
                debug!(error = %err, "script operation failed");
                self.last_error = Some(err.to_string());
            }
        }
        result
    }

    /// Ask the collector for a full pass
    pub fn request_gc(&mut self) {
        self.gc_requests += 1;
        boa_gc::force_collect();
        trace!(requests = self.gc_requests, "gc");
    }

    pub fn get_exec_count(&self) -> usize {
        self.exec_count
    }

    pub fn reset_exec_count(&mut self) {
        self.exec_count = 0;
    }

    pub fn get_heap_stats(&self) -> BTreeMap<String, u64> {
        self.heap_stats().to_map()
    }

    fn heap_stats(&self) -> HeapStats {
        HeapStats::sample(self.gc_requests, self.exec_count as u64)
    }

    pub fn take_heap_snapshot(&mut self, path: &Path) -> EngineResult<()> {
        debug!(path = %path.display(), "writing heap snapshot");
        heap::write_heapsnapshot(path, &self.heap_stats())
    }

    /// Message of the most recent failed exec/compile/eval, if the last one failed
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

impl Drop for EngineContext {
    fn drop(&mut self) {
        heap::context_dropped();
        debug!("engine context destroyed");
    }
}
