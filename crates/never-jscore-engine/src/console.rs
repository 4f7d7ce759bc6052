//! Console API implementation
//!
//! Provides `console.log`, `console.info`, `console.debug`, `console.warn` and
//! `console.error`. With logging enabled output is routed to the tracing crate,
//! otherwise the calls are accepted and dropped.

use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{Context, JsResult, JsString, JsValue, NativeFunction, js_string};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Log,
    Info,
    Debug,
    Warn,
    Error,
}

fn format_console_args(args: &[JsValue]) -> String {
    args.iter()
        .map(|arg| match arg.as_string() {
            Some(s) => s.to_std_string_escaped(),
            None => arg.display().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn dispatch_console(level: ConsoleLevel, args: &[JsValue]) -> JsResult<JsValue> {
    let message = format_console_args(args);
    match level {
        ConsoleLevel::Log | ConsoleLevel::Info => info!(target: "never_jscore::console", "{}", message),
        ConsoleLevel::Debug => debug!(target: "never_jscore::console", "{}", message),
        ConsoleLevel::Warn => warn!(target: "never_jscore::console", "{}", message),
        ConsoleLevel::Error => error!(target: "never_jscore::console", "{}", message),
    }
    Ok(JsValue::undefined())
}

fn js_console_log(_: &JsValue, args: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    dispatch_console(ConsoleLevel::Log, args)
}

fn js_console_info(_: &JsValue, args: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    dispatch_console(ConsoleLevel::Info, args)
}

fn js_console_debug(_: &JsValue, args: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    dispatch_console(ConsoleLevel::Debug, args)
}

fn js_console_warn(_: &JsValue, args: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    dispatch_console(ConsoleLevel::Warn, args)
}

fn js_console_error(_: &JsValue, args: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    dispatch_console(ConsoleLevel::Error, args)
}

fn js_console_silent(_: &JsValue, _: &[JsValue], _: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::undefined())
}

/// Register the console object on the global object
pub fn register_console_api(context: &mut Context, logging: bool) -> JsResult<()> {
    let methods: [(&str, fn(&JsValue, &[JsValue], &mut Context) -> JsResult<JsValue>); 5] = if logging {
        [
            ("log", js_console_log),
            ("info", js_console_info),
            ("debug", js_console_debug),
            ("warn", js_console_warn),
            ("error", js_console_error),
        ]
    } else {
        [
            ("log", js_console_silent),
            ("info", js_console_silent),
            ("debug", js_console_silent),
            ("warn", js_console_silent),
            ("error", js_console_silent),
        ]
    };

    let mut console = ObjectInitializer::new(context);
    for (name, method) in methods {
        console.function(NativeFunction::from_fn_ptr(method), JsString::from(name), 0);
    }
    let console = console.build();

    context.register_global_property(js_string!("console"), console, Attribute::all())
}
