//! Walk through every context operation on the bundled engine.
//!
//! Run with `RUST_LOG=never_jscore=info` to see script console output.

use never_jscore::{Context, JsCoreResult};
use tracing_subscriber::filter::EnvFilter;

fn main() -> JsCoreResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("never_jscore::console=info".parse().unwrap()))
        .init();

    never_jscore::init();

    println!("Creating context...");
    let mut ctx = Context::new(true, true, -1)?;

    println!("Executing JS (exec)...");
    ctx.exec("function add(a, b) { return a + b; }")?;

    println!("Compiling JS (compile)...");
    ctx.compile("function multiply(a, b) { return a * b; }")?;

    println!("Add result: {}", ctx.eval("add(1, 2)")?);
    println!("call(add, 5, 7) result: {}", ctx.call("add", [5, 7])?);
    println!("Exec count: {}", ctx.get_execution_stats());

    println!("Requesting GC...");
    ctx.request_gc();

    let stats = ctx.get_heap_statistics()?;
    println!("Heap used: {} bytes", stats.used_heap_size().unwrap_or(0));

    ctx.reset_execution_stats();
    println!("Exec count after reset: {}", ctx.get_execution_stats());

    println!("Multiply result: {}", ctx.eval("multiply(3, 4)")?);

    ctx.exec("console.log('Hello from JS in Rust!');")?;

    ctx.close();
    match ctx.eval("1") {
        Err(err) => println!("After close: {}", err),
        Ok(value) => println!("Unexpected result after close: {}", value),
    }

    Ok(())
}
