//! A host binary that picks its own global allocator still links the bundled
//! engine, and heap figures become real once that allocator counts.

#![cfg(all(feature = "bundled", not(feature = "heap-accounting")))]

use never_jscore::Context;
use never_jscore::never_jscore_engine::CountingAllocator;

#[global_allocator]
static ALLOC: CountingAllocator = CountingAllocator;

#[test]
fn host_installed_allocator_feeds_heap_statistics() {
    let mut ctx = Context::new(true, false, -1).unwrap();
    ctx.exec("var rows = []; for (let i = 0; i < 1000; i++) rows.push({ i });").unwrap();

    let stats = ctx.get_heap_statistics().unwrap();
    assert!(stats.used_heap_size().unwrap() > 0);
    assert!(stats.total_heap_size().unwrap() >= stats.used_heap_size().unwrap());
    assert!(stats.get("total_allocated_bytes").unwrap() > 0);
}
