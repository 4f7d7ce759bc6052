//! Heap accounting, statistics and snapshots.
//!
//! Boa does not expose its GC heap size, so byte figures are taken from
//! [`CountingAllocator`]. They describe the whole process, not a single
//! context, and stay 0 unless that allocator is the global one: either the
//! `heap-accounting` feature installs it (cdylib builds), or the host binary
//! does:
//!
//! ```ignore
//! #[global_allocator]
//! static ALLOC: never_jscore_engine::CountingAllocator = never_jscore_engine::CountingAllocator;
//! ```

use serde::Serialize;
use std::alloc::{GlobalAlloc, Layout, System};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::EngineResult;

static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);
static TOTAL_ALLOCATED: AtomicU64 = AtomicU64::new(0);
static LIVE_CONTEXTS: AtomicUsize = AtomicUsize::new(0);

/// Allocator wrapper over [`System`] that tracks live and peak bytes
pub struct CountingAllocator;

#[inline]
fn record_alloc(size: usize) {
    let now = ALLOCATED.fetch_add(size, Ordering::Relaxed) + size;
    PEAK.fetch_max(now, Ordering::Relaxed);
    TOTAL_ALLOCATED.fetch_add(size as u64, Ordering::Relaxed);
}

#[inline]
fn record_dealloc(size: usize) {
    ALLOCATED.fetch_sub(size, Ordering::Relaxed);
}

// SAFETY: every call is forwarded unchanged to the system allocator
unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            record_dealloc(layout.size());
            record_alloc(new_size);
        }
        new_ptr
    }
}

// Libraries linking the rlib keep their own allocator unless they opt in
#[cfg(feature = "heap-accounting")]
#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

pub(crate) fn context_created() {
    LIVE_CONTEXTS.fetch_add(1, Ordering::SeqCst);
}

pub(crate) fn context_dropped() {
    LIVE_CONTEXTS.fetch_sub(1, Ordering::SeqCst);
}

/// Number of contexts currently alive in this process
pub fn live_contexts() -> usize {
    LIVE_CONTEXTS.load(Ordering::SeqCst)
}

/// Point-in-time heap figures for one context
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct HeapStats {
    pub used_heap_size: u64,
    pub total_heap_size: u64,
    pub total_allocated_bytes: u64,
    pub number_of_native_contexts: u64,
    pub number_of_gc_requests: u64,
    pub execution_count: u64,
}

impl HeapStats {
    /// Sample the process-wide counters and attach per-context figures
    pub fn sample(gc_requests: u64, execution_count: u64) -> Self {
        Self {
            used_heap_size: ALLOCATED.load(Ordering::Relaxed) as u64,
            total_heap_size: PEAK.load(Ordering::Relaxed) as u64,
            total_allocated_bytes: TOTAL_ALLOCATED.load(Ordering::Relaxed),
            number_of_native_contexts: live_contexts() as u64,
            number_of_gc_requests: gc_requests,
            execution_count,
        }
    }

    /// Flatten into the name -> count mapping handed across the boundary
    pub fn to_map(&self) -> BTreeMap<String, u64> {
        BTreeMap::from([
            ("used_heap_size".to_string(), self.used_heap_size),
            ("total_heap_size".to_string(), self.total_heap_size),
            ("total_allocated_bytes".to_string(), self.total_allocated_bytes),
            ("number_of_native_contexts".to_string(), self.number_of_native_contexts),
            ("number_of_gc_requests".to_string(), self.number_of_gc_requests),
            ("execution_count".to_string(), self.execution_count),
        ])
    }
}

/// Build a document in the DevTools `.heapsnapshot` shape.
///
/// Boa has no object graph walker, so nodes and edges are empty and the
/// statistics are carried under `summary`.
pub fn heapsnapshot_document(stats: &HeapStats) -> serde_json::Value {
    let timestamp_us = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0);

    serde_json::json!({
        "snapshot": {
            "meta": {
                "node_fields": ["type", "name", "id", "self_size", "edge_count"],
                "node_types": [["hidden", "object", "string", "number"], "string", "number", "number", "number"],
                "edge_fields": ["type", "name_or_index", "to_node"],
                "edge_types": [["context", "element", "property", "internal"], "string_or_number", "node"],
            },
            "node_count": 0,
            "edge_count": 0,
        },
        "nodes": [],
        "edges": [],
        "strings": [],
        "summary": {
            "timestamp_us": timestamp_us,
            "statistics": stats.to_map(),
        }
    })
}

/// Write a heap snapshot to `path`
pub fn write_heapsnapshot(path: &Path, stats: &HeapStats) -> EngineResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &heapsnapshot_document(stats))?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_stats_map_keys() {
        let map = HeapStats::sample(2, 5).to_map();
        assert!(map.contains_key("used_heap_size"));
        assert!(map.contains_key("total_heap_size"));
        assert_eq!(map["number_of_gc_requests"], 2);
        assert_eq!(map["execution_count"], 5);
    }

    #[cfg(feature = "heap-accounting")]
    #[test]
    #[serial]
    fn test_allocation_is_counted() {
        let before = TOTAL_ALLOCATED.load(Ordering::Relaxed);
        let buffer = std::hint::black_box(vec![0u8; 64 * 1024]);
        assert!(TOTAL_ALLOCATED.load(Ordering::Relaxed) >= before + buffer.len() as u64);
        assert!(PEAK.load(Ordering::Relaxed) >= buffer.len());
    }

    #[test]
    #[serial]
    fn test_live_contexts_track_creation() {
        context_created();
        assert!(live_contexts() >= 1);
        assert!(HeapStats::sample(0, 0).number_of_native_contexts >= 1);
        context_dropped();
    }

    #[test]
    fn test_snapshot_document_shape() {
        let doc = heapsnapshot_document(&HeapStats::default());
        assert_eq!(doc["snapshot"]["node_count"], 0);
        assert!(doc["nodes"].as_array().unwrap().is_empty());
        assert_eq!(doc["summary"]["statistics"]["used_heap_size"], 0);
    }

    #[test]
    fn test_write_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctx.heapsnapshot");
        write_heapsnapshot(&path, &HeapStats::sample(0, 0)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(doc["summary"]["statistics"].is_object());
    }

    #[test]
    fn test_write_snapshot_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("ctx.heapsnapshot");
        assert!(write_heapsnapshot(&path, &HeapStats::default()).is_err());
    }
}
