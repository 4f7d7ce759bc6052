//! Heap statistics returned by [`Context::get_heap_statistics`](crate::Context::get_heap_statistics)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{JsCoreError, JsCoreResult};

/// Point-in-time mapping from metric name to count.
///
/// Produced on demand and never cached. Key names are defined by the engine;
/// `used_heap_size` is always expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeapStatistics(HashMap<String, u64>);

impl HeapStatistics {
    pub const USED_HEAP_SIZE: &'static str = "used_heap_size";
    pub const TOTAL_HEAP_SIZE: &'static str = "total_heap_size";

    /// Parse the JSON object handed over by the engine
    pub fn parse(json: &str) -> JsCoreResult<Self> {
        serde_json::from_str(json).map_err(JsCoreError::MalformedHeapStats)
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.0.get(name).copied()
    }

    pub fn used_heap_size(&self) -> Option<u64> {
        self.get(Self::USED_HEAP_SIZE)
    }

    pub fn total_heap_size(&self) -> Option<u64> {
        self.get(Self::TOTAL_HEAP_SIZE)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> HashMap<String, u64> {
        self.0
    }
}

impl std::ops::Index<&str> for HeapStatistics {
    type Output = u64;

    fn index(&self, name: &str) -> &u64 {
        &self.0[name]
    }
}
