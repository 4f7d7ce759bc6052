//! Error types for bridge operations
//!
//! Every failure reported by the engine surface is mapped to exactly one
//! variant here and handed to the immediate caller. Nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bridge operations
pub type JsCoreResult<T> = Result<T, JsCoreError>;

#[derive(Debug, Error)]
pub enum JsCoreError {
    /// The engine returned a null handle
    #[error("Context creation failed")]
    CreationFailed,

    /// The context was closed before this call
    #[error("Context is closed")]
    ContextClosed,

    /// Exec or Eval reported failure (script error or result serialization)
    #[error("Execution failed{}", format_detail(detail))]
    ExecutionFailed { detail: Option<String> },

    /// Compile reported failure
    #[error("Compilation failed{}", format_detail(detail))]
    CompilationFailed { detail: Option<String> },

    /// A call argument could not be encoded as JSON
    #[error("Failed to encode argument {index}: {source}")]
    ArgumentEncodingFailed {
        index: usize,
        source: serde_json::Error,
    },

    /// The engine returned no heap statistics buffer
    #[error("Heap statistics unavailable")]
    HeapStatsUnavailable,

    /// The heap statistics buffer was not a name -> count JSON object
    #[error("Malformed heap statistics: {0}")]
    MalformedHeapStats(#[source] serde_json::Error),

    /// The engine could not write a heap snapshot
    #[error("Heap snapshot to {} failed", path.display())]
    SnapshotFailed { path: PathBuf },

    /// Host text holds a NUL byte and cannot cross as null-terminated text
    #[error("{what} contains an interior NUL byte")]
    InteriorNul { what: &'static str },
}

fn format_detail(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(": {}", detail),
        None => String::new(),
    }
}

impl JsCoreError {
    pub(crate) fn execution(detail: Option<String>) -> Self {
        Self::ExecutionFailed { detail }
    }

    pub(crate) fn compilation(detail: Option<String>) -> Self {
        Self::CompilationFailed { detail }
    }

    /// Check if the failure came from using a closed context
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::ContextClosed)
    }

    /// Check if this failure was reported by the engine for script text
    pub fn is_script_error(&self) -> bool {
        matches!(
            self,
            Self::ExecutionFailed { .. } | Self::CompilationFailed { .. }
        )
    }

    /// Engine-provided message, when the engine surface reports one
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::ExecutionFailed { detail } | Self::CompilationFailed { detail } => {
                detail.as_deref()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_failed_display() {
        let err = JsCoreError::execution(Some("Error: boom".into()));
        assert_eq!(err.to_string(), "Execution failed: Error: boom");
        assert!(err.is_script_error());
        assert_eq!(err.detail(), Some("Error: boom"));

        let err = JsCoreError::execution(None);
        assert_eq!(err.to_string(), "Execution failed");
        assert!(err.detail().is_none());
    }

    #[test]
    fn test_compilation_failed_display() {
        let err = JsCoreError::compilation(Some("Syntax error: unexpected token".into()));
        assert!(err.to_string().starts_with("Compilation failed: "));
        assert!(err.is_script_error());
    }

    #[test]
    fn test_closed() {
        assert!(JsCoreError::ContextClosed.is_closed());
        assert!(!JsCoreError::ContextClosed.is_script_error());
        assert!(!JsCoreError::CreationFailed.is_closed());
    }

    #[test]
    fn test_snapshot_failed_display() {
        let err = JsCoreError::SnapshotFailed {
            path: PathBuf::from("/tmp/heap.heapsnapshot"),
        };
        assert_eq!(err.to_string(), "Heap snapshot to /tmp/heap.heapsnapshot failed");
    }

    #[test]
    fn test_argument_encoding_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = JsCoreError::ArgumentEncodingFailed { index: 2, source };
        assert!(err.to_string().starts_with("Failed to encode argument 2: "));
    }
}
