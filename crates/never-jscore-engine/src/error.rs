//! Error types for engine-side operations
//!
//! None of these cross the C boundary: exports turn them into a failure status
//! or a null buffer and keep the message for `never_jscore_last_error`.

use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The Boa context could not be built or its prelude failed
    #[error("Context creation failed: {0}")]
    Creation(String),

    /// Script text did not parse
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Script threw or failed at runtime
    #[error("{0}")]
    Script(String),

    /// Completion value could not be turned into JSON text
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn script(err: boa_engine::JsError) -> Self {
        Self::Script(err.to_string())
    }
}
