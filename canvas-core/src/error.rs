//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Element not found in the store.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Invalid element operation.
    #[error("Invalid operation on element: {0}")]
    InvalidOperation(String),

    /// Canvas document serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Page settings out of range.
    #[error("Invalid page size: {width}x{height}")]
    InvalidPageSize {
        /// Requested width in pixels.
        width: f32,
        /// Requested height in pixels.
        height: f32,
    },

    /// The session was opened read-only.
    #[error("Editor session is read-only")]
    ReadOnly,
}
