//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Building or writing the PDF failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Another export is running on this exporter.
    #[error("An export is already in progress")]
    ExportInProgress,

    /// The page is too small, too large or not finite.
    #[error("Invalid page size: {width}x{height}")]
    InvalidPage {
        /// Page width in pixels.
        width: f32,
        /// Page height in pixels.
        height: f32,
    },
}
