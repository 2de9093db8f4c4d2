//! Export host error types.

use std::path::PathBuf;

use canvas_renderer::RenderError;
use thiserror::Error;

/// Errors that can occur while running an export.
#[derive(Debug, Error)]
pub enum HostError {
    /// Reading the document or writing the PDF failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A configured URL is malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upload endpoint rejected the file.
    #[error("upload rejected with status {status}: {body}")]
    Upload {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The upload endpoint answered with something other than `{ "url": ... }`.
    #[error("unexpected upload response: {0}")]
    UnexpectedResponse(String),

    /// PDF export failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The export task panicked or was cancelled.
    #[error("export task failed: {0}")]
    Task(String),
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
