//! Error types for the OBJ exporter.

use thiserror::Error;

/// Result type alias using ExportError.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Main error type for scene export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// I/O error while writing an output file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a JSON scene document.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The transform stack was read or popped while empty. The host must
    /// balance instance/link begin and end notifications, so this always
    /// indicates a traversal protocol violation.
    #[error("transform stack underflow: {0}")]
    TransformStackUnderflow(&'static str),

    /// The host called hooks outside the required protocol order.
    #[error("traversal protocol violation: {0}")]
    Protocol(String),
}
