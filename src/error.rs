//! Error types for styled QR rendering.

use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, QrStyleError>;

/// Every way a styled render can fail.
///
/// Configuration and layout problems are reported before anything is drawn. Image loading
/// failures are only surfaced for assets the render cannot do without; a missing logo
/// degrades to a render without it.
#[derive(Error, Debug)]
pub enum QrStyleError {
    /// Unknown shape variant, malformed gradient, unparsable colour, out-of-range size.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The module grid cannot be laid out on the requested canvas.
    #[error("Layout error: {0}")]
    Layout(String),

    /// An image could not be fetched or decoded.
    #[error("Image load error: {0}")]
    ImageLoad(String),

    /// The render target could not be allocated, serialized or encoded.
    #[error("Render target error: {0}")]
    RenderTarget(String),
}

impl From<serde_json::Error> for QrStyleError {
    fn from(err: serde_json::Error) -> Self {
        QrStyleError::Configuration(err.to_string())
    }
}
