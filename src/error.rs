//! Error types for the viewer core.
//!
//! Only configuration-fatal problems surface as errors. Data absence is
//! modeled as `Option`, stale async results are silently discarded, and
//! malformed external input is dropped per-field by the decoders.

use thiserror::Error;

/// Errors that can occur in the viewer synchronization core.
#[derive(Error, Debug)]
pub enum ViewerError {
    /// Base configuration is unusable; no further interaction is meaningful.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// The catalogue payload contains no region with a null parent.
    #[error("catalogue has no root region")]
    NoRoot,

    /// JSON parsing error in the catalogue payload or configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML parsing error in a per-slice overlay document.
    #[error("SVG error: {0}")]
    Svg(#[from] quick_xml::Error),

    /// Overlay document parsed but its structure is unusable.
    #[error("invalid overlay document: {message}")]
    InvalidOverlay {
        /// Description of the structural problem.
        message: String,
    },

    /// Region edit engine misuse or unusable target path.
    #[error("edit error: {message}")]
    Edit {
        /// Description of the edit problem.
        message: String,
    },
}

impl ViewerError {
    /// Create a configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid overlay error with a message.
    pub fn invalid_overlay(message: impl Into<String>) -> Self {
        Self::InvalidOverlay {
            message: message.into(),
        }
    }

    /// Create an edit error with a message.
    pub fn edit(message: impl Into<String>) -> Self {
        Self::Edit {
            message: message.into(),
        }
    }
}
