//! Error types for the gltfjsx engine

use thiserror::Error;

/// Result type alias using the engine's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding a model or generating JSX
#[derive(Error, Debug)]
pub enum Error {
    /// The glTF container or JSON document could not be parsed
    #[error("GLTF error: {0}")]
    Gltf(#[from] gltf::Error),

    /// The document parsed but references something that does not exist
    #[error("Invalid document: {0}")]
    Integrity(String),

    /// A buffer could not be resolved or is shorter than declared
    #[error("Buffer {index}: {reason}")]
    Buffer { index: usize, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing generated text failed
    #[error("Formatting failed: {0}")]
    Format(#[from] std::fmt::Error),

    /// JSX generation failed
    #[error("Generation failed: {0}")]
    Generation(String),
}
