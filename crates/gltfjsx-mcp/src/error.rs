//! Tool error taxonomy

use std::path::PathBuf;

use thiserror::Error;

/// Errors a tool call can end in.
///
/// None of these escape the tool boundary: each is turned into an
/// `is_error` response by [`ToolResponse`](crate::response::ToolResponse).
#[derive(Error, Debug)]
pub enum ToolError {
    /// Arguments did not match the tool's schema, or the tool is unknown
    #[error("Invalid arguments: {0}")]
    Validation(String),

    /// The model file does not exist or cannot be read
    #[error(
        "Model file not found at path: {}{}",
        path.display(),
        reason.as_ref().map(|r| format!(" ({r})")).unwrap_or_default()
    )]
    NotFound {
        path: PathBuf,
        reason: Option<String>,
    },

    /// The engine could not decode the model
    #[error("Failed to load model at {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// The engine could not produce JSX for a decoded model
    #[error("Failed to generate JSX for {}: {reason}", path.display())]
    Generation { path: PathBuf, reason: String },
}

impl ToolError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            path: path.into(),
            reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let missing = ToolError::not_found("/models/chair.glb");
        assert_eq!(missing.to_string(), "Model file not found at path: /models/chair.glb");

        let unreadable = ToolError::NotFound {
            path: "/models".into(),
            reason: Some("Is a directory".into()),
        };
        assert_eq!(
            unreadable.to_string(),
            "Model file not found at path: /models (Is a directory)"
        );

        let decode = ToolError::Decode {
            path: "/models/chair.glb".into(),
            reason: "bad magic".into(),
        };
        assert!(decode.to_string().contains("/models/chair.glb"));
    }
}
