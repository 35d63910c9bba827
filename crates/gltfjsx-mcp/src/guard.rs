//! File access guard

use std::path::Path;

use crate::error::ToolError;

/// Read a model file, reporting anything that keeps it from being read as
/// [`ToolError::NotFound`].
///
/// Existence is probed first so a missing file is reported without
/// attempting a read.
pub async fn ensure_readable(path: &Path) -> Result<Vec<u8>, ToolError> {
    match tokio::fs::try_exists(path).await {
        Ok(true) => {}
        Ok(false) => return Err(ToolError::not_found(path)),
        Err(e) => {
            return Err(ToolError::NotFound {
                path: path.to_path_buf(),
                reason: Some(e.to_string()),
            });
        }
    }

    tokio::fs::read(path).await.map_err(|e| ToolError::NotFound {
        path: path.to_path_buf(),
        reason: Some(e.to_string()),
    })
}
