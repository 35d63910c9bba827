//! Model structure inspection

use super::ModelArgs;
use crate::error::ToolError;
use crate::guard::ensure_readable;
use crate::response::ToolResponse;
use crate::state::ServerState;
use crate::structure::extract_structure;

pub async fn run(state: &ServerState, args: ModelArgs) -> ToolResponse {
    match describe(state, &args).await {
        Ok(json) => ToolResponse::text(json),
        Err(e) => {
            tracing::warn!("get-model-structure failed: {}", e);
            e.into()
        }
    }
}

async fn describe(state: &ServerState, args: &ModelArgs) -> Result<String, ToolError> {
    let path = &args.model_path;
    let data = ensure_readable(path).await?;
    let structure = extract_structure(state.extractor(), data, path).await?;
    serde_json::to_string_pretty(&structure.scene).map_err(|e| ToolError::Decode {
        path: path.clone(),
        reason: e.to_string(),
    })
}
