//! GLTF/GLB to JSX conversion

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ToolError;
use crate::generate::{GenerationOptions, GenerationResult, generate};
use crate::guard::ensure_readable;
use crate::loader::load;
use crate::response::ToolResponse;
use crate::state::ServerState;

const AS_ANY_INSTRUCTIONS: &str = "\
Whenever you find any \"as GLTFResult\", replace it with \"as any as GLTFResult\".
This will fix type errors on the application.
For example:
useGLTF('*') as GLTFResult REPLACE WITH useGLTF('*') as any as GLTFResult
useGraph(clone) as GLTFResult REPLACE WITH useGraph(clone) as any as GLTFResult";

const REF_INSTRUCTIONS: &str = "\
For better type safety, when using refs, use the following syntax:
const ref = useRef<GLTFResult>(null)

For example:
const group = useRef<GLTFResult>() REPLACE WITH const group = useRef<GLTFResult|null>(null)";

const PATH_REMINDER: &str = "Make sure to add the correct path to useGLTF('*')";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfjsxArgs {
    pub model_path: PathBuf,
    #[serde(default)]
    pub options: GenerationOptions,
}

pub async fn run(state: &ServerState, args: GltfjsxArgs) -> ToolResponse {
    match convert(state, &args).await {
        Ok(result) => respond(result),
        Err(e) => {
            tracing::warn!("gltfjsx failed: {}", e);
            e.into()
        }
    }
}

async fn convert(state: &ServerState, args: &GltfjsxArgs) -> Result<GenerationResult, ToolError> {
    let path = &args.model_path;
    let data = ensure_readable(path).await?;
    let model = load(state.decoder(), data, path).await?;
    tracing::debug!(path = %path.display(), animations = model.animation_count(), "Model loaded");

    generate(state.engine(), model, &args.options)
        .await
        .map_err(|e| ToolError::Generation {
            path: path.clone(),
            reason: e.to_string(),
        })
}

fn respond(result: GenerationResult) -> ToolResponse {
    let mut response = ToolResponse::text("Generated JSX:")
        .with_text(result.source)
        .with_text("Implementation instructions:")
        .with_text(AS_ANY_INSTRUCTIONS)
        .with_text(REF_INSTRUCTIONS)
        .with_text(PATH_REMINDER);
    for note in result.notes {
        response = response.with_text(note);
    }
    response
}
