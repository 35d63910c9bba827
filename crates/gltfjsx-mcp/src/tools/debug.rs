//! Working directory probe

use crate::response::ToolResponse;
use crate::state::ServerState;

pub fn run(state: &ServerState) -> ToolResponse {
    ToolResponse::text(format!(
        "Current working directory: {}",
        state.working_dir().display()
    ))
}
