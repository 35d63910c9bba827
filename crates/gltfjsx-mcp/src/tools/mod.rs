//! Tool handlers
//!
//! Each handler receives arguments that already passed schema validation and
//! never fails: errors come back as `is_error` responses.

pub mod debug;
pub mod gltfjsx;
pub mod structure;

use std::path::PathBuf;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ToolError;

/// Arguments of tools that take only a model path
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelArgs {
    pub model_path: PathBuf,
}

/// Convert validated arguments into a handler's typed arguments
pub(crate) fn decode<T: DeserializeOwned>(args: Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args)).map_err(|e| ToolError::Validation(e.to_string()))
}
