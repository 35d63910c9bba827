//! Tool registry
//!
//! Every tool is declared once, as data: name, description, parameter schema
//! and annotations. The same declaration drives `tools/list` and argument
//! validation in [`ToolRegistry::dispatch`].

use std::sync::Arc;

use rmcp::model::{Tool, ToolAnnotations};
use serde_json::{Map, Value};

use crate::error::ToolError;
use crate::response::ToolResponse;
use crate::schema::{Constraint, FieldKind, FieldSpec, ParamSchema};
use crate::state::ServerState;
use crate::tools::{self, decode};

/// Which handler a tool runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Debug,
    ModelStructure,
    Gltfjsx,
}

/// Declaration of one tool
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub schema: ParamSchema,
    pub kind: ToolKind,
}

impl ToolSpec {
    fn to_mcp_tool(&self) -> Tool {
        let mut tool = Tool::new(self.name, self.description, Arc::new(self.schema.to_json_schema()));
        tool.title = Some(self.title.to_string());
        // Every tool only reads local files
        tool.annotations = Some(ToolAnnotations {
            title: Some(self.title.to_string()),
            read_only_hint: Some(true),
            destructive_hint: Some(false),
            idempotent_hint: Some(true),
            open_world_hint: Some(false),
        });
        tool
    }
}

/// The set of tools the server exposes, in registration order
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolSpec>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: vec![
                ToolSpec {
                    name: "debug",
                    title: "Debug",
                    description: "Report the server's current working directory",
                    schema: ParamSchema::new(),
                    kind: ToolKind::Debug,
                },
                ToolSpec {
                    name: "get-model-structure",
                    title: "Inspect GLTF/GLB structure",
                    description: "Get the structure of a GLTF/GLB model file. Reads the file and returns \
                        the parsed scene hierarchy as JSON without loading binary data or textures. \
                        Useful for inspecting the hierarchy and contents of a 3D model.",
                    schema: ParamSchema::new().field(model_path_field(
                        "The path to the GLTF/GLB model file to get the structure of. \
                         The path must be absolute.",
                    )),
                    kind: ToolKind::ModelStructure,
                },
                ToolSpec {
                    name: "gltfjsx",
                    title: "Convert GLTF/GLB to React JSX component",
                    description: "Converts a GLTF/GLB 3D model file into a reusable, declarative React \
                        (react-three-fiber) JSX component. Supports options for TypeScript output, \
                        mesh/material instancing, pruning, texture format, mesh simplification, and \
                        more. Useful for integrating 3D assets into React apps.",
                    schema: ParamSchema::new()
                        .field(model_path_field(
                            "The path to the GLTF/GLB model file to convert to JSX. The path must be \
                             absolute on the file system. Do not use relative paths.",
                        ))
                        .field(FieldSpec::optional(
                            "options",
                            FieldKind::Object(generation_options_schema()),
                            "Options for the JSX generator",
                        )),
                    kind: ToolKind::Gltfjsx,
                },
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn specs(&self) -> &[ToolSpec] {
        &self.tools
    }

    /// Declarations in the form `tools/list` returns them
    pub fn mcp_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(ToolSpec::to_mcp_tool).collect()
    }

    /// Validate `arguments` and run the named tool.
    ///
    /// Invalid calls never reach a handler. Every call, valid or not, leaves
    /// one line in the activity log.
    pub async fn dispatch(
        &self,
        state: &ServerState,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> ToolResponse {
        let response = self.run(state, name, arguments.unwrap_or_default()).await;
        let outcome = if response.is_error() { "error" } else { "ok" };
        state.log().record(&format!("{name}: {outcome}")).await;
        response
    }

    async fn run(&self, state: &ServerState, name: &str, args: Map<String, Value>) -> ToolResponse {
        let Some(spec) = self.get(name) else {
            return ToolError::Validation(format!("unknown tool '{name}'")).into();
        };
        if let Err(e) = spec.schema.validate(&args) {
            tracing::info!(tool = name, "Rejected call: {}", e);
            return e.into();
        }

        tracing::info!(tool = name, "Tool call");
        match spec.kind {
            ToolKind::Debug => tools::debug::run(state),
            ToolKind::ModelStructure => match decode(args) {
                Ok(args) => tools::structure::run(state, args).await,
                Err(e) => e.into(),
            },
            ToolKind::Gltfjsx => match decode(args) {
                Ok(args) => tools::gltfjsx::run(state, args).await,
                Err(e) => e.into(),
            },
        }
    }
}

fn model_path_field(description: &'static str) -> FieldSpec {
    FieldSpec::required("modelPath", FieldKind::String, description).with_constraint(Constraint::AbsolutePath)
}

fn generation_options_schema() -> ParamSchema {
    [
        ("types", FieldKind::Boolean, "Add Typescript definitions to the output"),
        ("keepnames", FieldKind::Boolean, "Keep original node names from the GLTF file"),
        ("keepgroups", FieldKind::Boolean, "Keep (empty) groups, disable pruning of empty transforms"),
        ("bones", FieldKind::Boolean, "Lay out bones declaratively (default: false)"),
        ("meta", FieldKind::Boolean, "Include metadata (as userData) in the output"),
        ("shadows", FieldKind::Boolean, "Let meshes cast and receive shadows"),
        ("precision", FieldKind::Number, "Number of fractional digits for floats (default: 3)"),
        ("instance", FieldKind::Boolean, "Instance re-occurring geometry for cheaper re-use"),
        ("instanceall", FieldKind::Boolean, "Instance every geometry (for maximum re-use)"),
        ("exportdefault", FieldKind::Boolean, "Use default export for the generated component"),
        ("resolution", FieldKind::Number, "Resolution for texture resizing (default: 1024)"),
        ("keepmeshes", FieldKind::Boolean, "Do not join compatible meshes"),
        ("keepmaterials", FieldKind::Boolean, "Do not palette join materials"),
        ("format", FieldKind::String, "Texture format for output textures (default: 'webp')"),
        ("simplify", FieldKind::Boolean, "Enable mesh simplification (default: false)"),
        ("ratio", FieldKind::Number, "Simplifier ratio (default: 0)"),
        ("error", FieldKind::Number, "Simplifier error threshold (default: 0.0001)"),
    ]
    .into_iter()
    .fold(ParamSchema::new(), |schema, (name, kind, description)| {
        schema.field(FieldSpec::optional(name, kind, description))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_order_and_annotations() {
        let registry = ToolRegistry::new();
        let names: Vec<&str> = registry.specs().iter().map(|spec| spec.name).collect();
        assert_eq!(names, ["debug", "get-model-structure", "gltfjsx"]);

        for tool in registry.mcp_tools() {
            let annotations = tool.annotations.expect("annotated");
            assert_eq!(annotations.read_only_hint, Some(true));
            assert_eq!(annotations.destructive_hint, Some(false));
            assert_eq!(annotations.idempotent_hint, Some(true));
            assert_eq!(annotations.open_world_hint, Some(false));
        }
    }

    #[test]
    fn test_gltfjsx_schema() {
        let registry = ToolRegistry::new();
        let spec = registry.get("gltfjsx").expect("registered");
        let schema = Value::Object(spec.schema.to_json_schema());
        assert_eq!(schema["required"], serde_json::json!(["modelPath"]));
        let options = &schema["properties"]["options"]["properties"];
        assert_eq!(options["precision"]["type"], "number");
        assert_eq!(options["format"]["type"], "string");
        assert_eq!(options.as_object().map(Map::len), Some(17));
    }
}
