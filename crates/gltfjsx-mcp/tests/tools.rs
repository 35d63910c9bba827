//! End-to-end tool calls against model files on disk

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gltfjsx_core::{JsxOutput, Model, ParseOptions};
use gltfjsx_mcp::generate::{JsxEngine, NO_ANIMATIONS_NOTE};
use gltfjsx_mcp::{GltfjsxMcpService, ServerState, ToolResponse};
use serde_json::{Map, Value, json};
use tempfile::TempDir;

const CHAIR: &str = r#"{
    "asset": { "version": "2.0", "generator": "test" },
    "scenes": [{ "nodes": [0] }],
    "nodes": [
        { "name": "Chair", "children": [1], "extras": { "price": 40 } },
        { "name": "Seat", "mesh": 0, "translation": [0, 0.45, 0] }
    ],
    "materials": [{ "name": "Oak" }],
    "meshes": [{ "name": "SeatMesh", "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }],
    "accessors": [{ "componentType": 5126, "count": 1, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 1], "bufferView": 0 }],
    "bufferViews": [{ "buffer": 0, "byteLength": 12 }],
    "buffers": [{ "byteLength": 12 }]
}"#;

const WINDMILL: &str = r#"{
    "asset": { "version": "2.0" },
    "scenes": [{ "nodes": [0] }],
    "nodes": [{ "name": "Blades", "mesh": 0 }],
    "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
    "accessors": [
        { "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 1] },
        { "componentType": 5126, "count": 2, "type": "SCALAR" },
        { "componentType": 5126, "count": 2, "type": "VEC4" }
    ],
    "animations": [{
        "name": "Turn",
        "channels": [{ "sampler": 0, "target": { "node": 0, "path": "rotation" } }],
        "samplers": [{ "input": 1, "output": 2 }]
    }]
}"#;

const EYE: &str = r#"{
    "asset": { "version": "2.0" },
    "scenes": [{ "nodes": [0] }],
    "nodes": [{ "name": "Eye", "camera": 0 }],
    "cameras": [{ "type": "perspective" }]
}"#;

const LASER: &str = r#"{
    "asset": { "version": "2.0" },
    "scenes": [{ "nodes": [0] }],
    "nodes": [{ "name": "Beam", "extensions": { "KHR_lights_punctual": { "light": 0 } } }],
    "extensionsUsed": ["KHR_lights_punctual"],
    "extensions": { "KHR_lights_punctual": { "lights": [{ "type": "laser" }] } }
}"#;

/// A single chain of `len` nodes, each the parent of the next
fn chain(len: usize) -> String {
    let nodes: Vec<String> = (0..len)
        .map(|i| {
            if i + 1 < len {
                format!(r#"{{ "children": [{}] }}"#, i + 1)
            } else {
                "{}".to_string()
            }
        })
        .collect();
    format!(
        r#"{{ "asset": {{ "version": "2.0" }}, "scenes": [{{ "nodes": [0] }}], "nodes": [{}] }}"#,
        nodes.join(", ")
    )
}

/// Wrap a JSON document and binary payload into a GLB container
fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let total = 12 + 8 + json.len() + 8 + bin.len();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(b"BIN\0");
    out.extend_from_slice(bin);
    out
}

struct Fixture {
    dir: TempDir,
    service: GltfjsxMcpService,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let service = GltfjsxMcpService::new(ServerState::with_working_dir(dir.path()));
        Self { dir, service }
    }

    fn with_engine(engine: Arc<dyn JsxEngine>) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let state = ServerState::with_working_dir(dir.path()).with_engine(engine);
        Self {
            dir,
            service: GltfjsxMcpService::new(state),
        }
    }

    fn write(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, data).expect("write fixture");
        path
    }

    fn chair(&self) -> PathBuf {
        self.chair_from(CHAIR)
    }

    fn chair_from(&self, json: &str) -> PathBuf {
        let seat: Vec<u8> = [0.0f32, 0.0, 0.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        self.write("chair.glb", &glb(json, &seat))
    }

    async fn call(&self, name: &str, arguments: Value) -> ToolResponse {
        let arguments = match arguments {
            Value::Object(map) => Some(map),
            _ => None::<Map<String, Value>>,
        };
        self.service.call(name, arguments).await
    }

    fn log_lines(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("app.log"))
            .map(|text| text.lines().map(String::from).collect())
            .unwrap_or_default()
    }
}

fn texts(response: &ToolResponse) -> Vec<&str> {
    response.texts().collect()
}

#[tokio::test]
async fn test_lists_tools_in_order() {
    let fixture = Fixture::new();
    let names: Vec<String> = fixture
        .service
        .registry()
        .mcp_tools()
        .into_iter()
        .map(|tool| tool.name.to_string())
        .collect();
    assert_eq!(names, ["debug", "get-model-structure", "gltfjsx"]);
}

#[tokio::test]
async fn test_debug_reports_working_directory() {
    let fixture = Fixture::new();
    let response = fixture.call("debug", json!({})).await;
    assert!(!response.is_error());
    assert_eq!(
        texts(&response),
        [format!("Current working directory: {}", fixture.dir.path().display())]
    );
    assert_eq!(fixture.log_lines().len(), 1);
}

#[tokio::test]
async fn test_chair_with_types() {
    let fixture = Fixture::new();
    let path = fixture.chair();

    let response = fixture
        .call("gltfjsx", json!({ "modelPath": path, "options": { "types": true } }))
        .await;
    assert!(!response.is_error(), "{:?}", texts(&response));

    let blocks = texts(&response);
    assert_eq!(blocks.len(), 7);
    assert_eq!(blocks[0], "Generated JSX:");
    let source = blocks[1];
    assert!(source.starts_with("/* eslint-disable */\n"));
    assert!(source.contains("import React, { JSX } from 'react'"));
    assert!(source.contains("import { GLTF } from 'three/examples/jsm/loaders/GLTFLoader.js'"));
    assert!(!source.contains("three-stdlib"));
    assert!(source.contains("useGLTF('/chair.glb') as GLTFResult"));
    assert!(source.contains("material={materials.Oak}"));
    assert_eq!(blocks[2], "Implementation instructions:");
    assert!(blocks[3].contains("as any as GLTFResult"));
    assert!(blocks[4].contains("useRef<GLTFResult|null>(null)"));
    assert!(blocks[5].contains("useGLTF('*')"));
    assert_eq!(blocks[6], NO_ANIMATIONS_NOTE);

    assert_eq!(fixture.log_lines().len(), 1);
    assert!(fixture.log_lines()[0].ends_with("gltfjsx: ok"));
}

#[tokio::test]
async fn test_without_types_react_import_is_untouched() {
    let fixture = Fixture::new();
    let path = fixture.chair();
    let response = fixture.call("gltfjsx", json!({ "modelPath": path })).await;
    let source = texts(&response)[1].to_string();
    assert!(source.contains("import React from 'react'"));
    assert!(!source.contains("JSX }"));
}

#[tokio::test]
async fn test_generation_is_deterministic() {
    let fixture = Fixture::new();
    let path = fixture.chair();
    let args = json!({ "modelPath": path, "options": { "types": true, "shadows": true, "meta": true } });
    let first = fixture.call("gltfjsx", args.clone()).await;
    let second = fixture.call("gltfjsx", args).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_animated_model_has_no_advisory() {
    let fixture = Fixture::new();
    let path = fixture.write("windmill.gltf", WINDMILL.as_bytes());
    let response = fixture.call("gltfjsx", json!({ "modelPath": path })).await;
    assert!(!response.is_error());

    let blocks = texts(&response);
    assert_eq!(blocks.len(), 6);
    assert!(!blocks.contains(&NO_ANIMATIONS_NOTE));
    assert!(blocks[1].contains("useAnimations(animations, group)"));
}

#[tokio::test]
async fn test_missing_model() {
    let fixture = Fixture::new();
    let path = fixture.dir.path().join("nope.glb");

    for tool in ["gltfjsx", "get-model-structure"] {
        let response = fixture.call(tool, json!({ "modelPath": path })).await;
        assert!(response.is_error());
        assert_eq!(
            texts(&response),
            [format!("Model file not found at path: {}", path.display())]
        );
    }
    assert!(fixture.log_lines().iter().all(|line| line.ends_with(": error")));
}

#[tokio::test]
async fn test_invalid_arguments_are_rejected() {
    let fixture = Fixture::new();
    let path = fixture.chair();

    let cases = [
        ("gltfjsx", json!({})),
        ("gltfjsx", json!({ "modelPath": "chair.glb" })),
        ("gltfjsx", json!({ "modelPath": path, "options": { "types": "yes" } })),
        ("get-model-structure", json!({ "modelPath": false })),
        ("render", json!({})),
    ];
    for (tool, args) in cases {
        let response = fixture.call(tool, args).await;
        assert!(response.is_error());
        assert!(texts(&response)[0].starts_with("Invalid arguments:"), "{:?}", texts(&response));
    }
}

#[tokio::test]
async fn test_undecodable_model() {
    let fixture = Fixture::new();
    let path = fixture.write("broken.glb", b"glTF\x02\x00\x00\x00garbage");
    let response = fixture.call("gltfjsx", json!({ "modelPath": path })).await;
    assert!(response.is_error());
    assert!(texts(&response)[0].contains(&path.display().to_string()));
}

#[tokio::test]
async fn test_malformed_models_are_decode_errors() {
    let fixture = Fixture::new();
    for (name, json) in [("eye.gltf", EYE), ("laser.gltf", LASER)] {
        let path = fixture.write(name, json.as_bytes());
        for tool in ["gltfjsx", "get-model-structure"] {
            let response = fixture.call(tool, json!({ "modelPath": path })).await;
            assert!(response.is_error());
            let message = texts(&response)[0];
            assert!(
                message.starts_with(&format!("Failed to load model at {}", path.display())),
                "{message}"
            );
            assert!(message.contains("invalid glTF"), "{message}");
        }
    }
}

#[tokio::test]
async fn test_deep_hierarchy_is_a_decode_error() {
    let fixture = Fixture::new();
    let path = fixture.write("rope.gltf", chain(20_000).as_bytes());
    for tool in ["gltfjsx", "get-model-structure"] {
        let response = fixture.call(tool, json!({ "modelPath": path })).await;
        assert!(response.is_error());
        let message = texts(&response)[0];
        assert!(message.starts_with("Failed to load model at"), "{message}");
        assert!(message.contains("levels deep"), "{message}");
    }
}

#[tokio::test]
async fn test_draco_model_loads_with_public_decoder() {
    let fixture = Fixture::new();
    let json = CHAIR.replace(
        r#""asset": { "version": "2.0", "generator": "test" },"#,
        r#""asset": { "version": "2.0", "generator": "test" },
    "extensionsUsed": ["KHR_draco_mesh_compression"],
    "extensionsRequired": ["KHR_draco_mesh_compression"],"#,
    );
    let path = fixture.chair_from(&json);
    let response = fixture.call("gltfjsx", json!({ "modelPath": path })).await;
    assert!(!response.is_error(), "{:?}", texts(&response));
    assert!(texts(&response)[1].contains(
        "useGLTF('/chair.glb', 'https://www.gstatic.com/draco/v1/decoders/')"
    ));
}

#[tokio::test]
async fn test_model_structure() {
    let fixture = Fixture::new();
    let path = fixture.chair();
    let response = fixture.call("get-model-structure", json!({ "modelPath": path })).await;
    assert!(!response.is_error());

    let scene: Value = serde_json::from_str(texts(&response)[0]).expect("structure is JSON");
    assert_eq!(scene["type"], "Group");
    let chair = &scene["children"][0];
    assert_eq!(chair["name"], "Chair");
    assert_eq!(chair["userData"]["price"], 40);
    assert_eq!(chair["children"][0]["mesh"]["material"], "Oak");
}

/// Engine that prints instead of returning source
struct Printing;

impl JsxEngine for Printing {
    fn parse(&self, _: &Model, _: &ParseOptions) -> gltfjsx_core::Result<JsxOutput> {
        Ok(JsxOutput::Printed)
    }
}

#[tokio::test]
async fn test_non_text_engine_output_is_an_error() {
    let fixture = Fixture::with_engine(Arc::new(Printing));
    let path = fixture.chair();
    let response = fixture.call("gltfjsx", json!({ "modelPath": path })).await;
    assert!(response.is_error());
    assert!(texts(&response)[0].starts_with("Failed to generate JSX"));
}

#[tokio::test]
async fn test_options_without_model_reach_no_handler() {
    let fixture = Fixture::new();
    let response = fixture
        .call("gltfjsx", json!({ "options": { "types": true } }))
        .await;
    assert!(response.is_error());
    assert!(Path::new(&fixture.dir.path().join("app.log")).exists());
}
