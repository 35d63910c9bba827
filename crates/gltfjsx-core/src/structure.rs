//! Structure-only loading
//!
//! [`GltfStructureLoader`] reads just the JSON document of a GLTF/GLB file and
//! describes its object hierarchy. Buffers and images are never resolved, and
//! the binary chunk of a GLB is not even copied, which makes this much
//! cheaper than a full [`GltfLoader`](crate::loader::GltfLoader) load.

use std::path::PathBuf;
use std::thread;

use serde::Serialize;
use serde_json::Value;

use crate::model::{GLB_MAGIC, check_document};
use crate::scene::{CameraInfo, LightKind, NodeKind, SceneGraph, SceneNode};
use crate::Result;

/// Parsed structure of a model
#[derive(Debug, Clone, Serialize)]
pub struct SceneStructure {
    /// Root of the default scene
    pub scene: StructureNode,
    pub animations: Vec<AnimationSummary>,
    pub materials: Vec<String>,
}

/// One object of the hierarchy
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<StructureNode>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshSummary {
    pub index: usize,
    pub primitive: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertex_count: Option<usize>,
    #[serde(skip_serializing_if = "is_zero")]
    pub morph_targets: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnimationSummary {
    pub name: String,
    pub channels: usize,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

impl SceneStructure {
    /// Describe a document that has already passed the integrity check
    pub fn from_document(document: &gltf::Document) -> Self {
        Self::from_graph(&SceneGraph::from_document(document))
    }

    pub fn from_graph(graph: &SceneGraph) -> Self {
        Self {
            scene: StructureNode {
                name: graph.name.clone(),
                kind: "Group",
                position: None,
                rotation: None,
                scale: None,
                mesh: None,
                camera: None,
                light: None,
                user_data: None,
                children: graph.children.iter().map(StructureNode::from_node).collect(),
            },
            animations: graph
                .animations
                .iter()
                .map(|clip| AnimationSummary {
                    name: clip.name.clone(),
                    channels: clip.channels,
                })
                .collect(),
            materials: graph.materials.clone(),
        }
    }
}

impl StructureNode {
    fn from_node(node: &SceneNode) -> Self {
        let t = &node.transform;
        let euler = t.euler();

        let camera = match &node.kind {
            NodeKind::Camera(CameraInfo::Perspective {
                yfov,
                znear,
                zfar,
                aspect_ratio,
            }) => Some(serde_json::json!({
                "fov": yfov.to_degrees(),
                "near": znear,
                "far": zfar,
                "aspect": aspect_ratio,
            })),
            NodeKind::Camera(CameraInfo::Orthographic {
                xmag,
                ymag,
                znear,
                zfar,
            }) => Some(serde_json::json!({
                "left": -xmag,
                "right": xmag,
                "top": ymag,
                "bottom": -ymag,
                "near": znear,
                "far": zfar,
            })),
            _ => None,
        };

        let light = match &node.kind {
            NodeKind::Light(light) => {
                let mut value = serde_json::json!({
                    "color": light.color,
                    "intensity": light.intensity,
                    "distance": light.range,
                });
                if let LightKind::Spot {
                    inner_cone_angle,
                    outer_cone_angle,
                } = light.kind
                {
                    value["angle"] = outer_cone_angle.into();
                    value["penumbra"] = spot_penumbra(inner_cone_angle, outer_cone_angle).into();
                }
                Some(value)
            }
            _ => None,
        };

        Self {
            name: node.name.clone(),
            kind: node.kind.type_name(),
            position: (t.translation != glam::Vec3::ZERO).then(|| t.translation.to_array()),
            rotation: (euler != glam::Vec3::ZERO).then(|| euler.to_array()),
            scale: (t.scale != glam::Vec3::ONE).then(|| t.scale.to_array()),
            mesh: node.kind.mesh().map(|mesh| MeshSummary {
                index: mesh.mesh,
                primitive: mesh.primitive,
                name: mesh.mesh_name.clone(),
                material: mesh.material.clone(),
                vertex_count: mesh.vertex_count,
                morph_targets: mesh.morph_targets,
            }),
            camera,
            light,
            user_data: node.extras.clone(),
            children: node.children.iter().map(StructureNode::from_node).collect(),
        }
    }
}

/// Spot light penumbra the way three.js derives it from glTF cone angles
pub(crate) fn spot_penumbra(inner_cone_angle: f32, outer_cone_angle: f32) -> f32 {
    if outer_cone_angle <= 0.0 {
        0.0
    } else {
        (1.0 - inner_cone_angle / outer_cone_angle).clamp(0.0, 1.0)
    }
}

/// Read only the JSON document of a GLTF or GLB file
pub fn read_document(data: &[u8]) -> Result<gltf::Document> {
    let root: gltf::json::Root = if data.starts_with(GLB_MAGIC) {
        let glb = gltf::Glb::from_slice(data)?;
        serde_json::from_slice(&glb.json)?
    } else {
        serde_json::from_slice(data)?
    };
    check_document(&root)?;
    Ok(gltf::Document::from_json_without_validation(root))
}

/// Loader that extracts the object hierarchy without touching binary data
#[derive(Debug, Clone, Default)]
pub struct GltfStructureLoader;

impl GltfStructureLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse `data` in the background and hand the outcome to `callback`.
    ///
    /// `path` only labels diagnostics; nothing is read from it.
    pub fn parse<F>(&self, data: Vec<u8>, path: impl Into<PathBuf>, callback: F)
    where
        F: FnOnce(Result<SceneStructure>) + Send + 'static,
    {
        let path = path.into();
        let spawned = thread::Builder::new()
            .name("gltf-structure".to_string())
            .spawn(move || {
                let result = read_document(&data).map(|document| SceneStructure::from_document(&document));
                if let Err(e) = &result {
                    tracing::debug!(path = %path.display(), "Structure parse failed: {}", e);
                }
                callback(result);
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to start structure thread: {}", e);
        }
    }
}
