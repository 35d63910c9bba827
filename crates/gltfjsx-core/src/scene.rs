//! Scene graph reconstruction
//!
//! Rebuilds the object tree a three.js `GLTFLoader` would produce for a
//! document: which nodes become meshes, skinned meshes, bones, cameras,
//! lights or plain objects, and what unique name each object gets. Both the
//! structure loader and the JSX generator work from this tree, so the names
//! in an inspected structure match the ones in generated code.

use std::collections::{BTreeSet, HashMap};

use glam::{EulerRot, Quat, Vec3};
use gltf::camera::Projection;
use gltf::khr_lights_punctual::Kind as GltfLightKind;
use serde_json::Value;

/// The reconstructed default scene of a document
#[derive(Debug, Clone)]
pub struct SceneGraph {
    /// Scene name, "Scene" when the document does not name it
    pub name: String,
    /// Top-level objects of the scene
    pub children: Vec<SceneNode>,
    /// Animation clips, in document order
    pub animations: Vec<AnimationClip>,
    /// Distinct named materials, in document order
    pub materials: Vec<String>,
}

/// One object in the reconstructed scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Unique, sanitized object name
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    /// Parsed `extras` of the glTF node
    pub extras: Option<Value>,
    /// Whether an animation channel targets this object
    pub animated: bool,
    pub children: Vec<SceneNode>,
}

/// What kind of three.js object a node turns into
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A node with nothing attached
    Object3D,
    /// A container synthesized for multi-primitive meshes or nodes carrying
    /// several attachments
    Group,
    Mesh(MeshRef),
    SkinnedMesh(MeshRef),
    Bone,
    Camera(CameraInfo),
    Light(LightInfo),
}

impl NodeKind {
    /// three.js class name of the object
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Object3D => "Object3D",
            NodeKind::Group => "Group",
            NodeKind::Mesh(_) => "Mesh",
            NodeKind::SkinnedMesh(_) => "SkinnedMesh",
            NodeKind::Bone => "Bone",
            NodeKind::Camera(CameraInfo::Perspective { .. }) => "PerspectiveCamera",
            NodeKind::Camera(CameraInfo::Orthographic { .. }) => "OrthographicCamera",
            NodeKind::Light(light) => match light.kind {
                LightKind::Directional => "DirectionalLight",
                LightKind::Point => "PointLight",
                LightKind::Spot { .. } => "SpotLight",
            },
        }
    }

    /// Mesh data for meshes and skinned meshes
    pub fn mesh(&self) -> Option<&MeshRef> {
        match self {
            NodeKind::Mesh(mesh) | NodeKind::SkinnedMesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Plain containers that pruning may remove or flatten
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Object3D | NodeKind::Group)
    }
}

/// Reference to one primitive of a glTF mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshRef {
    pub mesh: usize,
    pub primitive: usize,
    pub mesh_name: Option<String>,
    /// Name of the primitive's material, when it has a named one
    pub material: Option<String>,
    pub morph_targets: usize,
    pub vertex_count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraInfo {
    Perspective {
        yfov: f32,
        znear: f32,
        zfar: Option<f32>,
        aspect_ratio: Option<f32>,
    },
    Orthographic {
        xmag: f32,
        ymag: f32,
        znear: f32,
        zfar: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightInfo {
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
    pub range: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Directional,
    Point,
    Spot { inner_cone_angle: f32, outer_cone_angle: f32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationClip {
    pub name: String,
    pub channels: usize,
}

/// Local transform of an object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    fn from_node(node: &gltf::Node<'_>) -> Self {
        let (translation, rotation, scale) = node.transform().decomposed();
        Self {
            translation: Vec3::from(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from(scale),
        }
    }

    /// Rotation as three.js XYZ Euler angles, in radians
    pub fn euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    pub fn is_identity(&self) -> bool {
        const EPSILON: f32 = 1e-6;
        self.translation.abs_diff_eq(Vec3::ZERO, EPSILON)
            && self.euler().abs_diff_eq(Vec3::ZERO, EPSILON)
            && self.scale.abs_diff_eq(Vec3::ONE, EPSILON)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Strip characters three.js reserves in object names: whitespace becomes
/// `_`, and `[ ] . : /` are removed.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '[' | ']' | '.' | ':' | '/'))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Hands out unique object names, suffixing repeats with `_1`, `_2`, ...
#[derive(Debug, Default)]
struct NameRegistry {
    seen: HashMap<String, usize>,
}

impl NameRegistry {
    fn unique(&mut self, name: &str) -> String {
        if !self.seen.contains_key(name) {
            self.seen.insert(name.to_string(), 0);
            return name.to_string();
        }
        loop {
            let count = self.seen.entry(name.to_string()).or_insert(0);
            *count += 1;
            let candidate = format!("{name}_{count}");
            if !self.seen.contains_key(&candidate) {
                self.seen.insert(candidate.clone(), 0);
                return candidate;
            }
        }
    }
}

struct Builder {
    names: NameRegistry,
    bones: BTreeSet<usize>,
    animated: BTreeSet<usize>,
}

impl SceneGraph {
    /// Reconstruct the default scene (or the first scene when no default is
    /// set) of a document whose indices have already been checked.
    pub fn from_document(document: &gltf::Document) -> Self {
        let bones = document
            .skins()
            .flat_map(|skin| skin.joints().map(|joint| joint.index()).collect::<Vec<_>>())
            .collect();
        let animated = document
            .animations()
            .flat_map(|animation| {
                animation
                    .channels()
                    .map(|channel| channel.target().node().index())
                    .collect::<Vec<_>>()
            })
            .collect();

        let mut builder = Builder {
            names: NameRegistry::default(),
            bones,
            animated,
        };

        let scene = document.default_scene().or_else(|| document.scenes().next());
        let (name, children) = match scene {
            Some(scene) => (
                scene.name().map_or_else(|| "Scene".to_string(), sanitize_name),
                scene.nodes().map(|node| builder.build(&node)).collect(),
            ),
            None => ("Scene".to_string(), Vec::new()),
        };

        let animations = document
            .animations()
            .map(|animation| AnimationClip {
                name: animation
                    .name()
                    .map_or_else(|| format!("animation_{}", animation.index()), String::from),
                channels: animation.channels().count(),
            })
            .collect();

        let mut materials: Vec<String> = Vec::new();
        for name in document.materials().filter_map(|material| material.name()) {
            if !materials.iter().any(|known| known == name) {
                materials.push(name.to_string());
            }
        }

        Self {
            name,
            children,
            animations,
            materials,
        }
    }

    /// Depth-first walk over every object
    pub fn walk(&self) -> impl Iterator<Item = &SceneNode> {
        let mut stack: Vec<&SceneNode> = self.children.iter().rev().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

impl Builder {
    fn build(&mut self, node: &gltf::Node<'_>) -> SceneNode {
        let index = node.index();
        let base_name = node
            .name()
            .map(sanitize_name)
            .filter(|name| !name.is_empty())
            .or_else(|| {
                node.mesh()
                    .filter(|mesh| mesh.primitives().count() == 1)
                    .and_then(|mesh| mesh.name().map(sanitize_name))
                    .filter(|name| !name.is_empty())
            })
            .unwrap_or_else(|| format!("Node_{index}"));
        let name = self.names.unique(&base_name);

        let mut attachments: Vec<SceneNode> = Vec::new();

        if let Some(mesh) = node.mesh() {
            let skinned = node.skin().is_some();
            let mut primitives: Vec<NodeKind> = mesh
                .primitives()
                .map(|primitive| {
                    let mesh_ref = MeshRef {
                        mesh: mesh.index(),
                        primitive: primitive.index(),
                        mesh_name: mesh.name().map(String::from),
                        material: primitive.material().name().map(String::from),
                        morph_targets: primitive.morph_targets().count(),
                        vertex_count: primitive
                            .get(&gltf::Semantic::Positions)
                            .map(|accessor| accessor.count()),
                    };
                    if skinned {
                        NodeKind::SkinnedMesh(mesh_ref)
                    } else {
                        NodeKind::Mesh(mesh_ref)
                    }
                })
                .collect();

            if primitives.len() == 1 {
                attachments.push(leaf(String::new(), primitives.remove(0)));
            } else {
                let prefix = mesh.name().map(sanitize_name).unwrap_or_else(|| name.clone());
                let children = primitives
                    .into_iter()
                    .map(|kind| leaf(self.names.unique(&prefix), kind))
                    .collect();
                attachments.push(SceneNode {
                    children,
                    ..leaf(String::new(), NodeKind::Group)
                });
            }
        }

        if let Some(camera) = node.camera() {
            let info = match camera.projection() {
                Projection::Perspective(p) => CameraInfo::Perspective {
                    yfov: p.yfov(),
                    znear: p.znear(),
                    zfar: p.zfar(),
                    aspect_ratio: p.aspect_ratio(),
                },
                Projection::Orthographic(o) => CameraInfo::Orthographic {
                    xmag: o.xmag(),
                    ymag: o.ymag(),
                    znear: o.znear(),
                    zfar: o.zfar(),
                },
            };
            attachments.push(leaf(String::new(), NodeKind::Camera(info)));
        }

        if let Some(light) = node.light() {
            let kind = match light.kind() {
                GltfLightKind::Directional => LightKind::Directional,
                GltfLightKind::Point => LightKind::Point,
                GltfLightKind::Spot {
                    inner_cone_angle,
                    outer_cone_angle,
                } => LightKind::Spot {
                    inner_cone_angle,
                    outer_cone_angle,
                },
            };
            attachments.push(leaf(
                String::new(),
                NodeKind::Light(LightInfo {
                    kind,
                    color: light.color(),
                    intensity: light.intensity(),
                    range: light.range(),
                }),
            ));
        }

        let mut object = match attachments.len() {
            0 if self.bones.contains(&index) => leaf(String::new(), NodeKind::Bone),
            0 => leaf(String::new(), NodeKind::Object3D),
            1 => attachments.remove(0),
            _ => {
                for attachment in &mut attachments {
                    attachment.name = self.names.unique(&name);
                }
                SceneNode {
                    children: attachments,
                    ..leaf(String::new(), NodeKind::Group)
                }
            }
        };

        object.name = name;
        object.transform = Transform::from_node(node);
        object.animated = self.animated.contains(&index);
        object.extras = node
            .extras()
            .as_ref()
            .and_then(|raw| serde_json::from_str(raw.get()).ok());

        for child in node.children() {
            let built = self.build(&child);
            object.children.push(built);
        }

        object
    }
}

fn leaf(name: String, kind: NodeKind) -> SceneNode {
    SceneNode {
        name,
        kind,
        transform: Transform::IDENTITY,
        extras: None,
        animated: false,
        children: Vec::new(),
    }
}
