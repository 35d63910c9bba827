//! Decoded glTF models
//!
//! A [`Model`] is the in-memory result of decoding one GLTF/GLB file: the
//! parsed document plus every buffer it references, resolved to bytes. It is
//! deliberately not `Clone`; whoever decodes a model owns it until it is
//! dropped.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use gltf::json;

use crate::loader::DracoLoader;
use crate::{Error, Result};

/// Extension name for Draco mesh compression
pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Four-byte magic at the start of every binary glTF container
pub const GLB_MAGIC: &[u8; 4] = b"glTF";

/// A fully decoded glTF model
pub struct Model {
    document: gltf::Document,
    buffers: Vec<Vec<u8>>,
    source: PathBuf,
    draco_decoder: Option<String>,
}

impl Model {
    /// Decode a model from raw file bytes.
    ///
    /// `source` is the path the bytes were read from; its parent directory is
    /// used to resolve external buffer URIs. It may be empty, in which case
    /// only embedded buffers can be resolved.
    pub fn decode(data: &[u8], source: &Path, draco: Option<&DracoLoader>) -> Result<Self> {
        let gltf::Gltf { document, blob } = gltf::Gltf::from_slice_without_validation(data)?;

        check_document(document.as_json())?;

        let uses_draco = document.extensions_used().any(|ext| ext == DRACO_EXTENSION);
        let draco_decoder = match (uses_draco, draco) {
            (false, _) => None,
            (true, Some(loader)) => Some(loader.decoder_path().to_string()),
            (true, None) => {
                return Err(Error::Integrity(format!(
                    "{DRACO_EXTENSION} is used but no Draco decoder is configured"
                )));
            }
        };

        let base = source.parent().filter(|dir| !dir.as_os_str().is_empty());
        let buffers = materialize_buffers(&document, blob, base)?;

        tracing::debug!(
            source = %source.display(),
            buffers = buffers.len(),
            draco = uses_draco,
            "Decoded glTF model"
        );

        Ok(Self {
            document,
            buffers,
            source: source.to_path_buf(),
            draco_decoder,
        })
    }

    /// The parsed glTF document
    pub fn document(&self) -> &gltf::Document {
        &self.document
    }

    /// Resolved buffer contents, in document order
    pub fn buffers(&self) -> &[Vec<u8>] {
        &self.buffers
    }

    /// Path the model was loaded from (may be empty)
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// File name used when the generated component fetches the asset
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map_or_else(|| "model.glb".to_string(), |name| name.to_string_lossy().into_owned())
    }

    /// Number of animation clips in the model
    pub fn animation_count(&self) -> usize {
        self.document.animations().count()
    }

    /// Whether any primitive is Draco compressed
    pub fn uses_draco(&self) -> bool {
        self.draco_decoder.is_some()
    }

    /// Decoder location configured when the model was loaded, if it needed one
    pub fn draco_decoder(&self) -> Option<&str> {
        self.draco_decoder.as_deref()
    }

    /// `asset.generator` from the document, if present
    pub fn generator(&self) -> Option<&str> {
        self.document.as_json().asset.generator.as_deref()
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("source", &self.source)
            .field("nodes", &self.document.nodes().count())
            .field("meshes", &self.document.meshes().count())
            .field("animations", &self.animation_count())
            .field("buffers", &self.buffers.len())
            .finish()
    }
}

/// Deepest node hierarchy accepted.
///
/// Scene building and printing recurse once per level.
pub const MAX_NODE_DEPTH: usize = 256;

/// Run every check a parsed document must pass before anything walks it.
///
/// The document accessors in `gltf` assume a valid document and panic
/// otherwise.
pub(crate) fn check_document(root: &json::Root) -> Result<()> {
    check_integrity(root)?;
    validate_schema(root)?;
    check_cameras(root)
}

fn bounds(what: &str, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::Integrity(format!(
            "{what} references index {index}, but only {len} exist"
        )))
    }
}

/// Check what schema validation relies on or leaves out: the primitive
/// attribute indices it dereferences unchecked, and that the node hierarchy
/// is a forest no deeper than [`MAX_NODE_DEPTH`].
fn check_integrity(root: &json::Root) -> Result<()> {
    for (i, mesh) in root.meshes.iter().enumerate() {
        for primitive in &mesh.primitives {
            for accessor in primitive.attributes.values() {
                bounds(&format!("mesh {i}"), accessor.value(), root.accessors.len())?;
            }
        }
    }

    let node_count = root.nodes.len();
    let mut parents: Vec<Option<usize>> = vec![None; node_count];
    for (i, node) in root.nodes.iter().enumerate() {
        for child in node.children.iter().flatten() {
            let child = child.value();
            bounds(&format!("node {i}"), child, node_count)?;
            if child == i {
                return Err(Error::Integrity(format!("node {i} is its own child")));
            }
            if let Some(other) = parents[child].replace(i) {
                return Err(Error::Integrity(format!(
                    "node {child} has two parents ({other} and {i})"
                )));
            }
        }
    }

    check_depth(&parents)
}

#[derive(Clone, Copy)]
enum Depth {
    Unknown,
    Visiting,
    Known(usize),
}

/// Walk parent chains once, memoizing depths. Meeting a node that is still
/// being visited means the chain loops.
fn check_depth(parents: &[Option<usize>]) -> Result<()> {
    let mut depths = vec![Depth::Unknown; parents.len()];
    let mut chain = Vec::new();

    for start in 0..parents.len() {
        let mut current = Some(start);
        let mut depth = 0;
        while let Some(node) = current {
            match depths[node] {
                Depth::Unknown => {
                    depths[node] = Depth::Visiting;
                    chain.push(node);
                    current = parents[node];
                }
                Depth::Visiting => {
                    return Err(Error::Integrity(format!("node {node} is part of a cycle")));
                }
                Depth::Known(known) => {
                    depth = known;
                    current = None;
                }
            }
        }

        while let Some(node) = chain.pop() {
            depth += 1;
            if depth > MAX_NODE_DEPTH {
                return Err(Error::Integrity(format!(
                    "node {node} is nested {depth} levels deep, at most {MAX_NODE_DEPTH} are supported"
                )));
            }
            depths[node] = Depth::Known(depth);
        }
    }

    Ok(())
}

/// Run the glTF schema validation, minus the violations the engine copes with
fn validate_schema(root: &json::Root) -> Result<()> {
    use json::validation::Validate;

    let mut violations = Vec::new();
    root.validate(root, json::Path::new, &mut |path: &dyn Fn() -> json::Path, violation| {
        let path = path();
        if tolerated(&path, violation) {
            tracing::debug!(path = %path, "Ignoring glTF violation: {}", violation);
        } else {
            violations.push((path, violation));
        }
    });

    if violations.is_empty() {
        Ok(())
    } else {
        Err(gltf::Error::Validation(violations).into())
    }
}

/// Required extensions are never decoded here, only named. Accessors without
/// a buffer view are zero-filled in glTF 2.0 and are how Draco-compressed
/// attributes are declared.
fn tolerated(path: &json::Path, violation: json::validation::Error) -> bool {
    use json::validation::Error as Violation;

    let path = path.as_str();
    match violation {
        Violation::Unsupported => path.starts_with("extensionsRequired"),
        Violation::Missing => path.starts_with("accessors[") && path.ends_with(".bufferView"),
        _ => false,
    }
}

/// A camera must carry the projection its type names
fn check_cameras(root: &json::Root) -> Result<()> {
    use json::camera::Type;
    use json::validation::Checked;

    for (i, camera) in root.cameras.iter().enumerate() {
        let (projection, missing) = match camera.type_ {
            Checked::Valid(Type::Perspective) => ("perspective", camera.perspective.is_none()),
            Checked::Valid(Type::Orthographic) => ("orthographic", camera.orthographic.is_none()),
            Checked::Invalid => ("valid", true),
        };
        if missing {
            return Err(Error::Integrity(format!(
                "camera {i} has no {projection} projection"
            )));
        }
    }
    Ok(())
}

fn materialize_buffers(
    document: &gltf::Document,
    blob: Option<Vec<u8>>,
    base: Option<&Path>,
) -> Result<Vec<Vec<u8>>> {
    let mut blob = blob;
    let mut buffers = Vec::with_capacity(document.buffers().count());

    for buffer in document.buffers() {
        let index = buffer.index();
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => blob.take().ok_or_else(|| Error::Buffer {
                index,
                reason: "refers to the GLB binary chunk, which is missing".to_string(),
            })?,
            gltf::buffer::Source::Uri(uri) => resolve_uri(index, uri, base)?,
        };

        if data.len() < buffer.length() {
            return Err(Error::Buffer {
                index,
                reason: format!(
                    "declares {} bytes but only {} are available",
                    buffer.length(),
                    data.len()
                ),
            });
        }

        buffers.push(data);
    }

    Ok(buffers)
}

fn resolve_uri(index: usize, uri: &str, base: Option<&Path>) -> Result<Vec<u8>> {
    if let Some(rest) = uri.strip_prefix("data:") {
        let (header, payload) = rest.split_once(',').ok_or_else(|| Error::Buffer {
            index,
            reason: "malformed data URI".to_string(),
        })?;
        if !header.ends_with(";base64") {
            return Err(Error::Buffer {
                index,
                reason: "only base64 data URIs are supported".to_string(),
            });
        }
        return base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| Error::Buffer {
                index,
                reason: format!("invalid base64 payload: {e}"),
            });
    }

    if uri.contains("://") {
        return Err(Error::Buffer {
            index,
            reason: format!("remote buffer '{uri}' cannot be fetched"),
        });
    }

    let base = base.ok_or_else(|| Error::Buffer {
        index,
        reason: format!("external buffer '{uri}' needs the model's directory"),
    })?;

    std::fs::read(base.join(uri)).map_err(|e| Error::Buffer {
        index,
        reason: format!("cannot read '{uri}': {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r#"{
        "asset": { "version": "2.0", "generator": "unit test" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "Triangle", "mesh": 0 }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "accessors": [{ "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 1], "bufferView": 0 }],
        "bufferViews": [{ "buffer": 0, "byteLength": 4 }],
        "buffers": [{ "byteLength": 4, "uri": "data:application/octet-stream;base64,AAECAw==" }]
    }"#;

    #[test]
    fn test_decode_embedded_buffer() {
        let model = Model::decode(TRIANGLE.as_bytes(), Path::new("/models/tri.gltf"), None)
            .expect("triangle decodes");
        assert_eq!(model.buffers(), &[vec![0u8, 1, 2, 3]]);
        assert_eq!(model.file_name(), "tri.gltf");
        assert_eq!(model.generator(), Some("unit test"));
        assert_eq!(model.animation_count(), 0);
        assert!(!model.uses_draco());
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let json = TRIANGLE.replace(r#""buffers": [{ "byteLength": 4"#, r#""buffers": [{ "byteLength": 8"#);
        let err = Model::decode(json.as_bytes(), Path::new(""), None).unwrap_err();
        assert!(matches!(err, Error::Buffer { index: 0, .. }), "{err}");
    }

    #[test]
    fn test_external_buffer_resolves_next_to_model() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("tri.bin"), [9u8, 9, 9, 9]).expect("write bin");
        let json = TRIANGLE.replace("data:application/octet-stream;base64,AAECAw==", "tri.bin");

        let model = Model::decode(json.as_bytes(), &dir.path().join("tri.gltf"), None)
            .expect("external buffer resolves");
        assert_eq!(model.buffers()[0], vec![9u8, 9, 9, 9]);
    }

    #[test]
    fn test_out_of_range_mesh_is_rejected() {
        let json = TRIANGLE.replace(r#""mesh": 0"#, r#""mesh": 3"#);
        let err = Model::decode(json.as_bytes(), Path::new(""), None).unwrap_err();
        assert!(matches!(err, Error::Gltf(_)), "{err}");
        assert!(err.to_string().contains("nodes[0].mesh"), "{err}");
    }

    #[test]
    fn test_out_of_range_position_is_rejected() {
        let json = TRIANGLE.replace(r#""POSITION": 0"#, r#""POSITION": 5"#);
        let err = Model::decode(json.as_bytes(), Path::new(""), None).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)), "{err}");
    }

    #[test]
    fn test_missing_light_is_rejected() {
        let json = r#"{
            "asset": { "version": "2.0" },
            "extensionsUsed": ["KHR_lights_punctual"],
            "nodes": [{ "extensions": { "KHR_lights_punctual": { "light": 2 } } }]
        }"#;
        let err = Model::decode(json.as_bytes(), Path::new(""), None).unwrap_err();
        assert!(matches!(err, Error::Gltf(_)), "{err}");
    }

    #[test]
    fn test_unknown_light_type_is_rejected() {
        let json = r#"{
            "asset": { "version": "2.0" },
            "extensionsUsed": ["KHR_lights_punctual"],
            "extensions": { "KHR_lights_punctual": { "lights": [{ "type": "laser" }] } },
            "nodes": [{ "extensions": { "KHR_lights_punctual": { "light": 0 } } }]
        }"#;
        let err = Model::decode(json.as_bytes(), Path::new(""), None).unwrap_err();
        assert!(matches!(err, Error::Gltf(_)), "{err}");
    }

    #[test]
    fn test_camera_without_projection_is_rejected() {
        let json = r#"{
            "asset": { "version": "2.0" },
            "cameras": [{ "type": "perspective" }],
            "nodes": [{ "camera": 0 }]
        }"#;
        let err = Model::decode(json.as_bytes(), Path::new(""), None).unwrap_err();
        assert!(matches!(err, Error::Gltf(_)), "{err}");

        let mismatched = json.replace(
            r#"{ "type": "perspective" }"#,
            r#"{ "type": "perspective", "orthographic": { "xmag": 1, "ymag": 1, "znear": 0.1, "zfar": 10 } }"#,
        );
        let err = Model::decode(mismatched.as_bytes(), Path::new(""), None).unwrap_err();
        assert!(err.to_string().contains("camera 0 has no perspective projection"), "{err}");
    }

    #[test]
    fn test_position_needs_bounds() {
        let json = TRIANGLE.replace(r#", "min": [0, 0, 0], "max": [1, 1, 1]"#, "");
        let err = Model::decode(json.as_bytes(), Path::new(""), None).unwrap_err();
        assert!(err.to_string().contains("POSITION"), "{err}");
    }

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

    #[test]
    fn test_hierarchy_depth_limit() {
        let json = chain(MAX_NODE_DEPTH);
        assert!(Model::decode(json.as_bytes(), Path::new(""), None).is_ok());

        let json = chain(MAX_NODE_DEPTH + 1);
        let err = Model::decode(json.as_bytes(), Path::new(""), None).unwrap_err();
        assert!(err.to_string().contains("levels deep"), "{err}");
    }

    #[test]
    fn test_very_deep_hierarchy_is_rejected() {
        let json = chain(20_000);
        let err = Model::decode(json.as_bytes(), Path::new(""), None).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)), "{err}");
    }

    #[test]
    fn test_node_cycle_is_rejected() {
        let json = r#"{
            "asset": { "version": "2.0" },
            "nodes": [{ "children": [1] }, { "children": [0] }]
        }"#;
        let err = Model::decode(json.as_bytes(), Path::new(""), None).unwrap_err();
        assert!(err.to_string().contains("cycle"), "{err}");
    }

    #[test]
    fn test_draco_needs_decoder() {
        let json = r#"{
            "asset": { "version": "2.0" },
            "extensionsUsed": ["KHR_draco_mesh_compression"],
            "extensionsRequired": ["KHR_draco_mesh_compression"]
        }"#;
        assert!(Model::decode(json.as_bytes(), Path::new(""), None).is_err());

        let model = Model::decode(json.as_bytes(), Path::new(""), Some(&DracoLoader::default()))
            .expect("decoder configured");
        assert_eq!(model.draco_decoder(), Some(crate::loader::DEFAULT_DRACO_DECODER_PATH));
    }

    #[test]
    fn test_garbage_is_a_gltf_error() {
        let err = Model::decode(b"not a model", Path::new(""), None).unwrap_err();
        assert!(matches!(err, Error::Gltf(_)));
    }
}
