//! Source emission

use std::fmt::Write as _;

use serde_json::Value;

use super::format;
use super::Instances;
use crate::model::Model;
use crate::options::ParseOptions;
use crate::scene::{CameraInfo, LightKind, NodeKind, SceneGraph, SceneNode, Transform};
use crate::structure::spot_penumbra;
use crate::Result;

/// Everything the printer needs from a generation run
pub(crate) struct Context<'a> {
    pub model: &'a Model,
    pub options: &'a ParseOptions,
    /// Unpruned scene, used for type declarations
    pub graph: &'a SceneGraph,
    /// Pruned scene, used for elements
    pub tree: &'a SceneGraph,
    pub instances: &'a Instances,
    pub keep_names: bool,
}

impl Context<'_> {
    fn animated(&self) -> bool {
        !self.graph.animations.is_empty()
    }

    fn url(&self) -> String {
        let mut root = self.options.root.clone().unwrap_or_else(|| "/".to_string());
        if !root.ends_with('/') {
            root.push('/');
        }
        format!("{root}{}", self.model.file_name())
    }

    /// Arguments shared by `useGLTF` and `useGLTF.preload`.
    ///
    /// A Draco-compressed model falls back to the decoder it was loaded with.
    fn use_gltf_args(&self) -> String {
        let url = format::string_literal(&self.url());
        match self.options.draco.as_deref().or_else(|| self.model.draco_decoder()) {
            Some(draco) => format!("{url}, {}", format::string_literal(draco)),
            None => url,
        }
    }
}

pub(crate) fn print(ctx: &Context<'_>) -> Result<String> {
    let mut out = String::new();
    header(&mut out, ctx)?;
    imports(&mut out, ctx)?;
    if ctx.options.types {
        declarations(&mut out, ctx)?;
    }
    if !ctx.instances.is_empty() {
        instances(&mut out, ctx)?;
    }
    component(&mut out, ctx)?;
    writeln!(out)?;
    writeln!(out, "useGLTF.preload({})", ctx.use_gltf_args())?;
    Ok(out)
}

fn header(out: &mut String, ctx: &Context<'_>) -> Result<()> {
    writeln!(out, "/*")?;
    writeln!(out, "Auto-generated by: gltfjsx-core v{}", env!("CARGO_PKG_VERSION"))?;
    if let Some(generator) = ctx.model.generator() {
        writeln!(out, "Generator: {generator}")?;
    }
    writeln!(out, "*/")?;
    Ok(())
}

fn imports(out: &mut String, ctx: &Context<'_>) -> Result<()> {
    writeln!(out)?;
    if ctx.options.types {
        writeln!(out, "import * as THREE from 'three'")?;
    }
    writeln!(out, "import React from 'react'")?;

    let mut drei = vec!["useGLTF"];
    let camera = |perspective: bool| {
        ctx.tree.walk().any(|node| match node.kind {
            NodeKind::Camera(CameraInfo::Perspective { .. }) => perspective,
            NodeKind::Camera(CameraInfo::Orthographic { .. }) => !perspective,
            _ => false,
        })
    };
    if camera(true) {
        drei.push("PerspectiveCamera");
    }
    if camera(false) {
        drei.push("OrthographicCamera");
    }
    if !ctx.instances.is_empty() {
        drei.push("Merged");
    }
    if ctx.animated() {
        drei.push("useAnimations");
    }
    writeln!(out, "import {{ {} }} from '@react-three/drei'", drei.join(", "))?;

    if ctx.options.types {
        writeln!(out, "import {{ GLTF }} from 'three-stdlib'")?;
    }
    Ok(())
}

fn declarations(out: &mut String, ctx: &Context<'_>) -> Result<()> {
    writeln!(out)?;
    if ctx.animated() {
        let names: Vec<String> = ctx
            .graph
            .animations
            .iter()
            .map(|clip| format::string_literal(&clip.name))
            .collect();
        writeln!(out, "type ActionName = {}", names.join(" | "))?;
        writeln!(out)?;
        writeln!(out, "interface GLTFAction extends THREE.AnimationClip {{")?;
        writeln!(out, "  name: ActionName")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
    }

    let nodes: Vec<(&str, &str)> = ctx
        .graph
        .walk()
        .filter_map(|node| {
            let class = match node.kind {
                NodeKind::Mesh(_) => "THREE.Mesh",
                NodeKind::SkinnedMesh(_) => "THREE.SkinnedMesh",
                NodeKind::Bone => "THREE.Bone",
                _ => return None,
            };
            Some((node.name.as_str(), class))
        })
        .collect();
    let materials: Vec<(&str, &str)> = ctx
        .graph
        .materials
        .iter()
        .map(|name| (name.as_str(), "THREE.MeshStandardMaterial"))
        .collect();

    writeln!(out, "type GLTFResult = GLTF & {{")?;
    type_map(out, "nodes", &nodes)?;
    type_map(out, "materials", &materials)?;
    writeln!(out, "  animations: GLTFAction[]")?;
    writeln!(out, "}}")?;
    Ok(())
}

fn type_map(out: &mut String, field: &str, entries: &[(&str, &str)]) -> Result<()> {
    if entries.is_empty() {
        writeln!(out, "  {field}: {{}}")?;
        return Ok(());
    }
    writeln!(out, "  {field}: {{")?;
    for (name, class) in entries {
        writeln!(out, "    {}: {class}", format::property_key(name))?;
    }
    writeln!(out, "  }}")?;
    Ok(())
}

fn instances(out: &mut String, ctx: &Context<'_>) -> Result<()> {
    let types = ctx.options.types;
    writeln!(out)?;
    if types {
        writeln!(
            out,
            "type ContextType = Record<string, React.ForwardRefExoticComponent<JSX.IntrinsicElements['mesh']>>"
        )?;
        writeln!(out)?;
        writeln!(out, "const context = React.createContext({{}} as ContextType)")?;
    } else {
        writeln!(out, "const context = React.createContext()")?;
    }
    writeln!(out)?;

    let props = if types {
        "{ children, ...props }: JSX.IntrinsicElements['group']"
    } else {
        "{ children, ...props }"
    };
    writeln!(out, "export function Instances({props}) {{")?;
    writeln!(
        out,
        "  const {{ nodes }} = useGLTF({}){}",
        ctx.use_gltf_args(),
        if types { " as GLTFResult" } else { "" }
    )?;
    writeln!(out, "  const instances = React.useMemo(")?;
    writeln!(out, "    () => ({{")?;
    for (component, node) in ctx.instances.entries() {
        writeln!(out, "      {component}: {},", format::member("nodes", node))?;
    }
    writeln!(out, "    }}),")?;
    writeln!(out, "    [nodes]")?;
    writeln!(out, "  )")?;
    writeln!(out, "  return (")?;
    writeln!(out, "    <Merged meshes={{instances}} {{...props}}>")?;
    writeln!(
        out,
        "      {{({}) => <context.Provider value={{instances}} children={{children}} />}}",
        if types { "instances: ContextType" } else { "instances" }
    )?;
    writeln!(out, "    </Merged>")?;
    writeln!(out, "  )")?;
    writeln!(out, "}}")?;
    Ok(())
}

fn component(out: &mut String, ctx: &Context<'_>) -> Result<()> {
    let options = ctx.options;
    writeln!(out)?;
    writeln!(
        out,
        "export {}function Model(props{}) {{",
        if options.exportdefault { "default " } else { "" },
        if options.types { ": JSX.IntrinsicElements['group']" } else { "" }
    )?;

    let animated = ctx.animated();
    if animated {
        if options.types {
            writeln!(out, "  const group = React.useRef<THREE.Group>(null)")?;
        } else {
            writeln!(out, "  const group = React.useRef()")?;
        }
    }
    writeln!(
        out,
        "  const {{ nodes, materials{} }} = useGLTF({}){}",
        if animated { ", animations" } else { "" },
        ctx.use_gltf_args(),
        if options.types { " as GLTFResult" } else { "" }
    )?;
    if animated {
        writeln!(out, "  const {{ actions }} = useAnimations(animations, group)")?;
    }
    if !ctx.instances.is_empty() {
        writeln!(out, "  const instances = React.useContext(context)")?;
    }

    writeln!(out, "  return (")?;
    let mut root = Vec::new();
    if animated {
        root.push("ref={group}".to_string());
    }
    root.push("{...props}".to_string());
    root.push("dispose={null}".to_string());
    let children = &ctx.tree.children;
    open_tag(out, ctx, 2, "group", &root, children.is_empty())?;
    if !children.is_empty() {
        for child in children {
            element(out, ctx, child, 3)?;
        }
        writeln!(out, "    </group>")?;
    }
    writeln!(out, "  )")?;
    writeln!(out, "}}")?;
    Ok(())
}

fn element(out: &mut String, ctx: &Context<'_>, node: &SceneNode, depth: usize) -> Result<()> {
    let (tag, attrs, descend) = describe(ctx, node)?;
    let children: &[SceneNode] = if descend { &node.children } else { &[] };

    open_tag(out, ctx, depth, &tag, &attrs, children.is_empty())?;
    if !children.is_empty() {
        for child in children {
            element(out, ctx, child, depth + 1)?;
        }
        writeln!(out, "{}</{tag}>", indent(depth))?;
    }
    Ok(())
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

/// Write an opening (or self-closing) tag, one attribute per line when the
/// single-line form would exceed the print width.
fn open_tag(
    out: &mut String,
    ctx: &Context<'_>,
    depth: usize,
    tag: &str,
    attrs: &[String],
    self_closing: bool,
) -> Result<()> {
    let pad = indent(depth);
    let close = if self_closing { " />" } else { ">" };
    let line = if attrs.is_empty() {
        format!("{pad}<{tag}{close}")
    } else {
        format!("{pad}<{tag} {}{close}", attrs.join(" "))
    };

    if attrs.is_empty() || line.len() <= ctx.options.printwidth {
        writeln!(out, "{line}")?;
        return Ok(());
    }

    writeln!(out, "{pad}<{tag}")?;
    for attr in attrs {
        writeln!(out, "{pad}  {attr}")?;
    }
    writeln!(out, "{pad}{}", if self_closing { "/>" } else { ">" })?;
    Ok(())
}

/// Tag, attributes and whether children are written for one object
fn describe(ctx: &Context<'_>, node: &SceneNode) -> Result<(String, Vec<String>, bool)> {
    let options = ctx.options;
    let precision = options.precision;
    let num = |value: f32| format::number(value, precision);
    let object = format::member("nodes", &node.name);
    let name = format!("name=\"{}\"", format::attribute_text(&node.name));

    let mut attrs = Vec::new();
    if ctx.keep_names {
        attrs.push(name.clone());
    }

    let tag = match &node.kind {
        NodeKind::Object3D | NodeKind::Group => "group".to_string(),
        NodeKind::Mesh(mesh) => {
            if options.shadows {
                attrs.push("castShadow".to_string());
                attrs.push("receiveShadow".to_string());
            }
            match ctx.instances.component(mesh) {
                Some(component) => format!("instances.{component}"),
                None => {
                    attrs.push(format!("geometry={{{object}.geometry}}"));
                    attrs.push(material(&object, mesh.material.as_deref()));
                    if mesh.morph_targets > 0 {
                        attrs.extend(morph_targets(&object));
                    }
                    "mesh".to_string()
                }
            }
        }
        NodeKind::SkinnedMesh(mesh) => {
            if options.shadows {
                attrs.push("castShadow".to_string());
                attrs.push("receiveShadow".to_string());
            }
            attrs.push(format!("geometry={{{object}.geometry}}"));
            attrs.push(material(&object, mesh.material.as_deref()));
            attrs.push(format!("skeleton={{{object}.skeleton}}"));
            if mesh.morph_targets > 0 {
                attrs.extend(morph_targets(&object));
            }
            "skinnedMesh".to_string()
        }
        NodeKind::Bone if options.bones => {
            if !ctx.keep_names {
                attrs.push(name);
            }
            "bone".to_string()
        }
        // The bone object already carries its transform and descendants.
        NodeKind::Bone => {
            return Ok(("primitive".to_string(), vec![format!("object={{{object}}}")], false));
        }
        NodeKind::Camera(camera) => {
            attrs.push("makeDefault={false}".to_string());
            match *camera {
                CameraInfo::Perspective {
                    yfov, znear, zfar, ..
                } => {
                    if let Some(far) = zfar {
                        attrs.push(format!("far={{{}}}", num(far)));
                    }
                    attrs.push(format!("near={{{}}}", num(znear)));
                    attrs.push(format!("fov={{{}}}", num(yfov.to_degrees())));
                    "PerspectiveCamera".to_string()
                }
                CameraInfo::Orthographic {
                    xmag,
                    ymag,
                    znear,
                    zfar,
                } => {
                    attrs.push(format!("left={{{}}}", num(-xmag)));
                    attrs.push(format!("right={{{}}}", num(xmag)));
                    attrs.push(format!("top={{{}}}", num(ymag)));
                    attrs.push(format!("bottom={{{}}}", num(-ymag)));
                    attrs.push(format!("near={{{}}}", num(znear)));
                    attrs.push(format!("far={{{}}}", num(zfar)));
                    "OrthographicCamera".to_string()
                }
            }
        }
        NodeKind::Light(light) => {
            attrs.push(format!("intensity={{{}}}", num(light.intensity)));
            if !matches!(light.kind, LightKind::Directional) {
                attrs.push("decay={2}".to_string());
                if let Some(range) = light.range {
                    attrs.push(format!("distance={{{}}}", num(range)));
                }
            }
            if light.color != [1.0, 1.0, 1.0] {
                attrs.push(format!("color=\"{}\"", format::hex_color(light.color)));
            }
            match light.kind {
                LightKind::Directional => "directionalLight".to_string(),
                LightKind::Point => "pointLight".to_string(),
                LightKind::Spot {
                    inner_cone_angle,
                    outer_cone_angle,
                } => {
                    attrs.push(format!("angle={{{}}}", num(outer_cone_angle)));
                    attrs.push(format!(
                        "penumbra={{{}}}",
                        num(spot_penumbra(inner_cone_angle, outer_cone_angle))
                    ));
                    "spotLight".to_string()
                }
            }
        }
    };

    transform(&node.transform, precision, &mut attrs);

    if options.meta {
        if let Some(Value::Object(map)) = &node.extras {
            if !map.is_empty() {
                attrs.push(format!("userData={{{}}}", serde_json::to_string(map)?));
            }
        }
    }

    Ok((tag, attrs, true))
}

fn material(object: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("material={{{}}}", format::member("materials", name)),
        None => format!("material={{{object}.material}}"),
    }
}

fn morph_targets(object: &str) -> [String; 2] {
    [
        format!("morphTargetDictionary={{{object}.morphTargetDictionary}}"),
        format!("morphTargetInfluences={{{object}.morphTargetInfluences}}"),
    ]
}

/// `position`, `rotation` and `scale` attributes that differ from identity
/// at the output precision
fn transform(transform: &Transform, precision: usize, attrs: &mut Vec<String>) {
    let rounded = |values: [f32; 3]| values.map(|v| format::number(v, precision));

    let position = transform.translation.to_array();
    if rounded(position).iter().any(|v| v != "0") {
        attrs.push(format!("position={{{}}}", format::vector(position, precision)));
    }

    let rotation = transform.euler().to_array();
    if rounded(rotation).iter().any(|v| v != "0") {
        attrs.push(format!("rotation={{{}}}", format::vector(rotation, precision)));
    }

    let scale = rounded(transform.scale.to_array());
    if scale.iter().any(|v| v != "1") {
        if scale[0] == scale[1] && scale[1] == scale[2] {
            attrs.push(format!("scale={{{}}}", scale[0]));
        } else {
            attrs.push(format!("scale={{[{}]}}", scale.join(", ")));
        }
    }
}
