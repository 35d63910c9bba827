//! JSX generation
//!
//! Turns a decoded [`Model`] into the source of a React Three Fiber component
//! laid out the way gltfjsx lays it out: optional TypeScript declarations, an
//! optional instancing context, the component itself and a preload call.
//!
//! Generation reports progress on the engine [`console`] channels. Callers
//! that must keep those channels quiet (a stdio protocol server, for one)
//! are expected to silence them around [`parse`].

mod format;
mod printer;

use std::collections::{BTreeMap, BTreeSet};

use crate::console;
use crate::model::Model;
use crate::options::ParseOptions;
use crate::scene::{MeshRef, NodeKind, SceneGraph, SceneNode};
use crate::Result;

/// Outcome of a generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsxOutput {
    /// Generated component source
    Source(String),
    /// The source went to the log channel instead (`console` option)
    Printed,
}

impl JsxOutput {
    /// The generated text, if it was returned rather than printed
    pub fn into_source(self) -> Option<String> {
        match self {
            JsxOutput::Source(source) => Some(source),
            JsxOutput::Printed => None,
        }
    }
}

/// Generate a component for `model`
pub fn parse(model: &Model, options: &ParseOptions) -> Result<JsxOutput> {
    let graph = SceneGraph::from_document(model.document());

    console::info(&format!(
        "Generating JSX for {} ({} objects, {} animations)",
        model.file_name(),
        graph.walk().count(),
        graph.animations.len()
    ));

    let scenes = model.document().scenes().count();
    if scenes > 1 {
        console::warn(&format!(
            "{scenes} scenes found, only '{}' is converted",
            graph.name
        ));
    }

    if options.debug {
        let buffers = model.buffers();
        console::debug(&format!(
            "{} buffers, {} bytes",
            buffers.len(),
            buffers.iter().map(Vec::len).sum::<usize>()
        ));
        for setting in options.inert_settings() {
            console::debug(&format!(
                "'{setting}' only applies to the transform pipeline and is ignored"
            ));
        }
    }

    // Animation tracks bind by name, so animated models keep every name.
    let keep_names = options.keepnames || !graph.animations.is_empty();

    let mut tree = graph.clone();
    if !options.keepgroups {
        let children = std::mem::take(&mut tree.children);
        tree.children = prune(children, keep_names, options);
    }

    let instances = Instances::plan(&tree, options);
    if options.debug && !instances.is_empty() {
        console::debug(&format!("Instancing {} geometries", instances.entries().len()));
    }

    let source = printer::print(&printer::Context {
        model,
        options,
        graph: &graph,
        tree: &tree,
        instances: &instances,
        keep_names,
    })?;

    if options.console {
        console::log(&source);
        return Ok(JsxOutput::Printed);
    }
    Ok(JsxOutput::Source(source))
}

/// Drop empty containers and hoist the children of containers that do
/// nothing.
fn prune(nodes: Vec<SceneNode>, keep_names: bool, options: &ParseOptions) -> Vec<SceneNode> {
    let mut kept = Vec::with_capacity(nodes.len());
    for mut node in nodes {
        node.children = prune(std::mem::take(&mut node.children), keep_names, options);

        if node.kind.is_container() && !node.animated {
            if node.children.is_empty() {
                if options.debug {
                    console::debug(&format!("Removed empty group {}", node.name));
                }
                continue;
            }
            let has_meta = options.meta && node.extras.is_some();
            if node.transform.is_identity() && !keep_names && !has_meta {
                if options.debug {
                    console::debug(&format!("Flattened group {}", node.name));
                }
                kept.append(&mut node.children);
                continue;
            }
        }
        kept.push(node);
    }
    kept
}

/// Which mesh primitives are drawn through a shared `Merged` instance
#[derive(Debug, Default)]
pub(crate) struct Instances {
    by_mesh: BTreeMap<(usize, usize), String>,
    /// Component name and the node whose geometry backs it
    entries: Vec<(String, String)>,
}

impl Instances {
    fn plan(tree: &SceneGraph, options: &ParseOptions) -> Self {
        let mut plan = Self::default();
        if !options.instance && !options.instanceall {
            return plan;
        }

        let mut counts: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        for node in tree.walk() {
            if let NodeKind::Mesh(mesh) = &node.kind {
                *counts.entry((mesh.mesh, mesh.primitive)).or_default() += 1;
            }
        }

        let mut used = BTreeSet::new();
        for node in tree.walk() {
            let NodeKind::Mesh(mesh) = &node.kind else {
                continue;
            };
            let key = (mesh.mesh, mesh.primitive);
            let repeated = counts.get(&key).copied().unwrap_or(0) > 1;
            if plan.by_mesh.contains_key(&key) || !(options.instanceall || repeated) {
                continue;
            }

            let base = format::identifier(&node.name);
            let mut component = base.clone();
            let mut suffix = 1;
            while !used.insert(component.clone()) {
                component = format!("{base}{suffix}");
                suffix += 1;
            }
            plan.by_mesh.insert(key, component.clone());
            plan.entries.push((component, node.name.clone()));
        }
        plan
    }

    pub(crate) fn component(&self, mesh: &MeshRef) -> Option<&str> {
        self.by_mesh.get(&(mesh.mesh, mesh.primitive)).map(String::as_str)
    }

    pub(crate) fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
