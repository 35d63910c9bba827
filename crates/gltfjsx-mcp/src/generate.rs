//! JSX generation orchestration
//!
//! Runs the engine on a blocking thread with its console silenced, then
//! adapts the generated text for use in a modern TypeScript project.

use std::sync::Arc;

use gltfjsx_core::{JsxOutput, Model, ParseOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::suppress::run_suppressed;

/// Header prepended to every generated component
pub const HEADER: &str = "/* eslint-disable */";

/// Note added for models without animation clips
pub const NO_ANIMATIONS_NOTE: &str =
    "No animations found in the model. Remove them from the type declaration if present.";

const STDLIB_GLTF_IMPORT: &str = "import { GLTF } from 'three-stdlib'";
const PUBLIC_GLTF_IMPORT: &str = "import { GLTF } from 'three/examples/jsm/loaders/GLTFLoader.js'";

/// Something that turns a decoded model into component source
pub trait JsxEngine: Send + Sync {
    fn parse(&self, model: &Model, options: &ParseOptions) -> gltfjsx_core::Result<JsxOutput>;
}

/// The `gltfjsx-core` generator
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreEngine;

impl JsxEngine for CoreEngine {
    fn parse(&self, model: &Model, options: &ParseOptions) -> gltfjsx_core::Result<JsxOutput> {
        gltfjsx_core::parse(model, options)
    }
}

/// Generation options as callers send them; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub types: Option<bool>,
    pub keepnames: Option<bool>,
    pub keepgroups: Option<bool>,
    pub bones: Option<bool>,
    pub meta: Option<bool>,
    pub shadows: Option<bool>,
    pub precision: Option<f64>,
    pub instance: Option<bool>,
    pub instanceall: Option<bool>,
    pub exportdefault: Option<bool>,
    pub resolution: Option<f64>,
    pub keepmeshes: Option<bool>,
    pub keepmaterials: Option<bool>,
    pub format: Option<String>,
    pub simplify: Option<bool>,
    pub ratio: Option<f64>,
    pub error: Option<f64>,
}

impl GenerationOptions {
    /// Engine options: defaults overridden by whatever is set, with the
    /// engine's own console output always off.
    pub fn to_parse_options(&self) -> ParseOptions {
        let mut options = ParseOptions::default();
        let flags = [
            (self.types, &mut options.types),
            (self.keepnames, &mut options.keepnames),
            (self.keepgroups, &mut options.keepgroups),
            (self.bones, &mut options.bones),
            (self.meta, &mut options.meta),
            (self.shadows, &mut options.shadows),
            (self.instance, &mut options.instance),
            (self.instanceall, &mut options.instanceall),
            (self.exportdefault, &mut options.exportdefault),
            (self.keepmeshes, &mut options.keepmeshes),
            (self.keepmaterials, &mut options.keepmaterials),
            (self.simplify, &mut options.simplify),
        ];
        for (value, slot) in flags {
            if let Some(value) = value {
                *slot = value;
            }
        }

        if let Some(precision) = self.precision {
            options.precision = precision.clamp(0.0, 16.0).round() as usize;
        }
        if let Some(resolution) = self.resolution {
            options.resolution = resolution.clamp(0.0, f64::from(u32::MAX)).round() as u32;
        }
        if let Some(format) = &self.format {
            options.format.clone_from(format);
        }
        if let Some(ratio) = self.ratio {
            options.ratio = ratio;
        }
        if let Some(error) = self.error {
            options.error = error;
        }

        options.console = false;
        options.debug = false;
        options
    }
}

/// Post-processed generator output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub source: String,
    pub animation_count: usize,
    /// Advisory notes for whoever uses the source
    pub notes: Vec<String>,
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Engine(#[from] gltfjsx_core::Error),

    #[error("the engine printed its output instead of returning it")]
    NoSource,

    #[error("generation task failed: {0}")]
    Task(String),
}

/// Generate a component for `model`, consuming it
pub async fn generate(
    engine: Arc<dyn JsxEngine>,
    model: Model,
    options: &GenerationOptions,
) -> Result<GenerationResult, GenerationError> {
    let parse_options = options.to_parse_options();
    let types = parse_options.types;
    let animation_count = model.animation_count();

    let output = tokio::task::spawn_blocking(move || {
        run_suppressed(|| engine.parse(&model, &parse_options))
    })
    .await
    .map_err(|e| GenerationError::Task(e.to_string()))??;

    let JsxOutput::Source(source) = output else {
        return Err(GenerationError::NoSource);
    };

    let mut notes = Vec::new();
    if animation_count == 0 {
        notes.push(NO_ANIMATIONS_NOTE.to_string());
    }

    Ok(GenerationResult {
        source: post_process(&source, types),
        animation_count,
        notes,
    })
}

/// Apply the header, `JSX` import and `GLTF` import rewrites
pub fn post_process(source: &str, types: bool) -> String {
    let mut text = format!("{HEADER}\n{source}");
    if types {
        text = with_jsx_import(&text);
    }
    text.replace(STDLIB_GLTF_IMPORT, PUBLIC_GLTF_IMPORT)
}

/// Make the first `react` default import also import `JSX`
fn with_jsx_import(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + 9);
    let mut done = false;
    for line in source.split_inclusive('\n') {
        if !done {
            if let Some(rewritten) = react_import_with_jsx(line) {
                out.push_str(&rewritten);
                done = true;
                continue;
            }
        }
        out.push_str(line);
    }
    out
}

fn react_import_with_jsx(line: &str) -> Option<String> {
    let (body, ending) = match line.strip_suffix('\n') {
        Some(body) => (body, "\n"),
        None => (line, ""),
    };
    let rest = body.trim_end().strip_prefix("import React")?;
    let (clause, module) = rest.split_once(" from ")?;
    if !matches!(module.trim_end_matches(';'), "'react'" | "\"react\"") {
        return None;
    }

    let clause = clause.trim();
    let members = if clause.is_empty() {
        vec!["JSX"]
    } else {
        let list = clause
            .strip_prefix(',')?
            .trim()
            .strip_prefix('{')?
            .strip_suffix('}')?;
        let mut members: Vec<&str> = list.split(',').map(str::trim).filter(|m| !m.is_empty()).collect();
        if members.contains(&"JSX") {
            return Some(line.to_string());
        }
        members.push("JSX");
        members
    };
    Some(format!("import React, {{ {} }} from {module}{ending}", members.join(", ")))
}
