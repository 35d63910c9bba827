//! JSX generation options

/// Options controlling [`parse`](crate::jsx::parse)
///
/// Field names follow the gltfjsx command-line flags.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Add TypeScript definitions to the output
    pub types: bool,
    /// Keep original node names (`name` attributes)
    pub keepnames: bool,
    /// Keep empty groups, disable pruning of empty transforms
    pub keepgroups: bool,
    /// Lay out bones declaratively
    pub bones: bool,
    /// Include glTF extras as `userData`
    pub meta: bool,
    /// Let meshes cast and receive shadows
    pub shadows: bool,
    /// Line width at which element attributes wrap
    pub printwidth: usize,
    /// Fractional digits for numbers
    pub precision: usize,
    /// Draco decoder path passed to `useGLTF`
    pub draco: Option<String>,
    /// Directory the asset is served from
    pub root: Option<String>,
    /// Instance re-occurring geometry
    pub instance: bool,
    /// Instance every geometry
    pub instanceall: bool,
    /// Use a default export for the component
    pub exportdefault: bool,
    /// Texture resize resolution (transform pipeline)
    pub resolution: u32,
    /// Do not join compatible meshes (transform pipeline)
    pub keepmeshes: bool,
    /// Do not palette-join materials (transform pipeline)
    pub keepmaterials: bool,
    /// Output texture format (transform pipeline)
    pub format: String,
    /// Enable mesh simplification (transform pipeline)
    pub simplify: bool,
    /// Simplifier ratio (transform pipeline)
    pub ratio: f64,
    /// Simplifier error threshold (transform pipeline)
    pub error: f64,
    /// Print the JSX to the console instead of returning it
    pub console: bool,
    /// Verbose diagnostics on the debug channel
    pub debug: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            types: false,
            keepnames: false,
            keepgroups: false,
            bones: false,
            meta: false,
            shadows: false,
            printwidth: 120,
            precision: 3,
            draco: None,
            root: None,
            instance: false,
            instanceall: false,
            exportdefault: false,
            resolution: 1024,
            keepmeshes: false,
            keepmaterials: false,
            format: "webp".to_string(),
            simplify: false,
            ratio: 0.0,
            error: 0.0001,
            console: false,
            debug: false,
        }
    }
}

impl ParseOptions {
    /// Transform-pipeline settings that differ from their defaults.
    ///
    /// The engine does not run the transform pipeline, so these have no
    /// effect on the output.
    pub fn inert_settings(&self) -> Vec<&'static str> {
        let defaults = Self::default();
        let mut inert = Vec::new();
        if self.resolution != defaults.resolution {
            inert.push("resolution");
        }
        if self.keepmeshes {
            inert.push("keepmeshes");
        }
        if self.keepmaterials {
            inert.push("keepmaterials");
        }
        if self.format != defaults.format {
            inert.push("format");
        }
        if self.simplify {
            inert.push("simplify");
        }
        if (self.ratio - defaults.ratio).abs() > f64::EPSILON {
            inert.push("ratio");
        }
        if (self.error - defaults.error).abs() > f64::EPSILON {
            inert.push("error");
        }
        inert
    }
}
