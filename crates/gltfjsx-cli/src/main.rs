//! gltfjsx CLI - Turn GLTF/GLB models into React Three Fiber components

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gltfjsx_core::loader::DracoLoader;
use gltfjsx_core::structure::read_document;
use gltfjsx_core::{JsxOutput, Model, ParseOptions, SceneStructure};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gltfjsx")]
#[command(about = "Turn GLTF/GLB models into React Three Fiber components", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a JSX component from a model
    Jsx {
        /// GLTF or GLB file
        model: PathBuf,

        /// Output file (.jsx or .tsx); prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        flags: JsxFlags,
    },

    /// Print the object hierarchy of a model as JSON
    Structure {
        /// GLTF or GLB file
        model: PathBuf,
    },
}

#[derive(Args)]
#[allow(clippy::struct_excessive_bools)]
struct JsxFlags {
    /// Add TypeScript definitions
    #[arg(short, long)]
    types: bool,

    /// Keep original names
    #[arg(short, long)]
    keepnames: bool,

    /// Keep (empty) groups, disable pruning
    #[arg(short = 'K', long)]
    keepgroups: bool,

    /// Lay out bones declaratively
    #[arg(short, long)]
    bones: bool,

    /// Include metadata (as userData)
    #[arg(short, long)]
    meta: bool,

    /// Let meshes cast and receive shadows
    #[arg(short, long)]
    shadows: bool,

    /// Prettier printWidth
    #[arg(short = 'w', long, default_value = "120")]
    printwidth: usize,

    /// Number of fractional digits
    #[arg(short, long, default_value = "3")]
    precision: usize,

    /// Draco binary path
    #[arg(short, long)]
    draco: Option<String>,

    /// Directory the model is served from
    #[arg(short, long)]
    root: Option<String>,

    /// Instance re-occurring geometry
    #[arg(short, long)]
    instance: bool,

    /// Instance every geometry
    #[arg(short = 'I', long)]
    instanceall: bool,

    /// Use a default export
    #[arg(short = 'E', long)]
    exportdefault: bool,

    /// Texture resolution (transform pipeline only)
    #[arg(short = 'R', long, default_value = "1024")]
    resolution: u32,

    /// Do not join compatible meshes (transform pipeline only)
    #[arg(short = 'j', long)]
    keepmeshes: bool,

    /// Do not palette join materials (transform pipeline only)
    #[arg(short = 'M', long)]
    keepmaterials: bool,

    /// Texture format (transform pipeline only)
    #[arg(short, long, default_value = "webp")]
    format: String,

    /// Mesh simplification (transform pipeline only)
    #[arg(short = 'S', long)]
    simplify: bool,

    /// Simplifier ratio (transform pipeline only)
    #[arg(long, default_value = "0")]
    ratio: f64,

    /// Simplifier error threshold (transform pipeline only)
    #[arg(long, default_value = "0.0001")]
    error: f64,

    /// Log JSX to the console instead of writing it
    #[arg(short, long)]
    console: bool,

    /// Debug output
    #[arg(short = 'D', long)]
    debug: bool,
}

impl JsxFlags {
    fn into_options(self) -> ParseOptions {
        ParseOptions {
            types: self.types,
            keepnames: self.keepnames,
            keepgroups: self.keepgroups,
            bones: self.bones,
            meta: self.meta,
            shadows: self.shadows,
            printwidth: self.printwidth,
            precision: self.precision,
            draco: self.draco,
            root: self.root,
            instance: self.instance,
            instanceall: self.instanceall,
            exportdefault: self.exportdefault,
            resolution: self.resolution,
            keepmeshes: self.keepmeshes,
            keepmaterials: self.keepmaterials,
            format: self.format,
            simplify: self.simplify,
            ratio: self.ratio,
            error: self.error,
            console: self.console,
            debug: self.debug,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Jsx {
            model,
            output,
            flags,
        } => {
            run_jsx(&model, output.as_deref(), flags.into_options())?;
        }
        Commands::Structure { model } => {
            run_structure(&model)?;
        }
    }

    Ok(())
}

fn run_jsx(path: &Path, output: Option<&Path>, mut options: ParseOptions) -> Result<()> {
    // A .tsx target implies type definitions
    if output.is_some_and(|out| out.extension().is_some_and(|ext| ext == "tsx")) {
        options.types = true;
    }

    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let draco = DracoLoader::new();
    let model = Model::decode(&data, path, Some(&draco))
        .with_context(|| format!("Failed to load {}", path.display()))?;

    let jsx = match gltfjsx_core::parse(&model, &options)? {
        JsxOutput::Source(jsx) => jsx,
        JsxOutput::Printed => return Ok(()),
    };

    match output {
        Some(out) => {
            std::fs::write(out, jsx).with_context(|| format!("Failed to write {}", out.display()))?;
            eprintln!("Wrote {}", out.display());
        }
        None => print!("{jsx}"),
    }
    Ok(())
}

fn run_structure(path: &Path) -> Result<()> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let document = read_document(&data).with_context(|| format!("Failed to parse {}", path.display()))?;
    let structure = SceneStructure::from_document(&document);
    println!("{}", serde_json::to_string_pretty(&structure)?);
    Ok(())
}
