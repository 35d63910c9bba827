//! # gltfjsx Core
//!
//! GLTF/GLB decoding and React Three Fiber JSX generation.
//!
//! The engine mirrors the JavaScript gltfjsx toolchain closely enough that
//! generated components look the same: [`GltfLoader`] decodes a model,
//! [`GltfStructureLoader`] reads only its object hierarchy, and [`parse`]
//! turns a decoded [`Model`] into component source.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gltfjsx_core::prelude::*;
//!
//! let data = std::fs::read("chair.glb")?;
//! let model = Model::decode(&data, "chair.glb".as_ref(), None)?;
//! let options = ParseOptions { types: true, ..ParseOptions::default() };
//! if let JsxOutput::Source(jsx) = parse(&model, &options)? {
//!     println!("{jsx}");
//! }
//! ```
//!
//! ## Console
//!
//! The engine reports progress on the channels in [`console`], which print to
//! stdout and stderr by default. Redirect or silence them when those streams
//! carry something else.

pub mod console;
pub mod jsx;
pub mod loader;
pub mod model;
pub mod options;
pub mod scene;
pub mod structure;

mod error;

pub use error::{Error, Result};
pub use jsx::{JsxOutput, parse};
pub use loader::{DracoLoader, GltfLoader};
pub use model::Model;
pub use options::ParseOptions;
pub use structure::{GltfStructureLoader, SceneStructure};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::jsx::{JsxOutput, parse};
    pub use crate::loader::{DracoLoader, GltfLoader};
    pub use crate::model::Model;
    pub use crate::options::ParseOptions;
    pub use crate::structure::{GltfStructureLoader, SceneStructure};
    pub use crate::{Error, Result};
}
