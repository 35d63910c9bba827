//! Callback-style model loading
//!
//! [`GltfLoader::parse`] decodes a model on a dedicated thread and reports the
//! outcome through exactly one of two callbacks, mirroring the loader API of
//! the JavaScript tooling this engine stands in for.

use std::path::PathBuf;
use std::thread;

use crate::model::Model;
use crate::Error;

/// Location of the Draco decoder used for compressed meshes
pub const DEFAULT_DRACO_DECODER_PATH: &str = "https://www.gstatic.com/draco/v1/decoders/";

/// Draco decoder configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DracoLoader {
    decoder_path: String,
}

impl DracoLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_decoder_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.decoder_path = path.into();
        self
    }

    pub fn decoder_path(&self) -> &str {
        &self.decoder_path
    }
}

impl Default for DracoLoader {
    fn default() -> Self {
        Self {
            decoder_path: DEFAULT_DRACO_DECODER_PATH.to_string(),
        }
    }
}

/// Full model loader: parses the document and resolves every buffer
#[derive(Debug, Clone, Default)]
pub struct GltfLoader {
    draco: Option<DracoLoader>,
}

impl GltfLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a Draco decoder so compressed models can be loaded
    pub fn set_draco_loader(&mut self, draco: DracoLoader) -> &mut Self {
        self.draco = Some(draco);
        self
    }

    pub fn draco_loader(&self) -> Option<&DracoLoader> {
        self.draco.as_ref()
    }

    /// Decode `data` in the background.
    ///
    /// `path` is where the data came from and is used to resolve external
    /// buffers. Exactly one of `on_load` / `on_error` is called, from the
    /// decoding thread. If the thread cannot be started both callbacks are
    /// dropped without being called.
    pub fn parse<L, E>(&self, data: Vec<u8>, path: impl Into<PathBuf>, on_load: L, on_error: E)
    where
        L: FnOnce(Model) + Send + 'static,
        E: FnOnce(Error) + Send + 'static,
    {
        let draco = self.draco.clone();
        let path = path.into();

        let spawned = thread::Builder::new()
            .name("gltf-decode".to_string())
            .spawn(move || match Model::decode(&data, &path, draco.as_ref()) {
                Ok(model) => on_load(model),
                Err(e) => on_error(e),
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to start decoder thread: {}", e);
        }
    }
}
