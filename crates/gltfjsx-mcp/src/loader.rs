//! Model loading
//!
//! The engine's loader reports through callbacks on its own thread. [`load`]
//! turns one callback pair into a single-resolution future.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gltfjsx_core::{DracoLoader, GltfLoader, Model};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::ToolError;

pub type LoadCallback = Box<dyn FnOnce(Model) + Send>;
pub type ErrorCallback = Box<dyn FnOnce(gltfjsx_core::Error) + Send>;

/// A callback-style model decoder
pub trait ModelDecoder: Send + Sync {
    /// Decode `data`, then call at most one of the callbacks
    fn parse(&self, data: Vec<u8>, path: PathBuf, on_load: LoadCallback, on_error: ErrorCallback);
}

impl ModelDecoder for GltfLoader {
    fn parse(&self, data: Vec<u8>, path: PathBuf, on_load: LoadCallback, on_error: ErrorCallback) {
        GltfLoader::parse(self, data, path, on_load, on_error);
    }
}

/// The engine loader with Draco support at the public decoder location
pub fn default_decoder() -> GltfLoader {
    let mut loader = GltfLoader::new();
    loader.set_draco_loader(DracoLoader::new());
    loader
}

/// Decode a model file's bytes.
///
/// The first callback to fire decides the outcome. A decoder that drops both
/// callbacks without calling either yields [`ToolError::Decode`].
pub async fn load(decoder: &dyn ModelDecoder, data: Vec<u8>, path: &Path) -> Result<Model, ToolError> {
    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let err_tx = Arc::clone(&tx);

    decoder.parse(
        data,
        path.to_path_buf(),
        Box::new(move |model| {
            if let Some(tx) = tx.lock().take() {
                let _ = tx.send(Ok(model));
            }
        }),
        Box::new(move |error| {
            if let Some(tx) = err_tx.lock().take() {
                let _ = tx.send(Err(error));
            }
        }),
    );

    let decode_error = |reason: String| ToolError::Decode {
        path: path.to_path_buf(),
        reason,
    };
    match rx.await {
        Ok(Ok(model)) => Ok(model),
        Ok(Err(e)) => Err(decode_error(e.to_string())),
        Err(_) => Err(decode_error("decoder finished without a result".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY: &[u8] = br#"{ "asset": { "version": "2.0" } }"#;

    /// Calls both callbacks, error first
    struct Eager;

    impl ModelDecoder for Eager {
        fn parse(&self, data: Vec<u8>, path: PathBuf, on_load: LoadCallback, on_error: ErrorCallback) {
            on_error(gltfjsx_core::Error::Integrity("first".into()));
            if let Ok(model) = Model::decode(&data, &path, None) {
                on_load(model);
            }
        }
    }

    /// Never calls back
    struct Silent;

    impl ModelDecoder for Silent {
        fn parse(&self, _: Vec<u8>, _: PathBuf, _: LoadCallback, _: ErrorCallback) {}
    }

    #[tokio::test]
    async fn test_load_with_engine() {
        let model = load(&default_decoder(), EMPTY.to_vec(), Path::new("/m/empty.gltf"))
            .await
            .expect("loads");
        assert_eq!(model.animation_count(), 0);
    }

    #[tokio::test]
    async fn test_decode_failure() {
        let result = load(&default_decoder(), b"not a model".to_vec(), Path::new("/m/bad.glb")).await;
        assert!(matches!(result, Err(ToolError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_first_callback_wins() {
        let result = load(&Eager, EMPTY.to_vec(), Path::new("")).await;
        match result {
            Err(ToolError::Decode { reason, .. }) => assert!(reason.contains("first")),
            other => panic!("expected the first outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dropped_callbacks() {
        let result = load(&Silent, EMPTY.to_vec(), Path::new("/m/x.glb")).await;
        assert!(matches!(result, Err(ToolError::Decode { .. })));
    }
}
