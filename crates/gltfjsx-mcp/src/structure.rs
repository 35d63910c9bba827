//! Structure extraction

use std::path::{Path, PathBuf};

use gltfjsx_core::{GltfStructureLoader, SceneStructure};
use tokio::sync::oneshot;

use crate::error::ToolError;

pub type StructureCallback = Box<dyn FnOnce(gltfjsx_core::Result<SceneStructure>) + Send>;

/// A callback-style structure reader
pub trait StructureDecoder: Send + Sync {
    fn parse(&self, data: Vec<u8>, path: PathBuf, callback: StructureCallback);
}

impl StructureDecoder for GltfStructureLoader {
    fn parse(&self, data: Vec<u8>, path: PathBuf, callback: StructureCallback) {
        GltfStructureLoader::parse(self, data, path, callback);
    }
}

/// Read the object hierarchy of a model file's bytes
pub async fn extract_structure(
    decoder: &dyn StructureDecoder,
    data: Vec<u8>,
    path: &Path,
) -> Result<SceneStructure, ToolError> {
    let (tx, rx) = oneshot::channel();
    decoder.parse(
        data,
        path.to_path_buf(),
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );

    let decode_error = |reason: String| ToolError::Decode {
        path: path.to_path_buf(),
        reason,
    };
    match rx.await {
        Ok(Ok(structure)) => Ok(structure),
        Ok(Err(e)) => Err(decode_error(e.to_string())),
        Err(_) => Err(decode_error("structure reader finished without a result".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drops its callback without calling it
    struct Silent;

    impl StructureDecoder for Silent {
        fn parse(&self, _: Vec<u8>, _: PathBuf, _: StructureCallback) {}
    }

    /// Reports from another thread, after a delay
    struct Late;

    impl StructureDecoder for Late {
        fn parse(&self, _: Vec<u8>, _: PathBuf, callback: StructureCallback) {
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(20));
                callback(Err(gltfjsx_core::Error::Integrity("late failure".into())));
            });
        }
    }

    #[tokio::test]
    async fn test_extract() {
        let json = br#"{
            "asset": { "version": "2.0" },
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "name": "Chair" }]
        }"#;
        let structure = extract_structure(&GltfStructureLoader::new(), json.to_vec(), Path::new("/c.gltf"))
            .await
            .expect("extracts");
        assert_eq!(structure.scene.children[0].name, "Chair");
    }

    #[tokio::test]
    async fn test_extract_failure_names_path() {
        let result = extract_structure(&GltfStructureLoader::new(), b"{".to_vec(), Path::new("/c.gltf")).await;
        let message = result.map(|_| ()).err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("/c.gltf"));
    }

    #[tokio::test]
    async fn test_dropped_callback() {
        let result = extract_structure(&Silent, Vec::new(), Path::new("/m/x.glb")).await;
        match result {
            Err(ToolError::Decode { path, reason }) => {
                assert_eq!(path, Path::new("/m/x.glb"));
                assert!(reason.contains("without a result"));
            }
            other => panic!("expected a decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_callback_from_another_thread() {
        let result = extract_structure(&Late, Vec::new(), Path::new("/m/x.glb")).await;
        match result {
            Err(ToolError::Decode { reason, .. }) => assert!(reason.contains("late failure")),
            other => panic!("expected a decode error, got {other:?}"),
        }
    }
}
