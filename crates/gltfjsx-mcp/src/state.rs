//! Server state
//!
//! Everything a tool call needs: the working directory, the activity log, and
//! the engine entry points. The engine sits behind trait objects so tests can
//! swap in decoders or generators with specific behavior.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use gltfjsx_core::GltfStructureLoader;

use crate::activity_log::ActivityLog;
use crate::generate::{CoreEngine, JsxEngine};
use crate::loader::{ModelDecoder, default_decoder};
use crate::structure::StructureDecoder;

/// Cheap-to-clone handle to the server's shared state
#[derive(Clone)]
pub struct ServerState {
    working_dir: PathBuf,
    log: ActivityLog,
    decoder: Arc<dyn ModelDecoder>,
    extractor: Arc<dyn StructureDecoder>,
    engine: Arc<dyn JsxEngine>,
}

impl ServerState {
    /// State rooted at the process working directory
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
        Ok(Self::with_working_dir(cwd))
    }

    /// State rooted at `dir`, using the `gltfjsx-core` engine
    pub fn with_working_dir(dir: impl Into<PathBuf>) -> Self {
        let working_dir = dir.into();
        Self {
            log: ActivityLog::in_dir(&working_dir),
            working_dir,
            decoder: Arc::new(default_decoder()),
            extractor: Arc::new(GltfStructureLoader::new()),
            engine: Arc::new(CoreEngine),
        }
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn ModelDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn StructureDecoder>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_engine(mut self, engine: Arc<dyn JsxEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn decoder(&self) -> &dyn ModelDecoder {
        self.decoder.as_ref()
    }

    pub fn extractor(&self) -> &dyn StructureDecoder {
        self.extractor.as_ref()
    }

    pub fn engine(&self) -> Arc<dyn JsxEngine> {
        Arc::clone(&self.engine)
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("working_dir", &self.working_dir)
            .field("log", &self.log.path())
            .finish_non_exhaustive()
    }
}
