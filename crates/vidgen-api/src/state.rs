//! Application state.

use std::sync::Arc;

use vidgen_genai::{GenerationClient, GenerationConfig};
use vidgen_media::{StageExecutor, StageTimeouts};
use vidgen_models::EncodingProfile;
use vidgen_pipeline::{ArtifactRegistry, LogNotifier, Pipeline};
use vidgen_storage::{DocumentWriter, StorageClient};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<Pipeline>,
    pub generator: Arc<GenerationClient>,
    pub registry: Arc<ArtifactRegistry>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig) -> std::io::Result<Self> {
        let http = reqwest::Client::new();

        let stages = StageExecutor::new(EncodingProfile::default(), StageTimeouts::default());
        let generator = Arc::new(GenerationClient::new(
            http.clone(),
            GenerationConfig::new(&config.minimax_api_key),
        ));
        let store = StorageClient::new(http.clone(), &config.firebase_storage_bucket);
        let events = DocumentWriter::new(http, &config.firebase_project_id);
        let registry = Arc::new(ArtifactRegistry::new(&config.scratch_dir)?);

        let pipeline = Arc::new(Pipeline::new(
            Arc::new(stages),
            Arc::clone(&generator) as _,
            Arc::new(store),
            Arc::new(events),
            Arc::new(LogNotifier),
            Arc::clone(&registry),
        ));

        Ok(Self {
            config,
            pipeline,
            generator,
            registry,
        })
    }
}
