//! Embedding provider backed by fastembed.
//!
//! - Model download into `<cache_dir>/models` on first use
//! - Dimension probe at construction
//! - Batched sentence embedding

use std::path::PathBuf;
use std::sync::Mutex;

use ::fastembed::{InitOptions, TextEmbedding};

use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::errors::EmbeddingError;

/// Wrapper around fastembed's TextEmbedding model.
/// Uses a Mutex because fastembed's embed() requires &mut self.
pub struct FastEmbedProvider {
    model: Mutex<Option<TextEmbedding>>,
    model_name: String,
    dimensions: usize,
    batch_size: usize,
}

impl FastEmbedProvider {
    /// Load the configured model, downloading it into `cache_dir/models` if needed.
    pub fn new(config: &EmbeddingConfig, cache_dir: PathBuf) -> Result<Self, EmbeddingError> {
        let model_enum = Self::parse_model_name(&config.model)?;

        let models_dir = cache_dir.join("models");
        std::fs::create_dir_all(&models_dir).map_err(|e| {
            EmbeddingError::InitFailed(format!("Failed to create models directory: {}", e))
        })?;

        let options = InitOptions::new(model_enum)
            .with_cache_dir(models_dir)
            .with_show_download_progress(config.show_download_progress);

        let mut model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

        let dimensions = Self::probe_dimensions(&mut model)?;
        log::info!(
            "Loaded embedding model '{}' ({} dimensions)",
            config.model,
            dimensions
        );

        Ok(Self {
            model: Mutex::new(Some(model)),
            model_name: config.model.clone(),
            dimensions,
            batch_size: config.batch_size,
        })
    }

    pub fn name(&self) -> &str {
        &self.model_name
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Parse model name string to fastembed enum.
    fn parse_model_name(name: &str) -> Result<::fastembed::EmbeddingModel, EmbeddingError> {
        match name.to_lowercase().as_str() {
            "all-minilm-l6-v2" | "allminiml6v2" => Ok(::fastembed::EmbeddingModel::AllMiniLML6V2),
            "all-minilm-l6-v2-q" | "allminiml6v2q" => {
                Ok(::fastembed::EmbeddingModel::AllMiniLML6V2Q)
            }
            "bge-small-en-v1.5" | "bgesmallenv15" => Ok(::fastembed::EmbeddingModel::BGESmallENV15),
            "bge-small-en-v1.5-q" | "bgesmallenv15q" => {
                Ok(::fastembed::EmbeddingModel::BGESmallENV15Q)
            }
            "bge-base-en-v1.5" | "bgebaseenv15" => Ok(::fastembed::EmbeddingModel::BGEBaseENV15),
            "bge-base-en-v1.5-q" | "bgebaseenv15q" => {
                Ok(::fastembed::EmbeddingModel::BGEBaseENV15Q)
            }
            _ => Err(EmbeddingError::InvalidModel(format!(
                "Unknown model: {}. Supported models: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5 (add -q suffix for quantized)",
                name
            ))),
        }
    }

    fn probe_dimensions(model: &mut TextEmbedding) -> Result<usize, EmbeddingError> {
        let test_embeddings = model
            .embed(vec!["test"], None)
            .map_err(|e| EmbeddingError::InitFailed(format!("Failed to probe dimensions: {}", e)))?;

        test_embeddings
            .first()
            .map(|v| v.len())
            .ok_or_else(|| EmbeddingError::InitFailed("Model returned no embedding".to_string()))
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if sentences.is_empty() {
            return Ok(vec![]);
        }

        let mut guard = self.model.lock().map_err(|e| {
            EmbeddingError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
        })?;
        let model = guard.as_mut().ok_or_else(|| {
            EmbeddingError::EmbeddingFailed(format!("model '{}' was disposed", self.model_name))
        })?;

        model
            .embed(sentences.to_vec(), Some(self.batch_size))
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))
    }

    fn dispose(&self) {
        if let Ok(mut guard) = self.model.lock() {
            if guard.take().is_some() {
                log::debug!("Disposed embedding model '{}'", self.model_name);
            }
        }
    }
}
