//! Sentence heatmap computation.
//!
//! # Pipeline
//!
//! - `segment`: paragraphs to sentences, short sentences merged
//! - `similarity`: cosine similarity matrix from embeddings
//! - `textrank`: salience score per sentence
//! - `groups`: neighbouring sentences merged into length-bounded spans
//! - `suppress`: redundant high-scoring spans demoted below the threshold
//!
//! The result is grouped back by paragraph index so callers can anchor each
//! paragraph's spans in the document.

pub mod groups;
pub mod segment;
pub mod similarity;
pub mod suppress;
pub mod textrank;

use std::sync::Mutex;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::{Config, HeatmapConfig};
use crate::embeddings::{embed_batched, EmbeddingProvider, ProviderFactory};
use crate::errors::HeatmapError;
use groups::{group_sentences, Span};
use similarity::{average_embeddings, SimilarityMatrix};
use suppress::suppress_scores;
use textrank::text_rank;

/// A segmented sentence with its salience score and source paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    pub text: String,
    pub score: f32,
    pub paragraph: usize,
}

impl Sentence {
    pub fn new(text: String, paragraph: usize) -> Self {
        Self {
            text,
            score: 0.0,
            paragraph,
        }
    }
}

/// One heatmap entry: a span of text and its final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSentence {
    pub sentence: String,
    pub score: f32,
}

/// Ranked sentences grouped by paragraph index.
pub type Heatmap = Vec<Vec<RankedSentence>>;

/// A heatmap entry at or above the display threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub highlight: String,
    pub paragraph_index: usize,
    pub sentence_index: usize,
    pub score: f32,
}

/// Segment paragraphs and drop sentences past `max_sentences`.
pub fn prepare_sentences<S: AsRef<str>>(paragraphs: &[S], config: &HeatmapConfig) -> Vec<Sentence> {
    let mut sentences = segment::segment_paragraphs(paragraphs, config.min_sentence_len);
    if sentences.len() > config.max_sentences {
        log::debug!(
            "Truncating {} sentences to {}",
            sentences.len(),
            config.max_sentences
        );
        sentences.truncate(config.max_sentences);
    }
    sentences
}

/// Score, group and suppress already-embedded sentences.
///
/// `embeddings[i]` must belong to `sentences[i]`.
pub fn rank_embedded(
    paragraph_count: usize,
    mut sentences: Vec<Sentence>,
    embeddings: &[Vec<f32>],
    config: &Config,
) -> Heatmap {
    let settings = &config.heatmap;

    let mut matrix = SimilarityMatrix::from_embeddings(embeddings);
    matrix.scale(settings.similarity_scale);

    let scores = text_rank(&matrix, settings.max_iterations, settings.tolerance);
    for (sentence, score) in sentences.iter_mut().zip(scores) {
        sentence.score = score;
    }

    let mut spans = group_sentences(&sentences, &matrix, settings);

    let span_embeddings: Vec<Vec<f32>> = spans
        .iter()
        .map(|span| average_embeddings(&embeddings[span.members.clone()]))
        .collect();
    let mut span_matrix = SimilarityMatrix::from_embeddings(&span_embeddings);
    span_matrix.scale(settings.similarity_scale);

    if settings.rescore_spans {
        let rescored = text_rank(&span_matrix, settings.max_iterations, settings.tolerance);
        for (span, score) in spans.iter_mut().zip(rescored) {
            span.score = score;
        }
    }

    let mut span_scores: Vec<f32> = spans.iter().map(|s| s.score).collect();
    suppress_scores(&mut span_scores, &span_matrix, &config.suppression);
    for (span, score) in spans.iter_mut().zip(span_scores) {
        span.score = score;
    }

    group_by_paragraph(paragraph_count, spans)
}

/// Re-associate spans with their paragraph. Paragraphs without spans get an empty list.
pub fn group_by_paragraph(paragraph_count: usize, spans: Vec<Span>) -> Heatmap {
    let mut grouped: Heatmap = vec![Vec::new(); paragraph_count];
    for span in spans {
        if span.paragraph >= grouped.len() {
            grouped.resize(span.paragraph + 1, Vec::new());
        }
        grouped[span.paragraph].push(RankedSentence {
            sentence: span.text,
            score: span.score,
        });
    }
    grouped
}

/// Compute a heatmap with a single embedding attempt.
pub fn get_heatmap<S: AsRef<str>>(
    provider: &dyn EmbeddingProvider,
    paragraphs: &[S],
    config: &Config,
) -> Result<Heatmap, HeatmapError> {
    let sentences = prepare_sentences(paragraphs, &config.heatmap);
    if sentences.is_empty() {
        return Ok(vec![Vec::new(); paragraphs.len()]);
    }

    let texts: Vec<String> = sentences.iter().map(|s| s.text.clone()).collect();
    let embeddings = embed_batched(provider, &texts, config.embedding.batch_size)?;
    Ok(rank_embedded(paragraphs.len(), sentences, &embeddings, config))
}

/// Flatten a heatmap into the entries scoring at least `threshold`.
pub fn top_highlights(heatmap: &Heatmap, threshold: f32) -> Vec<KeyPoint> {
    heatmap
        .iter()
        .enumerate()
        .flat_map(|(paragraph_index, ranked)| {
            ranked
                .iter()
                .enumerate()
                .filter(|(_, sentence)| sentence.score >= threshold)
                .map(move |(sentence_index, sentence)| KeyPoint {
                    highlight: sentence.sentence.clone(),
                    paragraph_index,
                    sentence_index,
                    score: sentence.score,
                })
        })
        .collect()
}

/// Heatmap computation with a lazily created, replaceable embedding provider.
///
/// A failed embedding call disposes the provider and retries once with a
/// fresh one from the factory.
pub struct HeatmapService {
    factory: Box<dyn ProviderFactory>,
    config: Config,
    /// Lazily-created provider; `None` until first use or after a reset.
    provider: Mutex<Option<Box<dyn EmbeddingProvider>>>,
}

impl HeatmapService {
    pub fn new(factory: Box<dyn ProviderFactory>, config: Config) -> Self {
        Self {
            factory,
            config,
            provider: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check if a provider is currently loaded.
    pub fn is_initialized(&self) -> bool {
        self.provider
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Eagerly create the provider instead of waiting for the first heatmap.
    pub fn initialize(&self) -> Result<(), HeatmapError> {
        let mut guard = self.lock_provider()?;
        if guard.is_none() {
            *guard = Some(self.factory.create()?);
        }
        Ok(())
    }

    /// Dispose the current provider, if any.
    pub fn dispose(&self) {
        if let Ok(mut guard) = self.provider.lock() {
            if let Some(provider) = guard.take() {
                provider.dispose();
            }
        }
    }

    /// Rank the sentences of `paragraphs`, grouped by paragraph index.
    pub fn get_heatmap<S: AsRef<str>>(&self, paragraphs: &[S]) -> Result<Heatmap, HeatmapError> {
        let start = Instant::now();

        let sentences = prepare_sentences(paragraphs, &self.config.heatmap);
        if sentences.is_empty() {
            log::debug!("No sentences in {} paragraphs", paragraphs.len());
            return Ok(vec![Vec::new(); paragraphs.len()]);
        }
        let sentence_count = sentences.len();

        let texts: Vec<String> = sentences.iter().map(|s| s.text.clone()).collect();
        let embeddings = self.embed_with_retry(&texts)?;
        let heatmap = rank_embedded(paragraphs.len(), sentences, &embeddings, &self.config);

        log::info!(
            "Computed heatmap for {} sentences in {} paragraphs in {}ms",
            sentence_count,
            paragraphs.len(),
            start.elapsed().as_millis()
        );
        Ok(heatmap)
    }

    fn embed_with_retry(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, HeatmapError> {
        match self.embed_once(texts) {
            Ok(embeddings) => Ok(embeddings),
            Err(HeatmapError::Embedding(err)) => {
                log::warn!("Embedding failed, reloading provider: {}", err);
                self.dispose();
                self.embed_once(texts).inspect_err(|err| {
                    log::error!("Embedding failed after provider reload: {}", err);
                })
            }
            Err(err) => Err(err),
        }
    }

    fn embed_once(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, HeatmapError> {
        let mut guard = self.lock_provider()?;
        if guard.is_none() {
            *guard = Some(self.factory.create()?);
        }
        let provider = guard
            .as_deref()
            .ok_or_else(|| HeatmapError::Internal("provider missing after init".to_string()))?;

        Ok(embed_batched(provider, texts, self.config.embedding.batch_size)?)
    }

    fn lock_provider(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Option<Box<dyn EmbeddingProvider>>>, HeatmapError> {
        self.provider
            .lock()
            .map_err(|e| HeatmapError::Internal(format!("Lock poisoned: {}", e)))
    }
}
