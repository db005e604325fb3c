//! Cross-module scenarios run against fake embedding providers.

mod annotations;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::embeddings::{EmbeddingError, EmbeddingProvider};

/// Embeds a sentence by looking up its first word.
pub struct KeywordProvider;

impl KeywordProvider {
    fn vector(keyword: &str) -> Vec<f32> {
        match keyword {
            "Alpha" => vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            "Bravo" => vec![0.95, 0.31, 0.0, 0.0, 0.0, 0.0],
            "Charlie" => vec![0.3, 0.0, 0.95, 0.0, 0.0, 0.0],
            "Delta" => vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            "Echo" => vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            "Foxtrot" => vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            _ => vec![0.0; 6],
        }
    }
}

impl EmbeddingProvider for KeywordProvider {
    fn embed(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(sentences
            .iter()
            .map(|s| Self::vector(s.split_whitespace().next().unwrap_or("")))
            .collect())
    }
}

/// A sentence long enough to never be merged with its neighbours.
pub fn padded(keyword: &str) -> String {
    format!("{keyword} {}.", "word ".repeat(24).trim_end())
}

/// Two paragraphs: A, B and C, then D, E and F.
pub fn scenario_paragraphs() -> Vec<String> {
    vec![
        ["Alpha", "Bravo", "Charlie"].map(padded).join(" "),
        ["Delta", "Echo", "Foxtrot"].map(padded).join(" "),
    ]
}

/// Defaults with a span budget large enough to keep A and B together.
pub fn scenario_config() -> Config {
    let mut config = Config::default();
    config.heatmap.max_span_len = 1000;
    config
}

/// Counts how providers are created, used and disposed.
#[derive(Default)]
pub struct Counters {
    pub created: AtomicUsize,
    pub disposed: AtomicUsize,
}

impl Counters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }
}

/// Fails every embedding call while `failing` is set, otherwise behaves like [`KeywordProvider`].
pub struct FlakyProvider {
    pub failing: bool,
    pub counters: Arc<Counters>,
}

impl EmbeddingProvider for FlakyProvider {
    fn embed(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if self.failing {
            return Err(EmbeddingError::EmbeddingFailed("session lost".to_string()));
        }
        KeywordProvider.embed(sentences)
    }

    fn dispose(&self) {
        self.counters.disposed.fetch_add(1, Ordering::SeqCst);
    }
}
