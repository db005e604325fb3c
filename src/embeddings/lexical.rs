//! Hashed bag-of-words embeddings.
//!
//! Each term is hashed into one of `dimensions` buckets and counted; the
//! resulting vector is L2-normalized. Similar wording gives similar vectors,
//! which is enough for TextRank to find central sentences without a model.

use std::hash::{Hash, Hasher};

use super::EmbeddingProvider;
use crate::errors::EmbeddingError;

const DEFAULT_DIMENSIONS: usize = 512;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being",
    "in", "on", "at", "to", "for", "of", "with", "by", "from", "as",
    "and", "or", "but", "not", "no", "so", "if", "then", "it", "its",
    "this", "that", "these", "those", "he", "she", "they", "we", "you",
];

#[derive(Debug, Clone)]
pub struct LexicalProvider {
    dimensions: usize,
}

impl Default for LexicalProvider {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl LexicalProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_one(&self, sentence: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for term in tokenize(sentence) {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            term.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

/// Lowercase terms, without 1-char terms and common stop words.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|s| s.to_lowercase())
        .filter(|s| s.chars().count() > 1 && !STOP_WORDS.contains(&s.as_str()))
        .collect()
}

impl EmbeddingProvider for LexicalProvider {
    fn embed(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(sentences.iter().map(|s| self.embed_one(s)).collect())
    }
}
