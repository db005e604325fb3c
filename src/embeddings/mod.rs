//! Sentence embedding providers.
//!
//! The heatmap pipeline only sees the [`EmbeddingProvider`] trait; a
//! [`ProviderFactory`] builds providers so a failed one can be replaced with a
//! freshly initialized instance.
//!
//! - `fastembed_model`: local ONNX sentence encoder (default feature)
//! - `lexical`: hashed bag-of-words vectors, no model download

#[cfg(feature = "fastembed")]
mod fastembed_model;
mod lexical;

#[cfg(feature = "fastembed")]
pub use fastembed_model::FastEmbedProvider;
pub use crate::errors::EmbeddingError;
pub use lexical::LexicalProvider;

/// Maps a batch of sentences to fixed-length vectors.
///
/// Implementations must return exactly one vector per input sentence, in input order.
pub trait EmbeddingProvider: Send {
    fn embed(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Release model resources. The provider is not used after this call.
    fn dispose(&self) {}
}

/// Builds fresh embedding providers.
pub trait ProviderFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn EmbeddingProvider>, EmbeddingError>;
}

impl<F> ProviderFactory for F
where
    F: Fn() -> Result<Box<dyn EmbeddingProvider>, EmbeddingError> + Send + Sync,
{
    fn create(&self) -> Result<Box<dyn EmbeddingProvider>, EmbeddingError> {
        self()
    }
}

/// Collapse every whitespace run to a single space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Embed `sentences` in chunks of `batch_size`, checking the provider returned one vector per input.
pub fn embed_batched(
    provider: &dyn EmbeddingProvider,
    sentences: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut embeddings = Vec::with_capacity(sentences.len());
    for batch in sentences.chunks(batch_size.max(1)) {
        let batch: Vec<String> = batch.iter().map(|s| normalize_whitespace(s)).collect();
        let vectors = provider.embed(&batch)?;
        if vectors.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                got: vectors.len(),
            });
        }
        embeddings.extend(vectors);
    }
    Ok(embeddings)
}
