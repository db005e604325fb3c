//! Extractive article heatmaps and DOM highlight anchoring.
//!
//! The pipeline splits article paragraphs into sentences, ranks them with
//! TextRank over sentence-embedding similarity, merges and suppresses
//! neighbouring candidates, and finally maps the surviving sentences back onto
//! ranges in the parsed HTML document so they can be stored as annotations.

pub mod annotations;
pub mod cli;
pub mod config;
pub mod dom;
pub mod embeddings;
pub mod errors;
pub mod heatmap;
#[cfg(test)]
mod tests;

pub use annotations::{
    article_id_for_url, create_annotations, create_annotations_with, normalize_article_url,
    Annotation,
};
pub use dom::{anchor_paragraph_sentences, list_paragraphs, LocatedParagraph, ParagraphSet, TextRange};
pub use embeddings::{EmbeddingProvider, ProviderFactory};
pub use errors::{ConfigError, EmbeddingError, HeatmapError, LocatorError};
pub use heatmap::{get_heatmap, top_highlights, HeatmapService, KeyPoint, RankedSentence};
