//! Paragraph to sentence segmentation.
//!
//! Boundaries are found on the raw paragraph text: a `.`, `?` or `!` followed
//! by whitespace and then a letter. Each sentence is whitespace-normalized
//! afterwards, and runs of short sentences are merged so downstream
//! similarity and anchoring work on substantial fragments.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Sentence;
use crate::embeddings::normalize_whitespace;

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.?!]\s+").expect("sentence boundary regex is valid"));

/// Split raw paragraph text into trimmed, whitespace-normalized sentences.
pub fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut raw = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(paragraph) {
        let next_is_letter = paragraph[m.end()..]
            .chars()
            .next()
            .is_some_and(char::is_alphabetic);
        if !next_is_letter {
            continue;
        }
        // terminators are single-byte, keep them with the sentence
        raw.push(&paragraph[start..m.start() + 1]);
        start = m.end();
    }
    raw.push(&paragraph[start..]);

    raw.into_iter()
        .map(normalize_whitespace)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Append a sentence to its predecessor while either of them is shorter than `threshold` chars.
pub fn combine_short_sentences(sentences: Vec<String>, threshold: usize) -> Vec<String> {
    let mut combined: Vec<String> = Vec::with_capacity(sentences.len());
    for sentence in sentences {
        match combined.last_mut() {
            Some(last)
                if last.chars().count() < threshold || sentence.chars().count() < threshold =>
            {
                last.push(' ');
                last.push_str(&sentence);
            }
            _ => combined.push(sentence),
        }
    }
    combined
}

/// Segment every paragraph, tagging each sentence with its paragraph index.
///
/// Paragraphs without any text contribute no sentences.
pub fn segment_paragraphs<S: AsRef<str>>(paragraphs: &[S], min_sentence_len: usize) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    for (index, paragraph) in paragraphs.iter().enumerate() {
        let split = split_sentences(paragraph.as_ref());
        for text in combine_short_sentences(split, min_sentence_len) {
            sentences.push(Sentence::new(text, index));
        }
    }

    log::debug!(
        "Split {} sentences across {} paragraphs",
        sentences.len(),
        paragraphs.len()
    );
    sentences
}
