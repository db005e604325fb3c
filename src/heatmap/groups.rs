//! Merging neighbouring sentences into highlight spans.
//!
//! Adjacent sentences of one paragraph are grouped when they are very similar
//! or scored alike. Groups longer than the span budget are split by growing a
//! window outward from their best sentence and recursing on what is left on
//! either side.

use std::ops::Range;

use super::similarity::SimilarityMatrix;
use super::Sentence;
use crate::config::HeatmapConfig;

/// A run of contiguous sentences from one paragraph, highlighted as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    /// Member sentences joined by single spaces
    pub text: String,
    /// Highest member score
    pub score: f32,
    /// Paragraph of the first member
    pub paragraph: usize,
    /// Indices of the member sentences
    pub members: Range<usize>,
}

impl Span {
    fn from_members(sentences: &[Sentence], members: Range<usize>) -> Self {
        let slice = &sentences[members.clone()];
        Self {
            text: slice
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            score: slice
                .iter()
                .map(|s| s.score)
                .fold(f32::NEG_INFINITY, f32::max),
            paragraph: slice[0].paragraph,
            members,
        }
    }
}

/// Group `sentences` (already scored) into spans, splitting any group longer
/// than `config.max_span_len` chars.
pub fn group_sentences(
    sentences: &[Sentence],
    matrix: &SimilarityMatrix,
    config: &HeatmapConfig,
) -> Vec<Span> {
    let mut spans = Vec::new();
    if sentences.is_empty() {
        return spans;
    }

    let mut group_start = 0;
    for i in 1..sentences.len() {
        let (prev, current) = (&sentences[i - 1], &sentences[i]);
        let joins = current.paragraph == prev.paragraph
            && (matrix.get(i, i - 1) > config.group_similarity
                || (current.score - prev.score).abs() < config.group_score_delta);

        if !joins {
            split_group(sentences, group_start..i, config.max_span_len, &mut spans);
            group_start = i;
        }
    }
    split_group(
        sentences,
        group_start..sentences.len(),
        config.max_span_len,
        &mut spans,
    );

    spans
}

/// Emit spans for `group`, left to right, none longer than `max_len` unless
/// it is a single sentence.
fn split_group(sentences: &[Sentence], group: Range<usize>, max_len: usize, out: &mut Vec<Span>) {
    if group.is_empty() {
        return;
    }

    let char_len = |i: usize| sentences[i].text.chars().count();
    let score = |i: usize| sentences[i].score;

    // first index of the highest score
    let mut seed = group.start;
    for i in group.clone() {
        if score(i) > score(seed) {
            seed = i;
        }
    }

    let (mut start, mut end) = (seed, seed + 1);
    let mut len = char_len(seed);
    loop {
        let grow_back =
            start > group.start && (end >= group.end || score(start - 1) > score(end));
        let candidate = if grow_back {
            start - 1
        } else if end < group.end {
            end
        } else {
            break;
        };

        let grown = len + 1 + char_len(candidate);
        if grown > max_len {
            break;
        }
        len = grown;
        if grow_back {
            start -= 1;
        } else {
            end += 1;
        }
    }

    split_group(sentences, group.start..start, max_len, out);
    out.push(Span::from_members(sentences, start..end));
    split_group(sentences, end..group.end, max_len, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(len: usize, score: f32, paragraph: usize) -> Sentence {
        let mut text = "a".repeat(len.saturating_sub(1));
        text.push('.');
        Sentence {
            text,
            score,
            paragraph,
        }
    }

    fn uniform_matrix(n: usize, value: f32) -> SimilarityMatrix {
        SimilarityMatrix::from_rows(vec![vec![value; n]; n])
    }

    fn config(max_span_len: usize) -> HeatmapConfig {
        HeatmapConfig {
            max_span_len,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(group_sentences(&[], &uniform_matrix(0, 0.0), &config(200)).is_empty());
    }

    #[test]
    fn test_similar_neighbours_merge() {
        let sentences = vec![
            sentence(40, 0.1, 0),
            sentence(40, 0.9, 0),
            sentence(40, 0.5, 1),
        ];
        let spans = group_sentences(&sentences, &uniform_matrix(3, 0.8), &config(200));

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].members, 0..2);
        assert_eq!(spans[0].score, 0.9);
        assert_eq!(spans[0].text.chars().count(), 81);
        assert_eq!(spans[1].members, 2..3);
        assert_eq!(spans[1].paragraph, 1);
    }

    #[test]
    fn test_close_scores_merge_without_similarity() {
        let sentences = vec![
            sentence(40, 0.50, 0),
            sentence(40, 0.55, 0),
            sentence(40, 0.95, 0),
        ];
        let spans = group_sentences(&sentences, &uniform_matrix(3, 0.0), &config(200));
        let members: Vec<_> = spans.iter().map(|s| s.members.clone()).collect();
        assert_eq!(members, vec![0..2, 2..3]);
    }

    #[test]
    fn test_split_grows_from_best_sentence() {
        let sentences = vec![
            sentence(50, 0.1, 0),
            sentence(50, 0.2, 0),
            sentence(50, 0.9, 0),
            sentence(50, 0.8, 0),
            sentence(50, 0.3, 0),
        ];
        let spans = group_sentences(&sentences, &uniform_matrix(5, 0.9), &config(110));

        let members: Vec<_> = spans.iter().map(|s| s.members.clone()).collect();
        assert_eq!(members, vec![0..2, 2..4, 4..5]);
        let scores: Vec<f32> = spans.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![0.2, 0.9, 0.3]);
    }

    #[test]
    fn test_split_prefers_higher_scored_side() {
        let sentences = vec![
            sentence(50, 0.7, 0),
            sentence(50, 0.9, 0),
            sentence(50, 0.1, 0),
        ];
        let spans = group_sentences(&sentences, &uniform_matrix(3, 0.9), &config(110));
        assert_eq!(spans[0].members, 0..2);
        assert_eq!(spans[1].members, 2..3);
    }

    #[test]
    fn test_spans_respect_length_budget() {
        let lengths = [30, 120, 45, 260, 80, 10, 99, 150, 60, 5];
        let sentences: Vec<Sentence> = lengths
            .iter()
            .enumerate()
            .map(|(i, len)| sentence(*len, ((i * 7) % 10) as f32 / 10.0, i / 4))
            .collect();
        let n = sentences.len();

        for max_len in [50, 100, 200, 300] {
            let spans = group_sentences(&sentences, &uniform_matrix(n, 0.9), &config(max_len));

            let covered: Vec<usize> = spans.iter().flat_map(|s| s.members.clone()).collect();
            assert_eq!(covered, (0..n).collect::<Vec<_>>());

            for span in &spans {
                assert!(!span.members.is_empty());
                assert!(
                    span.text.chars().count() <= max_len || span.members.len() == 1,
                    "span {:?} exceeds {}",
                    span.members,
                    max_len
                );
            }
        }
    }
}
