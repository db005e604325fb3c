//! Mapping sentences back onto the text of their paragraph element.
//!
//! Sentences are whitespace-normalized while the paragraph's DOM text is raw,
//! so the walk counts every whitespace run in the document (even one spanning
//! several text nodes) as a single char, and skips the whitespace separating
//! consecutive sentences.

use ego_tree::NodeId;
use scraper::Html;

use super::range::{Boundary, TextRange};
use super::TextNodes;
use crate::embeddings::normalize_whitespace;

#[derive(Debug, Clone, Copy)]
struct TextChar {
    node: NodeId,
    offset: usize,
    ch: char,
}

/// Forward-only position in the paragraph's text.
struct Cursor<'a> {
    chars: &'a [TextChar],
    pos: usize,
    /// Returned once the paragraph text runs out
    fallback: Boundary,
}

impl Cursor<'_> {
    fn skip_whitespace(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].ch.is_whitespace() {
            self.pos += 1;
        }
    }

    fn boundary(&self) -> Boundary {
        match (self.chars.get(self.pos), self.chars.last()) {
            (Some(c), _) => Boundary::Text {
                node: c.node,
                offset: c.offset,
            },
            (None, Some(last)) => Boundary::Text {
                node: last.node,
                offset: last.offset + 1,
            },
            (None, None) => self.fallback,
        }
    }

    /// Consume one normalized char; a whitespace run counts as one.
    /// Returns whether it matched `expected`, or `None` at the end of the text.
    fn advance(&mut self, expected: char) -> Option<bool> {
        let current = self.chars.get(self.pos)?;
        if current.ch.is_whitespace() {
            self.skip_whitespace();
            return Some(expected.is_whitespace());
        }
        self.pos += 1;
        Some(current.ch == expected)
    }

    /// Boundary right after the last consumed char.
    fn end_boundary(&self) -> Boundary {
        match self.pos.checked_sub(1).and_then(|i| self.chars.get(i)) {
            Some(c) => Boundary::Text {
                node: c.node,
                offset: c.offset + 1,
            },
            None => self.boundary(),
        }
    }
}

/// Produce one range per sentence, in order, inside `paragraph`.
///
/// `sentences` must come from segmenting this paragraph's text. If they claim
/// more text than the paragraph holds, the last range is closed at the end of
/// the paragraph and fewer ranges than sentences are returned.
pub fn anchor_paragraph_sentences<S: AsRef<str>>(
    html: &Html,
    paragraph: NodeId,
    sentences: &[S],
) -> Vec<TextRange> {
    let Some(root) = html.tree.get(paragraph) else {
        log::warn!("Paragraph node {:?} not found in document", paragraph);
        return vec![];
    };

    let chars: Vec<TextChar> = TextNodes::new(root)
        .flat_map(|(node, text)| {
            text.chars()
                .enumerate()
                .map(move |(offset, ch)| TextChar { node, offset, ch })
        })
        .collect();
    let mut cursor = Cursor {
        chars: &chars,
        pos: 0,
        fallback: Boundary::End(paragraph),
    };

    let mut ranges = Vec::with_capacity(sentences.len());
    let mut reported_mismatch = false;
    for (index, sentence) in sentences.iter().enumerate() {
        cursor.skip_whitespace();
        let start = cursor.boundary();
        let start_pos = cursor.pos;

        let mut exhausted = false;
        for expected in normalize_whitespace(sentence.as_ref()).chars() {
            match cursor.advance(expected) {
                Some(true) => {}
                Some(false) => {
                    if !reported_mismatch {
                        log::debug!(
                            "Sentence {} does not match paragraph text at char {}",
                            index,
                            cursor.pos
                        );
                        reported_mismatch = true;
                    }
                }
                None => {
                    exhausted = true;
                    break;
                }
            }
        }

        if exhausted {
            log::debug!(
                "Paragraph text ran out at sentence {} of {}",
                index + 1,
                sentences.len()
            );
            ranges.push(TextRange::new(start, Boundary::End(paragraph)));
            break;
        }

        let end = if cursor.pos == start_pos {
            start
        } else {
            cursor.end_boundary()
        };
        ranges.push(TextRange::new(start, end));
    }

    ranges
}
