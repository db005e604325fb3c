//! Serializable descriptions of text ranges, so highlights can be re-anchored
//! later without the parsed document.

use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Node};
use serde::Serialize;

use super::range::{boundary_offset, Boundary, TextRange};
use super::TextNodes;

/// Chars of context stored before and after a quote.
const QUOTE_CONTEXT_LEN: usize = 32;

/// Turns a range into an opaque JSON value stored alongside an annotation.
pub trait SelectorDescriber {
    /// `None` when the range cannot be described relative to `root`.
    fn describe(&self, html: &Html, root: NodeId, range: &TextRange) -> Option<serde_json::Value>;
}

/// Describes ranges with range, text-position and text-quote selectors
/// (the W3C web annotation selector types).
#[derive(Debug, Clone)]
pub struct TextSelectorDescriber {
    pub context_len: usize,
}

impl Default for TextSelectorDescriber {
    fn default() -> Self {
        Self {
            context_len: QUOTE_CONTEXT_LEN,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RangeSelector {
    start_container: String,
    start_offset: usize,
    end_container: String,
    end_offset: usize,
}

#[derive(Debug, Serialize)]
struct TextPositionSelector {
    start: usize,
    end: usize,
}

#[derive(Debug, Serialize)]
struct TextQuoteSelector {
    exact: String,
    prefix: String,
    suffix: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum Selector {
    RangeSelector(RangeSelector),
    TextPositionSelector(TextPositionSelector),
    TextQuoteSelector(TextQuoteSelector),
}

impl SelectorDescriber for TextSelectorDescriber {
    fn describe(&self, html: &Html, root: NodeId, range: &TextRange) -> Option<serde_json::Value> {
        let offsets = range.offsets_in(html, root)?;

        let (start_container, start_offset) = container_offset(html, root, range.start)?;
        let (end_container, end_offset) = container_offset(html, root, range.end)?;

        let root_text: Vec<char> = TextNodes::new(html.tree.get(root)?)
            .flat_map(|(_, text)| text.chars())
            .collect();
        let slice = |from: usize, to: usize| -> String {
            root_text[from.min(root_text.len())..to.min(root_text.len())]
                .iter()
                .collect()
        };

        let selectors = vec![
            Selector::RangeSelector(RangeSelector {
                start_container,
                start_offset,
                end_container,
                end_offset,
            }),
            Selector::TextPositionSelector(TextPositionSelector {
                start: offsets.start,
                end: offsets.end,
            }),
            Selector::TextQuoteSelector(TextQuoteSelector {
                exact: slice(offsets.start, offsets.end),
                prefix: slice(offsets.start.saturating_sub(self.context_len), offsets.start),
                suffix: slice(offsets.end, offsets.end + self.context_len),
            }),
        ];

        serde_json::to_value(selectors)
            .inspect_err(|e| log::warn!("Failed to serialize selectors: {}", e))
            .ok()
    }
}

/// XPath of the element holding `boundary` and the boundary's char offset
/// within that element's text.
fn container_offset(html: &Html, root: NodeId, boundary: Boundary) -> Option<(String, usize)> {
    let node = match boundary {
        Boundary::Text { node, .. } | Boundary::End(node) => html.tree.get(node)?,
    };
    let container = if node.value().is_element() {
        node
    } else {
        node.parent()?
    };

    let xpath = xpath_from(container, root)?;
    let offset = boundary_offset(html, container.id(), boundary)?;
    Some((xpath, offset))
}

/// Path like `/div[1]/p[3]` from `root` (exclusive) down to `node`.
fn xpath_from(node: NodeRef<Node>, root: NodeId) -> Option<String> {
    let mut steps = Vec::new();
    let mut current = node;
    while current.id() != root {
        let element = current.value().as_element()?;
        let index = current
            .prev_siblings()
            .filter(|sibling| {
                sibling
                    .value()
                    .as_element()
                    .is_some_and(|e| e.name() == element.name())
            })
            .count()
            + 1;
        steps.push(format!("/{}[{}]", element.name(), index));
        current = current.parent()?;
    }
    steps.reverse();
    Some(steps.concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{anchor_paragraph_sentences, body_or_root};
    use scraper::Selector as CssSelector;
    use serde_json::json;

    #[test]
    fn test_describe_sentence_in_second_paragraph() {
        let html = Html::parse_document(
            "<body><div><p>Intro text.</p><p>First sentence. <b>Second</b> sentence.</p></div></body>",
        );
        let p = html
            .select(&CssSelector::parse("p").unwrap())
            .nth(1)
            .unwrap()
            .id();
        let ranges = anchor_paragraph_sentences(&html, p, &["First sentence.", "Second sentence."]);
        let body = body_or_root(&html);

        let value = TextSelectorDescriber::default()
            .describe(&html, body, &ranges[1])
            .unwrap();

        assert_eq!(
            value[0],
            json!({
                "type": "RangeSelector",
                "startContainer": "/div[1]/p[2]/b[1]",
                "startOffset": 0,
                "endContainer": "/div[1]/p[2]",
                "endOffset": 32,
            })
        );
        assert_eq!(
            value[1],
            json!({"type": "TextPositionSelector", "start": 27, "end": 43})
        );
        assert_eq!(value[2]["exact"], "Second sentence.");
        assert_eq!(value[2]["prefix"], "Intro text.First sentence. ");
        assert_eq!(value[2]["suffix"], "");
    }

    #[test]
    fn test_range_outside_root_is_not_described() {
        let html = Html::parse_document("<body><p>One.</p><p>Two.</p></body>");
        let selector = CssSelector::parse("p").unwrap();
        let mut paragraphs = html.select(&selector);
        let first = paragraphs.next().unwrap().id();
        let second = paragraphs.next().unwrap().id();

        let range = TextRange::collapsed(Boundary::End(second));
        assert!(TextSelectorDescriber::default()
            .describe(&html, first, &range)
            .is_none());
    }
}
