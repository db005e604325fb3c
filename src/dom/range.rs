use std::ops::Range;

use ego_tree::NodeId;
use scraper::{Html, Node};

use super::TextNodes;

/// One end of a [`TextRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Before the `offset`-th char of a text node.
    Text { node: NodeId, offset: usize },
    /// After the last char below a node.
    End(NodeId),
}

/// A contiguous run of document text between two boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: Boundary,
    pub end: Boundary,
}

impl TextRange {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: Boundary) -> Self {
        Self { start: at, end: at }
    }

    /// Char offsets of both boundaries within the text below `root`.
    ///
    /// `None` if either boundary lies outside `root`.
    pub fn offsets_in(&self, html: &Html, root: NodeId) -> Option<Range<usize>> {
        let start = boundary_offset(html, root, self.start)?;
        let end = boundary_offset(html, root, self.end)?;
        Some(start..end.max(start))
    }

    /// The text covered by the range, like DOM `Range.toString()`.
    pub fn text(&self, html: &Html) -> String {
        let root = html.tree.root().id();
        let Some(offsets) = self.offsets_in(html, root) else {
            return String::new();
        };
        TextNodes::new(html.tree.root())
            .flat_map(|(_, text)| text.chars())
            .skip(offsets.start)
            .take(offsets.len())
            .collect()
    }
}

/// Char offset of `boundary` within the text below `root`.
pub(crate) fn boundary_offset(html: &Html, root: NodeId, boundary: Boundary) -> Option<usize> {
    let root = html.tree.get(root)?;
    let mut before = 0;
    for node in root.descendants() {
        let own_len = || -> usize {
            TextNodes::new(node)
                .map(|(_, text)| text.chars().count())
                .sum()
        };
        match boundary {
            Boundary::Text { node: id, offset } if node.id() == id => {
                return Some(before + offset.min(own_len()));
            }
            Boundary::End(id) if node.id() == id => return Some(before + own_len()),
            _ => {}
        }
        if let Node::Text(text) = node.value() {
            before += text.chars().count();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    fn setup() -> (Html, NodeId, NodeId, NodeId) {
        let html = Html::parse_fragment("<div><p>Héllo <b>bold</b> world</p><p>next</p></div>");
        let (p, first, last) = {
            let p = html
                .select(&Selector::parse("p").unwrap())
                .next()
                .unwrap();
            let texts: Vec<NodeId> = TextNodes::new(*p).map(|(id, _)| id).collect();
            (p.id(), texts[0], texts[2])
        };
        (html, p, first, last)
    }

    #[test]
    fn test_text_within_single_node() {
        let (html, _, first, _) = setup();
        let range = TextRange::new(
            Boundary::Text { node: first, offset: 1 },
            Boundary::Text { node: first, offset: 5 },
        );
        assert_eq!(range.text(&html), "éllo");
    }

    #[test]
    fn test_text_across_nodes() {
        let (html, _, first, last) = setup();
        let range = TextRange::new(
            Boundary::Text { node: first, offset: 0 },
            Boundary::Text { node: last, offset: 3 },
        );
        assert_eq!(range.text(&html), "Héllo bold wo");
    }

    #[test]
    fn test_end_boundary_covers_node() {
        let (html, p, first, _) = setup();
        let range = TextRange::new(Boundary::Text { node: first, offset: 6 }, Boundary::End(p));
        assert_eq!(range.text(&html), "bold world");
        assert_eq!(range.offsets_in(&html, p), Some(6..16));
    }

    #[test]
    fn test_boundary_outside_root() {
        let (html, p, _, _) = setup();
        let other = html
            .select(&Selector::parse("p").unwrap())
            .nth(1)
            .unwrap()
            .id();
        let range = TextRange::collapsed(Boundary::End(other));
        assert_eq!(range.offsets_in(&html, p), None);
        assert_eq!(range.text(&html), "");
    }
}
