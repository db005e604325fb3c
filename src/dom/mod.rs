//! Document-side half of the pipeline: finding article paragraphs in parsed
//! HTML and mapping ranked sentences back onto text ranges.

pub mod anchor;
pub mod describe;
pub mod locate;
pub mod range;

use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Node};

pub use anchor::anchor_paragraph_sentences;
pub use describe::{SelectorDescriber, TextSelectorDescriber};
pub use locate::{list_paragraphs, LocatedParagraph, ParagraphSet};
pub use range::{Boundary, TextRange};

/// Depth-first, document-order iterator over the text nodes below a node
/// (the node itself included).
pub struct TextNodes<'a> {
    stack: Vec<NodeRef<'a, Node>>,
}

impl<'a> TextNodes<'a> {
    pub fn new(root: NodeRef<'a, Node>) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for TextNodes<'a> {
    type Item = (NodeId, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            if let Node::Text(text) = node.value() {
                return Some((node.id(), &**text));
            }
            // reversed so the first child is popped first
            let children: Vec<_> = node.children().collect();
            self.stack.extend(children.into_iter().rev());
        }
        None
    }
}

/// Concatenated text of every text node below `node`, like DOM `textContent`.
pub fn text_content(html: &Html, node: NodeId) -> String {
    match html.tree.get(node) {
        Some(node) => TextNodes::new(node).map(|(_, text)| text).collect(),
        None => String::new(),
    }
}

/// The `<body>` element, or the document root if there is none.
pub fn body_or_root(html: &Html) -> NodeId {
    html.tree
        .root()
        .descendants()
        .find(|node| {
            node.value()
                .as_element()
                .is_some_and(|element| element.name() == "body")
        })
        .map(|node| node.id())
        .unwrap_or_else(|| html.tree.root().id())
}
