//! Finding the article paragraphs of a parsed document.

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node, Selector};

use super::text_content;
use crate::config::LocatorConfig;
use crate::embeddings::normalize_whitespace;
use crate::errors::LocatorError;

/// An accepted paragraph element and its raw (uncollapsed) text.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedParagraph {
    pub node: NodeId,
    pub text: String,
}

/// Paragraphs in document order.
#[derive(Debug, Clone, Default)]
pub struct ParagraphSet {
    paragraphs: Vec<LocatedParagraph>,
    max_paragraphs: usize,
}

impl ParagraphSet {
    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.paragraphs.iter().map(|p| p.text.as_str()).collect()
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.paragraphs.iter().map(|p| p.node).collect()
    }

    /// Pages with no paragraphs, or very many (link lists, forums), are not
    /// treated as articles.
    pub fn looks_like_article(&self) -> bool {
        !self.paragraphs.is_empty() && self.paragraphs.len() < self.max_paragraphs
    }
}

/// Select the paragraph elements worth ranking.
///
/// An element matching `config.selector` is rejected when it is hidden, its
/// collapsed text is shorter than `config.min_text_len` chars, it or one of
/// its two closest ancestors carries an excluded class, or it sits in `<code>`.
pub fn list_paragraphs(html: &Html, config: &LocatorConfig) -> Result<ParagraphSet, LocatorError> {
    let selector = Selector::parse(&config.selector).map_err(|e| LocatorError::InvalidSelector {
        selector: config.selector.clone(),
        reason: format!("{:?}", e),
    })?;

    let mut paragraphs = Vec::new();
    for element in html.select(&selector) {
        if config.check_visibility && is_hidden(&element) {
            continue;
        }

        let text = text_content(html, element.id());
        if normalize_whitespace(&text).chars().count() < config.min_text_len {
            continue;
        }

        if has_excluded_class(&element, &config.excluded_classes) || is_code(&element) {
            log::trace!("Skipping excluded paragraph {:?}", element.id());
            continue;
        }

        paragraphs.push(LocatedParagraph {
            node: element.id(),
            text,
        });
    }

    log::debug!("Located {} paragraphs", paragraphs.len());
    Ok(ParagraphSet {
        paragraphs,
        max_paragraphs: config.max_paragraphs,
    })
}

fn ancestors_and_self<'a>(element: &ElementRef<'a>) -> impl Iterator<Item = NodeRef<'a, Node>> {
    std::iter::once(**element).chain(element.ancestors())
}

fn is_hidden(element: &ElementRef) -> bool {
    ancestors_and_self(element)
        .filter_map(|node| node.value().as_element())
        .any(|el| {
            if el.attr("hidden").is_some() {
                return true;
            }
            if el
                .attr("aria-hidden")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
            {
                return true;
            }
            el.attr("style").is_some_and(|style| {
                let style: String = style
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_lowercase();
                style.contains("display:none") || style.contains("visibility:hidden")
            })
        })
}

/// Checks the element, its parent and its grandparent.
fn has_excluded_class(element: &ElementRef, excluded: &[String]) -> bool {
    ancestors_and_self(element)
        .take(3)
        .filter_map(|node| node.value().as_element())
        .filter_map(|el| el.attr("class"))
        .any(|class| {
            let class = class.to_lowercase();
            excluded
                .iter()
                .any(|word| class.contains(&word.to_lowercase()))
        })
}

fn is_code(element: &ElementRef) -> bool {
    ancestors_and_self(element)
        .take(2)
        .filter_map(|node| node.value().as_element())
        .any(|el| el.name() == "code")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(len: usize) -> String {
        let mut text = "lorem ipsum dolor sit amet ".repeat(len / 27 + 1);
        text.truncate(len);
        text
    }

    fn texts(markup: &str) -> Vec<String> {
        let html = Html::parse_document(markup);
        list_paragraphs(&html, &LocatorConfig::default())
            .unwrap()
            .texts()
            .into_iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn test_excluded_class_is_skipped() {
        let text = filler(300);
        let markup = format!(
            "<body><p class=\"comment-footer\">{text}</p><p>{text}</p></body>"
        );
        let html = Html::parse_document(&markup);
        let set = list_paragraphs(&html, &LocatorConfig::default()).unwrap();

        assert_eq!(set.len(), 1);
        let kept = html.tree.get(set.nodes()[0]).unwrap();
        assert!(kept.value().as_element().unwrap().attr("class").is_none());
    }

    #[test]
    fn test_excluded_class_on_grandparent() {
        let text = filler(300);
        let markup = format!(
            "<body><div class=\"References\"><div><p>{text}</p></div></div>\
             <div class=\"x\"><div><div><p>{text}</p></div></div></div></body>"
        );
        assert_eq!(texts(&markup).len(), 1);
    }

    #[test]
    fn test_short_paragraphs_are_skipped() {
        let markup = format!(
            "<body><p>{}</p><li>{}</li><p>   {}   </p></body>",
            filler(199),
            filler(200),
            filler(150)
        );
        let found = texts(&markup);
        assert_eq!(found, vec![filler(200)]);
    }

    #[test]
    fn test_raw_text_is_kept() {
        let body = format!("{}\n\n   <b>bold</b>   {}", filler(120), filler(120));
        let markup = format!("<body><p>{body}</p></body>");
        let found = texts(&markup);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("\n\n   bold   "));
    }

    #[test]
    fn test_code_and_hidden_are_skipped() {
        let text = filler(250);
        let markup = format!(
            "<body><code><p>{text}</p></code>\
             <div hidden><p>{text}</p></div>\
             <p style=\"display: none\">{text}</p>\
             <div aria-hidden=\"true\"><p>{text}</p></div>\
             <font>{text}</font></body>"
        );
        let html = Html::parse_document(&markup);
        let set = list_paragraphs(&html, &LocatorConfig::default()).unwrap();
        assert_eq!(set.len(), 1);
        let node = html.tree.get(set.nodes()[0]).unwrap();
        assert_eq!(node.value().as_element().unwrap().name(), "font");

        let visible_too = LocatorConfig {
            check_visibility: false,
            ..Default::default()
        };
        assert_eq!(list_paragraphs(&html, &visible_too).unwrap().len(), 4);
    }

    #[test]
    fn test_looks_like_article() {
        let html = Html::parse_document("<body><p>short</p></body>");
        let set = list_paragraphs(&html, &LocatorConfig::default()).unwrap();
        assert!(!set.looks_like_article());

        let paragraph = format!("<p>{}</p>", filler(220));
        let markup = format!("<body>{}</body>", paragraph.repeat(3));
        let html = Html::parse_document(&markup);
        let config = LocatorConfig {
            max_paragraphs: 3,
            ..Default::default()
        };
        assert!(!list_paragraphs(&html, &config).unwrap().looks_like_article());
        assert!(list_paragraphs(&html, &LocatorConfig::default())
            .unwrap()
            .looks_like_article());
    }

    #[test]
    fn test_invalid_selector() {
        let config = LocatorConfig {
            selector: "p[".to_string(),
            ..Default::default()
        };
        let html = Html::parse_document("<p></p>");
        assert!(matches!(
            list_paragraphs(&html, &config),
            Err(LocatorError::InvalidSelector { .. })
        ));
    }
}
