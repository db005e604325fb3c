use scraper::Html;

use super::*;
use crate::annotations::{article_id_for_url, create_annotations};
use crate::dom::list_paragraphs;
use crate::embeddings::normalize_whitespace;
use crate::heatmap::get_heatmap;

fn article() -> String {
    let bravo_rest = padded("Bravo").trim_start_matches("Bravo").to_string();
    format!(
        "<html><body>\
         <nav><li>Home</li><li>About</li></nav>\
         <article>\
         <p>{alpha}\n      <em>Bravo</em>{bravo_rest} {charlie}</p>\
         <div class=\"comments\"><p>{spam}</p></div>\
         <p>{delta} <a href=\"/e\">{echo}</a>\n{foxtrot}</p>\
         </article></body></html>",
        alpha = padded("Alpha"),
        charlie = padded("Charlie"),
        spam = ["Alpha", "Alpha", "Alpha"].map(padded).join(" "),
        delta = padded("Delta"),
        echo = padded("Echo"),
        foxtrot = padded("Foxtrot"),
    )
}

#[test]
fn test_article_to_annotations() {
    let html = Html::parse_document(&article());
    let config = scenario_config();

    let paragraphs = list_paragraphs(&html, &config.locator).unwrap();
    assert_eq!(paragraphs.len(), 2);
    assert!(paragraphs.looks_like_article());

    let heatmap = get_heatmap(&KeywordProvider, &paragraphs.texts(), &config).unwrap();
    assert_eq!(heatmap.len(), 2);

    let article_id = article_id_for_url("https://example.com/article").unwrap();
    let annotations = create_annotations(
        &html,
        &paragraphs.nodes(),
        &heatmap,
        &article_id,
        config.annotations.score_threshold,
    );

    assert_eq!(annotations.len(), 1);
    let annotation = &annotations[0];
    assert_eq!(annotation.id, format!("ai_{}_0", &article_id[..20]));
    assert_eq!(annotation.article_id, article_id);
    assert!(annotation.quote_text.starts_with("Alpha"));
    assert!(annotation.quote_text.ends_with("word."));
    assert!(annotation.quote_text.contains("Bravo"));
    assert_eq!(annotation.ai_score, 1.0);

    // the quote in the document keeps its raw whitespace
    let exact = annotation.quote_html_selector[2]["exact"].as_str().unwrap();
    assert!(exact.contains('\n'));
    assert_eq!(normalize_whitespace(exact), annotation.quote_text);

    let range = &annotation.quote_html_selector[0];
    assert_eq!(range["startContainer"], "/article[1]/p[1]");
    assert_eq!(range["startOffset"], 0);
}

#[test]
fn test_every_span_is_anchored() {
    let html = Html::parse_document(&article());
    let config = scenario_config();
    let paragraphs = list_paragraphs(&html, &config.locator).unwrap();
    let heatmap = get_heatmap(&KeywordProvider, &paragraphs.texts(), &config).unwrap();

    let annotations = create_annotations(&html, &paragraphs.nodes(), &heatmap, "article", 0.0);

    let quotes: Vec<&str> = annotations.iter().map(|a| a.quote_text.as_str()).collect();
    let expected: Vec<&str> = heatmap.iter().flatten().map(|s| s.sentence.as_str()).collect();
    assert_eq!(quotes, expected);

    for annotation in &annotations {
        let exact = annotation.quote_html_selector[2]["exact"].as_str().unwrap();
        assert_eq!(normalize_whitespace(exact), annotation.quote_text);
    }
    let ids: Vec<&str> = annotations.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["ai_article_0", "ai_article_1", "ai_article_2"]);
}
