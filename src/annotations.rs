//! Converting a heatmap into stored highlight annotations.

use ego_tree::NodeId;
use scraper::Html;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::dom::{anchor_paragraph_sentences, body_or_root, SelectorDescriber, TextSelectorDescriber};
use crate::heatmap::RankedSentence;

/// Length of the article id prefix used in annotation ids.
const ID_ARTICLE_PREFIX_LEN: usize = 20;

/// A machine-created highlight, ready to be persisted by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub article_id: String,
    pub quote_text: String,
    /// Unix seconds
    pub created_at: i64,
    pub quote_html_selector: serde_json::Value,
    pub ai_created: bool,
    pub ai_score: f32,
}

/// Query parameters that only track how a reader arrived at a page.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ref",
    "mc_cid",
    "mc_eid",
];

/// Canonical form of an article URL.
///
/// Drops the fragment and tracking query parameters, lowercases the host and
/// strips trailing slashes from the path (the root `/` is kept).
pub fn normalize_article_url(url: &str) -> Result<Url, url::ParseError> {
    let mut parsed = Url::parse(url.trim())?;
    parsed.set_fragment(None);

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed.set_host(Some(&host))?;
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    parsed.set_query(None);
    if !kept.is_empty() {
        parsed.query_pairs_mut().extend_pairs(&kept);
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    Ok(parsed)
}

/// Stable article id for a page: hex SHA-256 of its normalized URL.
pub fn article_id_for_url(url: &str) -> Result<String, url::ParseError> {
    let normalized = normalize_article_url(url)?;

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_str().as_bytes());
    Ok(hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect())
}

/// Create annotations for every ranked sentence scoring at least `threshold`,
/// described with [`TextSelectorDescriber`].
///
/// `ranked[i]` holds the heatmap entries of `paragraphs[i]`.
pub fn create_annotations(
    html: &Html,
    paragraphs: &[NodeId],
    ranked: &[Vec<RankedSentence>],
    article_id: &str,
    threshold: f32,
) -> Vec<Annotation> {
    create_annotations_with(
        &TextSelectorDescriber::default(),
        html,
        paragraphs,
        ranked,
        article_id,
        threshold,
    )
}

pub fn create_annotations_with(
    describer: &dyn SelectorDescriber,
    html: &Html,
    paragraphs: &[NodeId],
    ranked: &[Vec<RankedSentence>],
    article_id: &str,
    threshold: f32,
) -> Vec<Annotation> {
    if paragraphs.len() != ranked.len() {
        log::warn!(
            "Got {} paragraphs but {} ranked groups, extra entries are ignored",
            paragraphs.len(),
            ranked.len()
        );
    }

    let created_at = chrono::Utc::now().timestamp();
    let id_prefix: String = article_id.chars().take(ID_ARTICLE_PREFIX_LEN).collect();
    let root = body_or_root(html);

    let mut annotations = Vec::new();
    for (&paragraph, sentences) in paragraphs.iter().zip(ranked) {
        if sentences.is_empty() {
            continue;
        }

        let texts: Vec<&str> = sentences.iter().map(|s| s.sentence.as_str()).collect();
        let ranges = anchor_paragraph_sentences(html, paragraph, &texts);

        for (sentence, range) in sentences.iter().zip(&ranges) {
            if sentence.score < threshold {
                continue;
            }
            let Some(selector) = describer.describe(html, root, range) else {
                log::warn!("Could not describe range for {:?}", sentence.sentence);
                continue;
            };

            annotations.push(Annotation {
                id: format!("ai_{}_{}", id_prefix, annotations.len()),
                article_id: article_id.to_string(),
                quote_text: sentence.sentence.clone(),
                created_at,
                quote_html_selector: selector,
                ai_created: true,
                ai_score: sentence.score,
            });
        }
    }

    log::debug!("Created {} annotations for {}", annotations.len(), article_id);
    annotations
}
