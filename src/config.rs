use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

const CONFIG_FILE: &str = "config.yaml";

/// Default embedding model (small sentence encoder, 384 dims)
const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
/// Sentences sent to the embedding model per call
const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 10;

const DEFAULT_MAX_SENTENCES: usize = 300;
const DEFAULT_MIN_SENTENCE_LEN: usize = 100;
const DEFAULT_MAX_ITERATIONS: usize = 10;
const DEFAULT_TOLERANCE: f32 = 0.0001;
const DEFAULT_GROUP_SIMILARITY: f32 = 0.6;
const DEFAULT_GROUP_SCORE_DELTA: f32 = 0.2;
const DEFAULT_MAX_SPAN_LEN: usize = 200;

const DEFAULT_SUPPRESSION_THRESHOLD: f32 = 0.6;
const DEFAULT_SIMILARITY_WINDOW: usize = 6;
const DEFAULT_SIGNIFICANT_WINDOW: usize = 1;

const DEFAULT_PARAGRAPH_SELECTOR: &str = "p, font, li";
const DEFAULT_MIN_PARAGRAPH_LEN: usize = 200;
/// Documents with this many paragraphs are likely link lists, not articles
const DEFAULT_MAX_PARAGRAPHS: usize = 200;

const DEFAULT_SCORE_THRESHOLD: f32 = 0.6;

/// Embedding model settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Model name for embeddings (e.g., "all-MiniLM-L6-v2")
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Number of sentences embedded per model call
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,

    #[serde(default)]
    pub show_download_progress: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
            show_download_progress: false,
        }
    }
}

/// Ranking and span grouping parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HeatmapConfig {
    /// Sentences past this count are dropped before embedding
    #[serde(default = "default_max_sentences")]
    pub max_sentences: usize,

    /// Raw sentences shorter than this are merged into a neighbour
    #[serde(default = "default_min_sentence_len")]
    pub min_sentence_len: usize,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// TextRank stops once the summed score change falls below this
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,

    /// Multiplier applied to every similarity matrix entry
    #[serde(default = "default_similarity_scale")]
    pub similarity_scale: f32,

    /// Neighbours more similar than this join the same span
    #[serde(default = "default_group_similarity")]
    pub group_similarity: f32,

    /// Neighbours whose scores differ by less than this join the same span
    #[serde(default = "default_group_score_delta")]
    pub group_score_delta: f32,

    /// Longest span (in chars) the splitter will emit
    #[serde(default = "default_max_span_len")]
    pub max_span_len: usize,

    /// Re-run TextRank on merged spans instead of keeping member max scores
    #[serde(default)]
    pub rescore_spans: bool,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            max_sentences: DEFAULT_MAX_SENTENCES,
            min_sentence_len: DEFAULT_MIN_SENTENCE_LEN,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            similarity_scale: 1.0,
            group_similarity: DEFAULT_GROUP_SIMILARITY,
            group_score_delta: DEFAULT_GROUP_SCORE_DELTA,
            max_span_len: DEFAULT_MAX_SPAN_LEN,
            rescore_spans: false,
        }
    }
}

/// Local suppression of redundant high scores
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SuppressionConfig {
    #[serde(default = "default_suppression_threshold")]
    pub threshold: f32,

    /// How many earlier spans are compared against each candidate
    #[serde(default = "default_similarity_window")]
    pub similarity_window: usize,

    /// Earlier spans this close always compete, regardless of similarity
    #[serde(default = "default_significant_window")]
    pub significant_window: usize,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SUPPRESSION_THRESHOLD,
            similarity_window: DEFAULT_SIMILARITY_WINDOW,
            significant_window: DEFAULT_SIGNIFICANT_WINDOW,
        }
    }
}

/// Paragraph selection rules
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LocatorConfig {
    #[serde(default = "default_paragraph_selector")]
    pub selector: String,

    /// Minimum whitespace-collapsed text length of a paragraph
    #[serde(default = "default_min_paragraph_len")]
    pub min_text_len: usize,

    /// Class name substrings that exclude an element, its children and grandchildren
    #[serde(default = "default_excluded_classes")]
    pub excluded_classes: Vec<String>,

    #[serde(default = "default_max_paragraphs")]
    pub max_paragraphs: usize,

    #[serde(default = "default_true")]
    pub check_visibility: bool,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            selector: DEFAULT_PARAGRAPH_SELECTOR.to_string(),
            min_text_len: DEFAULT_MIN_PARAGRAPH_LEN,
            excluded_classes: default_excluded_classes(),
            max_paragraphs: DEFAULT_MAX_PARAGRAPHS,
            check_visibility: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnnotationConfig {
    /// Minimum span score that becomes an annotation
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_embedding_batch_size() -> usize {
    DEFAULT_EMBEDDING_BATCH_SIZE
}

fn default_max_sentences() -> usize {
    DEFAULT_MAX_SENTENCES
}

fn default_min_sentence_len() -> usize {
    DEFAULT_MIN_SENTENCE_LEN
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

fn default_tolerance() -> f32 {
    DEFAULT_TOLERANCE
}

fn default_similarity_scale() -> f32 {
    1.0
}

fn default_group_similarity() -> f32 {
    DEFAULT_GROUP_SIMILARITY
}

fn default_group_score_delta() -> f32 {
    DEFAULT_GROUP_SCORE_DELTA
}

fn default_max_span_len() -> usize {
    DEFAULT_MAX_SPAN_LEN
}

fn default_suppression_threshold() -> f32 {
    DEFAULT_SUPPRESSION_THRESHOLD
}

fn default_similarity_window() -> usize {
    DEFAULT_SIMILARITY_WINDOW
}

fn default_significant_window() -> usize {
    DEFAULT_SIGNIFICANT_WINDOW
}

fn default_paragraph_selector() -> String {
    DEFAULT_PARAGRAPH_SELECTOR.to_string()
}

fn default_min_paragraph_len() -> usize {
    DEFAULT_MIN_PARAGRAPH_LEN
}

fn default_excluded_classes() -> Vec<String> {
    vec!["comment".to_string(), "reference".to_string()]
}

fn default_max_paragraphs() -> usize {
    DEFAULT_MAX_PARAGRAPHS
}

fn default_true() -> bool {
    true
}

fn default_score_threshold() -> f32 {
    DEFAULT_SCORE_THRESHOLD
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub heatmap: HeatmapConfig,
    #[serde(default)]
    pub suppression: SuppressionConfig,
    #[serde(default)]
    pub locator: LocatorConfig,
    #[serde(default)]
    pub annotations: AnnotationConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

fn check_unit(name: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{name} must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid(format!(
            "{name} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("embedding.batch_size", self.embedding.batch_size)?;

        let h = &self.heatmap;
        check_positive("heatmap.max_sentences", h.max_sentences)?;
        check_positive("heatmap.max_iterations", h.max_iterations)?;
        check_positive("heatmap.max_span_len", h.max_span_len)?;
        if h.tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "heatmap.tolerance must not be negative, got {}",
                h.tolerance
            )));
        }
        if h.similarity_scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "heatmap.similarity_scale must be positive, got {}",
                h.similarity_scale
            )));
        }
        check_unit("heatmap.group_score_delta", h.group_score_delta)?;

        check_unit("suppression.threshold", self.suppression.threshold)?;
        check_unit("annotations.score_threshold", self.annotations.score_threshold)?;

        if scraper::Selector::parse(&self.locator.selector).is_err() {
            return Err(ConfigError::Invalid(format!(
                "locator.selector is not a valid CSS selector: {:?}",
                self.locator.selector
            )));
        }

        Ok(())
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `config.yaml` from `base_path`, writing the defaults first if it is missing.
    pub fn load_with(base_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base_path = base_path.as_ref();
        let config_path = base_path.join(CONFIG_FILE);

        // create new if does not exist
        if !config_path.exists() {
            log::info!("Creating default config at {}", config_path.display());
            std::fs::create_dir_all(base_path)?;
            std::fs::write(&config_path, serde_yml::to_string(&Self::default())?)?;
        }

        let config_str = std::fs::read_to_string(&config_path)?;
        let mut config = Self::from_yaml(&config_str)?;
        config.base_path = base_path.to_path_buf();

        // resave in case new fields were added since the file was written
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_str = serde_yml::to_string(&self)?;
        std::fs::write(self.base_path.join(CONFIG_FILE), config_str)?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
