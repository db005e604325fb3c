use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory holding config.yaml and the model cache.
    /// Defaults to ~/.local/share/heatmap
    #[clap(long, env = "HEATMAP_BASE_PATH")]
    pub base_path: Option<PathBuf>,

    /// Sentence embedding backend
    #[clap(long, value_enum, default_value_t = ProviderKind::Fastembed)]
    pub provider: ProviderKind,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Local ONNX sentence encoder (downloads the model on first use)
    Fastembed,
    /// Hashed bag-of-words vectors, no download
    Lexical,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the article paragraphs found in an HTML file
    Paragraphs {
        /// HTML file
        file: PathBuf,
    },

    /// Print the sentence heatmap, grouped by paragraph
    Rank {
        /// HTML file, or plain text with --text
        file: PathBuf,

        /// Treat the input as plain text with blank-line separated paragraphs
        #[clap(long, default_value = "false")]
        text: bool,
    },

    /// Create highlight annotations for an HTML file
    Annotate {
        /// HTML file
        file: PathBuf,

        /// Article id stored on every annotation
        #[clap(long, conflicts_with = "url")]
        article_id: Option<String>,

        /// Page url, hashed into the article id
        #[clap(long)]
        url: Option<String>,

        /// Minimum score of an annotated sentence. Defaults to the config value
        #[clap(long)]
        threshold: Option<f32>,
    },

    /// Print the key points of an HTML file
    Highlights {
        /// HTML file
        file: PathBuf,

        /// Minimum score of a key point. Defaults to the config value
        #[clap(long)]
        threshold: Option<f32>,
    },
}

impl Command {
    /// Whether the command ranks sentences and so needs an embedding provider.
    pub fn uses_embeddings(&self) -> bool {
        !matches!(self, Command::Paragraphs { .. })
    }
}

/// Score thresholds compare against min-max rescaled scores in [0, 1].
pub fn validate_threshold(threshold: f32) -> anyhow::Result<f32> {
    if !(0.0..=1.0).contains(&threshold) {
        anyhow::bail!("threshold must be between 0.0 and 1.0, got {}", threshold);
    }
    Ok(threshold)
}

/// Split plain text into paragraphs on blank lines.
pub fn text_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }
    paragraphs
}
