use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use homedir::my_home;
use scraper::Html;
use url::Url;

use heatmap::cli::{self, Command, ProviderKind};
use heatmap::config::Config;
use heatmap::embeddings::{EmbeddingError, EmbeddingProvider, LexicalProvider, ProviderFactory};
use heatmap::{
    article_id_for_url, create_annotations, list_paragraphs, top_highlights, HeatmapService,
    ParagraphSet,
};

fn base_path(args: &cli::Args) -> anyhow::Result<PathBuf> {
    if let Some(path) = &args.base_path {
        return Ok(path.clone());
    }
    let home = my_home()
        .context("Could not determine home directory")?
        .context("Home directory path is empty")?;
    Ok(home.join(".local/share/heatmap"))
}

#[cfg_attr(not(feature = "fastembed"), allow(unused_variables))]
fn provider_factory(kind: ProviderKind, config: &Config) -> anyhow::Result<Box<dyn ProviderFactory>> {
    match kind {
        ProviderKind::Lexical => Ok(Box::new(
            || -> Result<Box<dyn EmbeddingProvider>, EmbeddingError> {
                Ok(Box::new(LexicalProvider::default()))
            },
        )),
        #[cfg(feature = "fastembed")]
        ProviderKind::Fastembed => {
            let embedding = config.embedding.clone();
            let cache_dir = config.base_path().to_path_buf();
            Ok(Box::new(
                move || -> Result<Box<dyn EmbeddingProvider>, EmbeddingError> {
                    let provider =
                        heatmap::embeddings::FastEmbedProvider::new(&embedding, cache_dir.clone())?;
                    Ok(Box::new(provider))
                },
            ))
        }
        #[cfg(not(feature = "fastembed"))]
        ProviderKind::Fastembed => {
            bail!("built without the fastembed feature, use --provider lexical")
        }
    }
}

fn resolve_article_id(file: &Path, url: Option<&str>) -> anyhow::Result<String> {
    match url {
        Some(url) => article_id_for_url(url).with_context(|| format!("Invalid url {:?}", url)),
        None => {
            let path = std::fs::canonicalize(file)
                .with_context(|| format!("Failed to resolve {}", file.display()))?;
            let Ok(file_url) = Url::from_file_path(&path) else {
                bail!("Cannot build a file url for {}", path.display());
            };
            Ok(article_id_for_url(file_url.as_str())?)
        }
    }
}

fn read_html(path: &Path) -> anyhow::Result<Html> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Html::parse_document(&source))
}

fn locate(html: &Html, config: &Config) -> anyhow::Result<Option<ParagraphSet>> {
    let paragraphs = list_paragraphs(html, &config.locator)?;
    if !paragraphs.looks_like_article() {
        log::warn!(
            "Found {} paragraphs, not treating the page as an article",
            paragraphs.len()
        );
        return Ok(None);
    }
    Ok(Some(paragraphs))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = cli::Args::parse();

    let config = Config::load_with(base_path(&args)?).context("Failed to load config")?;
    let service = HeatmapService::new(provider_factory(args.provider, &config)?, config);
    let config = service.config();
    if args.command.uses_embeddings() {
        service.initialize().context("Failed to load embedding provider")?;
    }

    match args.command {
        Command::Paragraphs { file } => {
            let _span = tracing::info_span!("paragraphs", file = %file.display()).entered();
            let html = read_html(&file)?;
            let paragraphs = list_paragraphs(&html, &config.locator)?;
            print_json(&paragraphs.texts())
        }

        Command::Rank { file, text } => {
            let _span = tracing::info_span!("rank", file = %file.display()).entered();
            let paragraphs = if text {
                let source = std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                cli::text_paragraphs(&source)
            } else {
                let html = read_html(&file)?;
                match locate(&html, config)? {
                    Some(set) => set.texts().into_iter().map(String::from).collect(),
                    None => return print_json(&Vec::<()>::new()),
                }
            };
            let heatmap = service.get_heatmap(&paragraphs)?;
            print_json(&heatmap)
        }

        Command::Annotate {
            file,
            article_id,
            url,
            threshold,
        } => {
            let _span = tracing::info_span!("annotate", file = %file.display()).entered();
            let article_id = match article_id {
                Some(id) => id,
                None => resolve_article_id(&file, url.as_deref())?,
            };
            let threshold =
                cli::validate_threshold(threshold.unwrap_or(config.annotations.score_threshold))?;

            let html = read_html(&file)?;
            let Some(paragraphs) = locate(&html, config)? else {
                return print_json(&Vec::<()>::new());
            };
            let heatmap = service.get_heatmap(&paragraphs.texts())?;
            let annotations =
                create_annotations(&html, &paragraphs.nodes(), &heatmap, &article_id, threshold);
            log::info!("Created {} annotations", annotations.len());
            print_json(&annotations)
        }

        Command::Highlights { file, threshold } => {
            let _span = tracing::info_span!("highlights", file = %file.display()).entered();
            let threshold =
                cli::validate_threshold(threshold.unwrap_or(config.annotations.score_threshold))?;

            let html = read_html(&file)?;
            let Some(paragraphs) = locate(&html, config)? else {
                return print_json(&Vec::<()>::new());
            };
            let heatmap = service.get_heatmap(&paragraphs.texts())?;
            print_json(&top_highlights(&heatmap, threshold))
        }
    }
}
