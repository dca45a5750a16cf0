use anyhow::{Context, Result};
use cache::SourceCache;
use clap::Parser;
use pipeline::{AppConfig, CsvSink, WordPipeline, load_words};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "wordfill", version, about = "Enrich a word list with dictionary and model-filled metadata")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Word list URL or path, overrides the config
    #[arg(short, long)]
    words: Option<String>,

    /// Output CSV path, overrides the config
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(words) = args.words {
        config.words.source = words;
    }
    if let Some(output) = args.output {
        config.output.path = output;
    }

    info!(
        model = %config.model.model_id,
        runtime = ?config.model.runtime,
        cache_dir = %config.cache.dir.display(),
        "Starting wordfill"
    );

    let cache = SourceCache::new(&config.cache.dir);
    if let Err(e) = cache.init().await {
        // Lookups still work, they just won't persist
        warn!(dir = %config.cache.dir.display(), error = %e, "Cache directory unavailable");
    }

    let pipeline = WordPipeline::from_config(&config, cache.clone())?;

    let words = load_words(&config.words.source).await?;
    info!(count = words.len(), source = %config.words.source, "Loaded word list");

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current word");
            interrupt.cancel();
        }
    });

    let entries = pipeline.run(&words, &cancel).await;

    let sink = CsvSink::new(&config.output.path);
    let rows = sink.write(&entries)?;
    info!(rows = rows, path = %sink.path().display(), "Wrote output");

    let metrics = serde_json::to_string(&pipeline.metrics().snapshot())
        .context("Failed to serialize metrics")?;
    let cache_stats =
        serde_json::to_string(&cache.stats()).context("Failed to serialize cache stats")?;
    info!(metrics = %metrics, cache = %cache_stats, "Run complete");

    Ok(())
}
