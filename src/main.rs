//! lesson-scout binary: one-shot searches from the command line, or the HTTP
//! service (`serve`) that runs searches in the background and reports progress.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lesson_scout::api::{self, AppState};
use lesson_scout::config::ScoutConfig;
use lesson_scout::content::HttpContentExtractor;
use lesson_scout::ingest::providers::FixtureCrawler;
use lesson_scout::ingest::types::SourceCrawler;
use lesson_scout::metrics::Metrics;
use lesson_scout::pipeline::Pipeline;
use lesson_scout::status::{FileStatusStore, MemoryStatusStore, StatusStore};

/// Used when `run` gets no keywords at all.
const DEFAULT_KEYWORDS: &[&str] = &["educational", "learning", "homeschool", "student resources"];

#[derive(Parser)]
#[command(
    name = "lesson-scout",
    version,
    about = "Find, rank and enrich learning resources for a set of interest keywords"
)]
struct Cli {
    /// Config file (TOML or JSON). Defaults to $LESSON_SCOUT_CONFIG, then config/scout.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one search and write its status file.
    Run {
        search_id: String,
        keywords: Vec<String>,
        /// Replay raw records from a JSON array instead of crawling live sites.
        #[arg(long)]
        fixture: Option<PathBuf>,
    },
    /// Start the HTTP service.
    Serve,
}

/// Compact logs by default, JSON lines when SCOUT_LOG_JSON=1.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lesson_scout=info,warn"));
    let json = std::env::var("SCOUT_LOG_JSON").is_ok_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn run_search(
    cfg: &ScoutConfig,
    search_id: &str,
    mut keywords: Vec<String>,
    fixture: Option<PathBuf>,
) -> anyhow::Result<()> {
    if keywords.is_empty() {
        keywords = DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect();
    }

    let store: Arc<dyn StatusStore> = Arc::new(FileStatusStore::new(cfg.status.dir.clone()));
    let pipeline = match fixture {
        Some(path) => {
            let crawler: Arc<dyn SourceCrawler> = Arc::new(FixtureCrawler::from_path(&path)?);
            let extractor = Arc::new(HttpContentExtractor::new(cfg.extractor.clone())?);
            Pipeline::new(vec![crawler], extractor, store, (&cfg.pipeline).into())
        }
        None => Pipeline::with_http_sources(cfg, store)?,
    };

    let outcome = pipeline.run(search_id, keywords.as_slice()).await?;
    tracing::info!(
        search_id,
        found = outcome.keyword_stats.resources_found,
        dir = %cfg.status.dir.display(),
        "search written"
    );
    Ok(())
}

async fn serve(cfg: &ScoutConfig) -> anyhow::Result<()> {
    let metrics = Metrics::init()?;
    let store: Arc<dyn StatusStore> = Arc::new(MemoryStatusStore::new());
    let pipeline = Arc::new(Pipeline::with_http_sources(cfg, store)?);

    let app = api::router(AppState::new(pipeline)).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("binding {}", cfg.server.bind))?;
    tracing::info!(bind = %cfg.server.bind, "listening");
    axum::serve(listener, app).await.context("http server")
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = match ScoutConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = ?e, "config load failed");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Run {
            search_id,
            keywords,
            fixture,
        } => run_search(&cfg, &search_id, keywords, fixture).await,
        Command::Serve => serve(&cfg).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "lesson-scout failed");
            ExitCode::FAILURE
        }
    }
}
