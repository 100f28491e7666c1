// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "LESSON_SCOUT_CONFIG";
const ENV_STATUS_DIR: &str = "SCOUT_STATUS_DIR";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Runtime configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub pipeline: PipelineConfig,
    pub crawler: CrawlerConfig,
    pub extractor: ExtractorConfig,
    pub status: StatusConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ranker cap.
    pub result_cap: usize,
    /// Content fetches dispatched together.
    pub batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            result_cap: 10,
            batch_size: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub timeout_ms: u64,
    /// Page fetches in flight per crawler.
    pub concurrency: usize,
    pub videos_per_keyword: usize,
    pub max_videos: usize,
    pub links_per_site: usize,
    pub max_reading: usize,
    /// Start page plus followed "next" pages.
    pub max_pages: usize,
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            concurrency: 4,
            videos_per_keyword: 3,
            max_videos: 10,
            links_per_site: 3,
            max_reading: 15,
            max_pages: 2,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub timeout_ms: u64,
    pub video_timeout_ms: u64,
    /// Raw extraction cap (chars).
    pub page_chars: usize,
    /// Post-processed cap (chars); longer text gets a truncation marker.
    pub max_chars: usize,
    pub user_agent: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            video_timeout_ms: 20_000,
            page_chars: 15_000,
            max_chars: 20_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub dir: PathBuf,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/searches"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

impl ScoutConfig {
    /// Load config from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg.finish())
    }

    /// Load config using env var + fallbacks:
    /// 1) $LESSON_SCOUT_CONFIG
    /// 2) config/scout.toml
    /// 3) config/scout.json
    /// 4) built-in defaults
    ///
    /// `$SCOUT_STATUS_DIR` overrides `status.dir` in every case.
    pub fn load_default() -> Result<Self> {
        let cfg = if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("LESSON_SCOUT_CONFIG points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else if Path::new("config/scout.toml").exists() {
            Self::load_from(Path::new("config/scout.toml"))?
        } else if Path::new("config/scout.json").exists() {
            Self::load_from(Path::new("config/scout.json"))?
        } else {
            Self::default()
        };
        Ok(cfg.with_env_overrides())
    }

    /// Explicit path (CLI `--config`) when given, otherwise [`Self::load_default`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Ok(Self::load_from(p)?.with_env_overrides()),
            None => Self::load_default(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(ENV_STATUS_DIR) {
            if !dir.trim().is_empty() {
                self.status.dir = PathBuf::from(dir.trim());
            }
        }
        self
    }

    /// Clamp values that must stay positive.
    fn finish(mut self) -> Self {
        self.pipeline.result_cap = self.pipeline.result_cap.max(1);
        self.pipeline.batch_size = self.pipeline.batch_size.max(1);
        self.crawler.concurrency = self.crawler.concurrency.max(1);
        self.crawler.max_pages = self.crawler.max_pages.max(1);
        self
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<ScoutConfig> {
    if hint_ext == "json" {
        return Ok(serde_json::from_str(s)?);
    }
    match toml::from_str::<ScoutConfig>(s) {
        Ok(v) => Ok(v),
        Err(toml_err) => {
            serde_json::from_str(s).map_err(|_| anyhow!("unsupported config format: {toml_err}"))
        }
    }
}
